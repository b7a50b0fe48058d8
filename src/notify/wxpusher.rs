use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Notifier;
use crate::{Error, Result};

const API: &str = "wxpusher";
const SEND_URL: &str = "http://wxpusher.zjiecode.com/api/send/message";
const OK: i64 = 1000;
/// 1 text, 2 HTML, 3 Markdown.
const CONTENT_TYPE: u8 = 1;
const SUMMARY_CHARS: usize = 11;
const NO_SUMMARY: &str = "无摘要信息";

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]").unwrap());

pub struct WxPusher {
    client: Client,
    app_token: String,
    uids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    app_token: &'a str,
    content: &'a str,
    summary: &'a str,
    content_type: u8,
    uids: &'a [String],
}

#[derive(Deserialize)]
struct Reply {
    code: Option<i64>,
    #[serde(default)]
    msg: String,
}

/// Text of the first `[...]` tag, else the first 11 characters.
pub fn summary(msg: &str) -> &str {
    if msg.trim().is_empty() {
        return NO_SUMMARY;
    }
    if let Some(tag) = TAG.captures(msg).and_then(|c| c.get(1)) {
        let tag = tag.as_str().trim();
        if !tag.is_empty() {
            return tag;
        }
    }
    match msg.char_indices().nth(SUMMARY_CHARS) {
        Some((end, _)) => &msg[..end],
        None => msg,
    }
}

fn check(body: &str) -> Result<()> {
    let reply = serde_json::from_str::<Reply>(body)
        .map_err(|e| Error::malformed(API, format!("{e}: {body}")))?;
    match reply.code {
        Some(OK) => Ok(()),
        Some(code) => Err(Error::Rejected {
            api: API,
            code,
            message: reply.msg,
        }),
        None => Err(Error::malformed(API, "no code field")),
    }
}

impl WxPusher {
    pub fn new(client: Client, app_token: impl Into<String>, uids: Vec<String>) -> Self {
        Self {
            client,
            app_token: app_token.into(),
            uids,
        }
    }
}

impl Notifier for WxPusher {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        let content = format!("{title}\n{body}");
        let payload = Payload {
            app_token: &self.app_token,
            content: &content,
            summary: summary(&content),
            content_type: CONTENT_TYPE,
            uids: &self.uids,
        };

        let body = self
            .client
            .post(SEND_URL)
            .json(&payload)
            .send()
            .await?
            .text()
            .await?;
        tracing::debug!(target: "notify", "wxpusher reply: {body}");
        check(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prefers_tag() {
        assert_eq!(summary("[🛰Hax Stats / Hax 已开通数据]\n>>US-East(1♝)"), "🛰Hax Stats / Hax 已开通数据");
    }

    #[test]
    fn summary_falls_back_to_prefix() {
        assert_eq!(summary("⏰ 续期时间已更新\n📅 本次更新续期时间"), "⏰ 续期时间已更新\n📅");
        assert_eq!(summary("short"), "short");
        assert_eq!(summary("[  ] abcdefghijklmnop"), "[  ] abcdef");
    }

    #[test]
    fn summary_of_blank_message() {
        assert_eq!(summary("  \n"), NO_SUMMARY);
    }

    #[test]
    fn payload_field_names() {
        let uids = vec!["UID_1".to_owned()];
        let payload = Payload {
            app_token: "AT_x",
            content: "c",
            summary: "s",
            content_type: CONTENT_TYPE,
            uids: &uids,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"appToken": "AT_x", "content": "c", "summary": "s", "contentType": 1, "uids": ["UID_1"]})
        );
    }

    #[test]
    fn replies() {
        check(r#"{"code":1000,"msg":"处理成功","success":true}"#).unwrap();
        assert!(matches!(
            check(r#"{"code":1001,"msg":"appToken不正确"}"#),
            Err(Error::Rejected { code: 1001, .. })
        ));
        assert!(matches!(check("nginx error"), Err(Error::Malformed { .. })));
    }
}
