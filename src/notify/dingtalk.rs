use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::Notifier;
use crate::{Error, Result};

const API: &str = "dingtalk robot";

/// Group robot webhook, optionally with "加签" signing.
pub struct DingTalkBot {
    client: Client,
    webhook: String,
    secret: Option<String>,
}

#[derive(Serialize)]
struct Message<'a> {
    msgtype: &'static str,
    markdown: Markdown<'a>,
}

#[derive(Serialize)]
struct Markdown<'a> {
    title: &'a str,
    text: String,
}

#[derive(Deserialize)]
struct Reply {
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: String,
}

/// `base64(HMAC-SHA256(secret, "{timestamp}\n{secret}"))`, before URL encoding.
pub fn sign(secret: &str, timestamp: i64) -> String {
    #[allow(clippy::unwrap_used)] // HMAC accepts keys of any length.
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}\n{secret}").as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

fn check(body: &str) -> Result<()> {
    let reply = serde_json::from_str::<Reply>(body)
        .map_err(|e| Error::malformed(API, format!("{e}: {body}")))?;
    match reply.errcode {
        Some(0) => Ok(()),
        Some(code) => Err(Error::Rejected {
            api: API,
            code,
            message: reply.errmsg,
        }),
        None => Err(Error::malformed(API, "no errcode field")),
    }
}

impl DingTalkBot {
    pub fn new(client: Client, webhook: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            client,
            webhook: webhook.into(),
            secret: secret.filter(|s| !s.is_empty()),
        }
    }
}

impl Notifier for DingTalkBot {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        let message = Message {
            msgtype: "markdown",
            markdown: Markdown {
                title,
                text: format!("#### {title}\n{body}"),
            },
        };

        let mut request = self.client.post(&self.webhook).json(&message);
        if let Some(secret) = &self.secret {
            let timestamp = chrono::Utc::now().timestamp_millis();
            request = request.query(&[
                ("timestamp", timestamp.to_string()),
                ("sign", sign(secret, timestamp)),
            ]);
        }

        let body = request.send().await?.text().await?;
        tracing::debug!(target: "notify", "dingtalk reply: {body}");
        check(&body)
    }
}
