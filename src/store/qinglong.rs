use compact_str::CompactString;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::StateStore;
use crate::{Error, Result, monitor, renew};

const API: &str = "qinglong";
const OK: i64 = 200;

/// Environment variables of a Qinglong panel used as a key-value store.
///
/// The key is the variable name. The OpenAPI token is fetched on first use
/// and kept for the rest of the process.
pub struct QinglongStore {
    client: Client,
    base: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CompactString>>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Token {
    token: CompactString,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
struct Env {
    #[serde(alias = "_id")]
    id: i64,
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    remarks: Option<String>,
}

#[derive(Serialize)]
struct NewEnv<'a> {
    name: &'a str,
    value: &'a str,
    remarks: &'a str,
}

/// Decodes an OpenAPI reply, requiring `code == 200` and a `data` field.
fn open<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope = serde_json::from_str::<Envelope<T>>(body)
        .map_err(|e| Error::malformed(API, format!("{e}: {body}")))?;
    match envelope.code {
        Some(OK) => envelope
            .data
            .ok_or_else(|| Error::malformed(API, "no data field")),
        Some(code) => Err(Error::Rejected {
            api: API,
            code,
            message: envelope.message.unwrap_or_default(),
        }),
        None => Err(Error::malformed(API, "no code field")),
    }
}

/// `searchValue` is a fuzzy match; only an exact name counts.
fn find_env(envs: Vec<Env>, name: &str) -> Option<Env> {
    envs.into_iter().find(|env| env.name == name)
}

pub fn remarks_for(key: &str) -> &'static str {
    match key {
        monitor::STATS_KEY => "Hax 已开通数据缓存",
        monitor::AVAILABLE_KEY => "数据中心信息缓存",
        renew::RENEW_KEY => "HAX上次续期时间",
        renew::EVENT_KEY => "HAX续期提醒日程",
        _ => "hax-monitor",
    }
}

impl QinglongStore {
    pub fn new(
        client: Client,
        base: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            client,
            base,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        }
    }

    async fn token(&self) -> Result<CompactString> {
        if let Some(token) = self.token.lock().clone() {
            return Ok(token);
        }

        let url = format!("{}/open/auth/token", self.base);
        let body = self
            .client
            .get(url)
            .query(&[("client_id", &*self.client_id), ("client_secret", &*self.client_secret)])
            .send()
            .await?
            .text()
            .await?;
        let Token { token } = open(&body)?;
        tracing::debug!(target: "store", "qinglong token acquired");

        *self.token.lock() = Some(token.clone());
        Ok(token)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.token().await?;
        let body = request.bearer_auth(token).send().await?.text().await?;
        open(&body)
    }

    async fn lookup(&self, name: &str) -> Result<Option<Env>> {
        let request = self
            .client
            .get(format!("{}/open/envs", self.base))
            .query(&[("searchValue", name)]);
        let envs: Vec<Env> = self.call(request).await?;
        Ok(find_env(envs, name))
    }
}

impl StateStore for QinglongStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lookup(key).await?.map(|env| env.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let url = format!("{}/open/envs", self.base);
        if let Some(mut env) = self.lookup(key).await? {
            env.value = value.to_owned();
            if env.remarks.is_none() {
                env.remarks = Some(remarks_for(key).to_owned());
            }
            let _: serde_json::Value = self.call(self.client.put(url).json(&env)).await?;
            tracing::info!(target: "store", "✅ {key} updated");
        } else {
            let new = [NewEnv {
                name: key,
                value,
                remarks: remarks_for(key),
            }];
            let _: serde_json::Value = self.call(self.client.post(url).json(&new)).await?;
            tracing::info!(target: "store", "✅ {key} created");
        }
        Ok(())
    }
}
