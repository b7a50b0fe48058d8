//! Command-line / environment configuration shared by every binary.

use core::time::Duration;
use std::path::PathBuf;

use reqwest::Client;

use crate::{
    calendar::DingTalkCalendar,
    notify::{Channel, DingTalkBot, Notifiers, WxPusher},
    store::{FileStore, QinglongStore, Store},
};

#[derive(clap::Args, Debug, Clone)]
pub struct NotifyConfig {
    /// DingTalk robot webhook URL
    #[arg(long, env = "DD_BOT_WEBHOOK")]
    pub webhook_url: Option<String>,
    /// DingTalk robot signing secret ("SEC...")
    #[arg(long, env = "DD_BOT_SECRET", hide_env_values = true)]
    pub signing_secret: Option<String>,
    /// WxPusher application token
    #[arg(long, env = "WXPUSHER_APP_TOKEN", hide_env_values = true)]
    pub app_token: Option<String>,
    /// WxPusher recipient UIDs
    #[arg(long = "uid", env = "WXPUSHER_UIDS", value_delimiter = ',')]
    pub target_user_ids: Vec<String>,
    /// Timeout of every HTTP request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", value_name = "secs", default_value_t = 10)]
    pub request_timeout: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StoreConfig {
    /// JSON cache file, used unless a Qinglong panel is configured
    #[arg(long, env = "HAX_CACHE_FILE", default_value = "last_data_cache.json")]
    pub cache_file: PathBuf,
    /// Qinglong panel base URL, e.g. http://127.0.0.1:5700
    #[arg(long, env = "QL_URL")]
    pub ql_url: Option<String>,
    #[arg(long, env = "QL_CLIENT_ID")]
    pub ql_client_id: Option<String>,
    #[arg(long, env = "QL_CLIENT_SECRET", hide_env_values = true)]
    pub ql_client_secret: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CalendarConfig {
    #[arg(long, env = "DD_APP_KEY")]
    pub app_key: Option<String>,
    #[arg(long, env = "DD_APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,
    /// DingTalk user (unionId) owning the reminder
    #[arg(long, env = "DD_USER_ID")]
    pub user_id: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl NotifyConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn notifiers(&self, client: &Client) -> Notifiers {
        let mut channels = Vec::new();
        if let Some(webhook) = present(self.webhook_url.as_ref()) {
            channels.push(Channel::DingTalk(DingTalkBot::new(
                client.clone(),
                webhook,
                self.signing_secret.clone(),
            )));
        }
        if let Some(token) = present(self.app_token.as_ref()) {
            if self.target_user_ids.is_empty() {
                tracing::warn!(target: "config", "WXPUSHER_APP_TOKEN set without WXPUSHER_UIDS, wxpusher disabled");
            } else {
                channels.push(Channel::WxPusher(WxPusher::new(
                    client.clone(),
                    token,
                    self.target_user_ids.clone(),
                )));
            }
        }
        Notifiers::new(channels)
    }
}

impl StoreConfig {
    pub fn open(&self, client: &Client) -> Store {
        match (
            present(self.ql_url.as_ref()),
            present(self.ql_client_id.as_ref()),
            present(self.ql_client_secret.as_ref()),
        ) {
            (Some(url), Some(id), Some(secret)) => {
                tracing::info!(target: "config", "using qinglong envs at {url}");
                Store::Qinglong(QinglongStore::new(client.clone(), url, id, secret))
            }
            (None, None, None) => {
                tracing::info!(target: "config", "using cache file {}", self.cache_file.display());
                Store::File(FileStore::new(&self.cache_file))
            }
            _ => {
                tracing::warn!(target: "config", "incomplete qinglong options, falling back to {}", self.cache_file.display());
                Store::File(FileStore::new(&self.cache_file))
            }
        }
    }
}

impl CalendarConfig {
    /// `None` unless all three options are given.
    pub fn calendar(&self, client: &Client) -> Option<DingTalkCalendar> {
        let key = present(self.app_key.as_ref())?;
        let secret = present(self.app_secret.as_ref())?;
        let user = present(self.user_id.as_ref())?;
        Some(DingTalkCalendar::new(client.clone(), key, secret, user))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Args {
        #[command(flatten)]
        notify: NotifyConfig,
        #[command(flatten)]
        store: StoreConfig,
        #[command(flatten)]
        calendar: CalendarConfig,
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(core::iter::once("test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn uids_split_on_commas() {
        let args = parse(&["--uid", "UID_a,UID_b", "--request-timeout", "3"]);
        assert_eq!(args.notify.target_user_ids, ["UID_a", "UID_b"]);
        assert_eq!(args.notify.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn channels_from_options() {
        let client = Client::new();
        let args = parse(&["--webhook-url", "https://oapi.dingtalk.com/robot/send?access_token=x"]);
        assert!(!args.notify.notifiers(&client).is_empty());

        let args = parse(&["--app-token", "AT_x"]);
        assert!(args.notify.notifiers(&client).is_empty());

        let args = parse(&["--app-token", "AT_x", "--uid", "UID_a"]);
        assert!(!args.notify.notifiers(&client).is_empty());
    }

    #[test]
    fn store_selection() {
        let client = Client::new();
        let args = parse(&["--cache-file", "/tmp/c.json"]);
        assert!(matches!(args.store.open(&client), Store::File(ref f) if f.path() == std::path::Path::new("/tmp/c.json")));

        let args = parse(&["--ql-url", "http://ql:5700", "--ql-client-id", "i", "--ql-client-secret", "s"]);
        assert!(matches!(args.store.open(&client), Store::Qinglong(_)));

        let args = parse(&["--ql-url", "http://ql:5700"]);
        assert!(matches!(args.store.open(&client), Store::File(_)));
    }

    #[test]
    fn calendar_needs_everything() {
        let client = Client::new();
        assert!(parse(&["--app-key", "k", "--app-secret", "s"]).calendar.calendar(&client).is_none());
        assert!(
            parse(&["--app-key", "k", "--app-secret", "s", "--user-id", "u"])
                .calendar
                .calendar(&client)
                .is_some()
        );
    }
}
