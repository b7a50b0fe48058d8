//! Message delivery.

mod dingtalk;
mod wxpusher;

pub use dingtalk::DingTalkBot;
pub use wxpusher::WxPusher;

use crate::Result;

pub trait Notifier {
    /// `body` is already fully formatted.
    async fn notify(&self, title: &str, body: &str) -> Result<()>;
}

pub enum Channel {
    DingTalk(DingTalkBot),
    WxPusher(WxPusher),
}

impl Channel {
    const fn name(&self) -> &'static str {
        match self {
            Self::DingTalk(_) => "dingtalk",
            Self::WxPusher(_) => "wxpusher",
        }
    }
}

impl Notifier for Channel {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        match self {
            Self::DingTalk(bot) => bot.notify(title, body).await,
            Self::WxPusher(pusher) => pusher.notify(title, body).await,
        }
    }
}

/// Every configured channel.
///
/// Delivery succeeds when any channel accepts the message, or when no channel
/// is configured at all. The first error is returned only if all fail.
#[derive(Default)]
pub struct Notifiers {
    channels: Vec<Channel>,
}

impl Notifiers {
    pub const fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Notifier for Notifiers {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        if self.channels.is_empty() {
            tracing::warn!(target: "notify", "no channel configured, dropping {title:?}");
            return Ok(());
        }

        let mut first_err = None;
        let mut delivered = false;
        for channel in &self.channels {
            match channel.notify(title, body).await {
                Ok(()) => {
                    tracing::info!(target: "notify", "{} delivered {title:?}", channel.name());
                    delivered = true;
                }
                Err(e) => {
                    tracing::error!(target: "notify", "{} failed: {e}", channel.name());
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) if !delivered => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use parking_lot::Mutex;

    use super::Notifier;
    use crate::{Error, Result};

    /// Records every message; optionally refuses them.
    #[derive(Default)]
    pub struct Recorder {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl Recorder {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn titles(&self) -> Vec<String> {
            self.sent.lock().iter().map(|(t, _)| t.clone()).collect()
        }
    }

    impl Notifier for Recorder {
        async fn notify(&self, title: &str, body: &str) -> Result<()> {
            self.sent.lock().push((title.to_owned(), body.to_owned()));
            if self.fail {
                Err(Error::Rejected {
                    api: "recorder",
                    code: -1,
                    message: "refused".to_owned(),
                })
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_channel_is_not_an_error() {
        let notifiers = Notifiers::default();
        assert!(notifiers.is_empty());
        notifiers.notify("title", "body").await.unwrap();
    }
}
