//! Manual renewal reminder.
//!
//! Each run records "renewed now" and announces the next deadline. Only the
//! last renewal time is stored; deadlines are always recomputed from it.

use chrono::{NaiveDateTime, TimeDelta};

use crate::{
    calendar::{Calendar, Event},
    notify::Notifier,
    store::StateStore,
    util::{days_later_at, format_time, parse_time},
};

pub const RENEW_KEY: &str = "HAX_RENEW_TIME";
pub const EVENT_KEY: &str = "HAX_RENEW_EVENT_ID";

const RENEW_DAYS: i64 = 5;
const DUE_HOUR: u32 = 1;
const REMIND_DAYS: i64 = 4;
const REMIND_HOUR: u32 = 12;

/// Renewal deadline for a renewal at `renewed`: five days later, 01:00:00.
pub fn due_after(renewed: NaiveDateTime) -> NaiveDateTime {
    days_later_at(renewed, RENEW_DAYS, DUE_HOUR)
}

/// Calendar reminder for a renewal at `renewed`: four days later, 12:00:00.
pub fn reminder_after(renewed: NaiveDateTime) -> NaiveDateTime {
    days_later_at(renewed, REMIND_DAYS, REMIND_HOUR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    /// Whether a timestamp was stored before this run.
    pub existed: bool,
    /// The stored timestamp, if it parsed.
    pub previous: Option<NaiveDateTime>,
    pub recorded: NaiveDateTime,
}

impl Renewal {
    /// Deadline implied by the previous renewal (or by now on a first run).
    pub fn previous_due(&self) -> NaiveDateTime {
        due_after(self.previous.unwrap_or(self.recorded))
    }

    pub fn next_due(&self) -> NaiveDateTime {
        due_after(self.recorded)
    }

    pub const fn title(&self) -> &'static str {
        if self.existed {
            "⏰ 续期时间已更新"
        } else {
            "🆕 续期时间已创建"
        }
    }

    pub fn body(&self) -> String {
        format!(
            "📅 本次更新续期时间: {}\n📆 下次建议续期时间: {}",
            format_time(self.recorded),
            format_time(self.next_due())
        )
    }

    pub fn reminder(&self) -> Event {
        let start = reminder_after(self.recorded);
        Event {
            summary: "⏰ HAX 续期提醒".to_owned(),
            description: format!("请在 {} 前完成续期", format_time(self.next_due())),
            start,
            end: start + TimeDelta::hours(1),
        }
    }
}

/// Stores `now` as the last renewal and announces the next deadline.
///
/// Returns `None` when the timestamp could not be written; nothing is sent
/// in that case.
pub async fn record<S, N>(store: &S, notifier: &N, now: NaiveDateTime) -> Option<Renewal>
where
    S: StateStore,
    N: Notifier,
{
    let stored = match store.get(RENEW_KEY).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!(target: "renew", "reading {RENEW_KEY} failed, treating as first run: {e}");
            None
        }
    };

    let previous = stored.as_deref().and_then(|s| {
        let time = parse_time(s);
        if time.is_none() {
            tracing::warn!(target: "renew", "⚠️ stored time {s:?} is invalid, starting over from now");
        }
        time
    });
    let renewal = Renewal {
        existed: stored.is_some(),
        previous,
        recorded: now,
    };

    if let Some(previous) = renewal.previous {
        tracing::info!(target: "renew", "🕒 last renewed at {}", format_time(previous));
    }
    tracing::info!(target: "renew", "⏳ previous deadline: {}", format_time(renewal.previous_due()));

    if let Err(e) = store.set(RENEW_KEY, &format_time(now)).await {
        tracing::error!(target: "renew", "\x1b[31m❌ writing {RENEW_KEY} failed: {e}\x1b[0m");
        return None;
    }
    tracing::info!(target: "renew", "✅ renewal time set to {}, next deadline {}", format_time(now), format_time(renewal.next_due()));

    if let Err(e) = notifier.notify(renewal.title(), &renewal.body()).await {
        tracing::error!(target: "renew", "notification failed: {e}");
    }
    Some(renewal)
}

/// Replaces the stored calendar reminder with one for `renewal`.
///
/// A failed deletion of the old event aborts the replacement, so no duplicate
/// reminder is ever created.
pub async fn reschedule<S, C>(store: &S, calendar: &C, renewal: &Renewal) -> Option<String>
where
    S: StateStore,
    C: Calendar,
{
    let old = match store.get(EVENT_KEY).await {
        Ok(old) => old.filter(|id| !id.trim().is_empty()),
        Err(e) => {
            tracing::warn!(target: "calendar", "reading {EVENT_KEY} failed: {e}");
            None
        }
    };

    if let Some(old) = old {
        if let Err(e) = calendar.delete(&old).await {
            tracing::error!(target: "calendar", "❌ deleting event {old} failed, reminder not replaced: {e}");
            return None;
        }
    }

    let id = match calendar.create(&renewal.reminder()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(target: "calendar", "❌ creating reminder failed: {e}");
            return None;
        }
    };

    if let Err(e) = store.set(EVENT_KEY, &id).await {
        tracing::error!(target: "calendar", "writing {EVENT_KEY} failed: {e}");
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{calendar::testing::FakeCalendar, notify::testing::Recorder, store::testing::MemoryStore};

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn deadlines() {
        assert_eq!(due_after(at(16, 14, 47)), at(21, 1, 0));
        assert_eq!(reminder_after(at(16, 14, 47)), at(20, 12, 0));
    }

    #[tokio::test]
    async fn first_run_creates() {
        let store = MemoryStore::new();
        let notifier = Recorder::default();
        let renewal = record(&store, &notifier, at(16, 14, 47)).await.unwrap();

        assert!(!renewal.existed);
        assert_eq!(renewal.previous_due(), at(21, 1, 0));
        assert_eq!(store.peek(RENEW_KEY).as_deref(), Some("2025-05-16 14:47:00"));
        assert_eq!(
            *notifier.sent.lock(),
            [(
                "🆕 续期时间已创建".to_owned(),
                "📅 本次更新续期时间: 2025-05-16 14:47:00\n📆 下次建议续期时间: 2025-05-21 01:00:00".to_owned()
            )]
        );
    }

    #[tokio::test]
    async fn later_run_updates() {
        let store = MemoryStore::with([(RENEW_KEY, "2025-05-12 09:00:00")]);
        let notifier = Recorder::default();
        let renewal = record(&store, &notifier, at(16, 8, 30)).await.unwrap();

        assert!(renewal.existed);
        assert_eq!(renewal.previous, Some(at(12, 9, 0)));
        assert_eq!(renewal.previous_due(), at(17, 1, 0));
        assert_eq!(renewal.next_due(), at(21, 1, 0));
        assert_eq!(store.peek(RENEW_KEY).as_deref(), Some("2025-05-16 08:30:00"));
        assert_eq!(notifier.titles(), ["⏰ 续期时间已更新"]);
    }

    #[tokio::test]
    async fn garbage_timestamp_restarts_from_now() {
        let store = MemoryStore::with([(RENEW_KEY, "last tuesday")]);
        let notifier = Recorder::default();
        let renewal = record(&store, &notifier, at(16, 8, 30)).await.unwrap();

        assert!(renewal.existed);
        assert_eq!(renewal.previous, None);
        assert_eq!(renewal.previous_due(), renewal.next_due());
        assert_eq!(notifier.titles(), ["⏰ 续期时间已更新"]);
    }

    #[tokio::test]
    async fn notify_failure_keeps_record() {
        let store = MemoryStore::new();
        let notifier = Recorder::failing();
        assert!(record(&store, &notifier, at(16, 8, 30)).await.is_some());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn reminder_replaces_old_event() {
        let store = MemoryStore::with([(EVENT_KEY, "event-old")]);
        let calendar = FakeCalendar::default();
        let renewal = Renewal {
            existed: true,
            previous: None,
            recorded: at(16, 8, 30),
        };

        let id = reschedule(&store, &calendar, &renewal).await.unwrap();
        assert_eq!(*calendar.deleted.lock(), ["event-old"]);
        assert_eq!(store.peek(EVENT_KEY), Some(id));

        let created = calendar.created.lock();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].start, at(20, 12, 0));
        assert_eq!(created[0].end, at(20, 13, 0));
        assert!(created[0].description.contains("2025-05-21 01:00:00"));
    }

    #[tokio::test]
    async fn first_reminder_deletes_nothing() {
        let store = MemoryStore::new();
        let calendar = FakeCalendar::default();
        let renewal = Renewal {
            existed: false,
            previous: None,
            recorded: at(16, 8, 30),
        };

        assert!(reschedule(&store, &calendar, &renewal).await.is_some());
        assert!(calendar.deleted.lock().is_empty());
        assert_eq!(calendar.created.lock().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_aborts_replacement() {
        let store = MemoryStore::with([(EVENT_KEY, "event-old")]);
        let calendar = FakeCalendar {
            fail_delete: true,
            ..FakeCalendar::default()
        };
        let renewal = Renewal {
            existed: true,
            previous: None,
            recorded: at(16, 8, 30),
        };

        assert_eq!(reschedule(&store, &calendar, &renewal).await, None);
        assert!(calendar.created.lock().is_empty());
        assert_eq!(store.peek(EVENT_KEY).as_deref(), Some("event-old"));
        assert_eq!(store.writes(), 0);
    }
}
