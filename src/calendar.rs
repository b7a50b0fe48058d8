//! Calendar reminders for the renewal deadline.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, util::local_in};

const API: &str = "dingtalk calendar";
const TOKEN_URL: &str = "https://oapi.dingtalk.com/gettoken";
const CALENDAR_ID: &str = "primary";
const TIME_ZONE: &str = "Asia/Shanghai";
const UTC8: i32 = 8 * 3600;
const REMIND_MINUTES: u32 = 15;

/// Event times are local wall-clock times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

pub trait Calendar {
    /// Returns the id of the created event.
    async fn create(&self, event: &Event) -> Result<String>;

    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct DingTalkCalendar {
    client: Client,
    app_key: String,
    app_secret: String,
    user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: When,
    end: When,
    is_all_day: bool,
    attendees: [Attendee<'a>; 1],
    reminders: [Reminder; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct When {
    date_time: String,
    time_zone: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Attendee<'a> {
    id: &'a str,
    is_optional: bool,
}

#[derive(Serialize)]
struct Reminder {
    method: &'static str,
    minutes: u32,
}

#[derive(Deserialize)]
struct TokenReply {
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: String,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: Option<String>,
}

impl When {
    fn new(time: DateTime<FixedOffset>) -> Self {
        Self {
            date_time: time.to_rfc3339_opts(SecondsFormat::Secs, false),
            time_zone: TIME_ZONE,
        }
    }
}

fn event_body<'a>(
    event: &'a Event,
    user_id: &'a str,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> EventBody<'a> {
    EventBody {
        summary: &event.summary,
        description: &event.description,
        start: When::new(start),
        end: When::new(end),
        is_all_day: false,
        attendees: [Attendee {
            id: user_id,
            is_optional: false,
        }],
        reminders: [Reminder {
            method: "dingtalk",
            minutes: REMIND_MINUTES,
        }],
    }
}

fn access_token(body: &str) -> Result<String> {
    let reply = serde_json::from_str::<TokenReply>(body)
        .map_err(|e| Error::malformed(API, format!("{e}: {body}")))?;
    match (reply.errcode, reply.access_token) {
        (Some(0), Some(token)) => Ok(token),
        (Some(0), None) => Err(Error::malformed(API, "no access_token field")),
        (Some(code), _) => Err(Error::Rejected {
            api: API,
            code,
            message: reply.errmsg,
        }),
        (None, _) => Err(Error::malformed(API, "no errcode field")),
    }
}

impl DingTalkCalendar {
    pub fn new(
        client: Client,
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            user_id: user_id.into(),
        }
    }

    async fn token(&self) -> Result<String> {
        let body = self
            .client
            .get(TOKEN_URL)
            .query(&[("appkey", &*self.app_key), ("appsecret", &*self.app_secret)])
            .send()
            .await?
            .text()
            .await?;
        access_token(&body)
    }

    fn events_url(&self) -> String {
        format!(
            "https://api.dingtalk.com/v1.0/calendar/users/{}/calendars/{CALENDAR_ID}/events",
            self.user_id
        )
    }
}

impl Calendar for DingTalkCalendar {
    async fn create(&self, event: &Event) -> Result<String> {
        let utc8 = FixedOffset::east_opt(UTC8).ok_or(Error::Time(event.start))?;
        let start = local_in(event.start, utc8)?;
        let end = local_in(event.end, utc8)?;
        let token = self.token().await?;

        let resp = self
            .client
            .post(self.events_url())
            .header("x-acs-dingtalk-access-token", token)
            .json(&event_body(event, &self.user_id, start, end))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(Error::Rejected {
                api: API,
                code: i64::from(status.as_u16()),
                message: body,
            });
        }

        let Created { id } = serde_json::from_str(&body)
            .map_err(|e| Error::malformed(API, format!("{e}: {body}")))?;
        let id = id.ok_or_else(|| Error::malformed(API, "no id field"))?;
        tracing::info!(target: "calendar", "event {id} created at {}", event.start);
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let token = self.token().await?;
        let resp = self
            .client
            .delete(format!("{}/{id}", self.events_url()))
            .query(&[("pushNotification", "true")])
            .header("x-acs-dingtalk-access-token", token)
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::Rejected {
                api: API,
                code: i64::from(status.as_u16()),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        tracing::info!(target: "calendar", "✅ event {id} deleted");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    #[test]
    fn body_shape() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let event = Event {
            summary: "续期".to_owned(),
            description: "d".to_owned(),
            start,
            end: start + chrono::TimeDelta::hours(1),
        };
        let utc8 = FixedOffset::east_opt(UTC8).unwrap();
        let body = event_body(
            &event,
            "user1",
            utc8.from_local_datetime(&event.start).unwrap(),
            utc8.from_local_datetime(&event.end).unwrap(),
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "summary": "续期",
                "description": "d",
                "start": {"dateTime": "2025-05-20T12:00:00+08:00", "timeZone": "Asia/Shanghai"},
                "end": {"dateTime": "2025-05-20T13:00:00+08:00", "timeZone": "Asia/Shanghai"},
                "isAllDay": false,
                "attendees": [{"id": "user1", "isOptional": false}],
                "reminders": [{"method": "dingtalk", "minutes": 15}],
            })
        );
    }

    #[test]
    fn token_replies() {
        assert_eq!(
            access_token(r#"{"errcode":0,"access_token":"tok","expires_in":7200}"#).unwrap(),
            "tok"
        );
        assert!(matches!(
            access_token(r#"{"errcode":40089,"errmsg":"invalid appkey"}"#),
            Err(Error::Rejected { code: 40089, .. })
        ));
        assert!(matches!(access_token(r#"{"errcode":0}"#), Err(Error::Malformed { .. })));
    }
}
