use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

use crate::Error;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(time_str: &str) -> Option<NaiveDateTime> {
    let time = NaiveDateTime::parse_from_str(time_str.trim(), TIME_FORMAT);
    tracing::debug!(target: "time-converter", "{time_str:?} -> {time:?}");
    time.ok()
}

/// `base` moved forward by `days`, clock set to `hour:00:00`.
pub fn days_later_at(base: NaiveDateTime, days: i64, hour: u32) -> NaiveDateTime {
    let day = base.date() + TimeDelta::days(days);
    day.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default())
}

/// Interprets a local wall-clock time in `offset`.
///
/// Ambiguous times (DST fold) resolve to the earlier instant.
pub fn local_in(time: NaiveDateTime, offset: FixedOffset) -> crate::Result<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|t| t.with_timezone(&offset))
        .ok_or(Error::Time(time))
}
