use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Colour family of a badge; the hex values are the ones the list screens paint with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Urgent,
    Warning,
    Info,
    Muted,
    Positive,
}

impl BadgeTone {
    pub fn color(self) -> &'static str {
        match self {
            BadgeTone::Urgent => "#FF3B30",
            BadgeTone::Warning => "#FF9500",
            BadgeTone::Info => "#007AFF",
            BadgeTone::Muted => "#999",
            BadgeTone::Positive => "#34C759",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateBadge {
    pub text: String,
    pub tone: BadgeTone,
}

impl DateBadge {
    fn new(text: impl Into<String>, tone: BadgeTone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn color(&self) -> &'static str {
        self.tone.color()
    }
}

/// Accepts a bare `YYYY-MM-DD` date or a full RFC 3339 timestamp.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|stamp| stamp.date_naive())
}

/// Whole days from `now` to local midnight of `date`, rounded up. Zero means today,
/// negative values lie in the past.
pub fn days_until<Tz: TimeZone>(date: NaiveDate, now: &DateTime<Tz>) -> i64 {
    let target = resolve_local(&now.timezone(), date.and_time(NaiveTime::MIN));
    let millis = target.signed_duration_since(now.clone()).num_milliseconds();
    ceil_days(millis)
}

pub fn days_until_str<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Option<i64> {
    parse_calendar_date(input).map(|date| days_until(date, now))
}

pub fn date_badge<Tz: TimeZone>(date: NaiveDate, now: &DateTime<Tz>) -> Option<DateBadge> {
    badge_for_offset(days_until(date, now))
}

pub fn date_badge_str<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Option<DateBadge> {
    parse_calendar_date(input).and_then(|date| date_badge(date, now))
}

fn badge_for_offset(days: i64) -> Option<DateBadge> {
    match days {
        0 => Some(DateBadge::new("Today", BadgeTone::Urgent)),
        1 => Some(DateBadge::new("Tomorrow", BadgeTone::Warning)),
        2..=7 => Some(DateBadge::new(format!("In {days} days"), BadgeTone::Info)),
        -7..=-1 => Some(DateBadge::new(format!("{} days ago", -days), BadgeTone::Muted)),
        d if d < -7 => Some(DateBadge::new("Past", BadgeTone::Muted)),
        _ => None,
    }
}

/// Short en-US rendering used in list rows, e.g. `Mon, Oct 20`.
pub fn format_date_for_display(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

pub(crate) fn ceil_days(millis: i64) -> i64 {
    let whole = millis.div_euclid(DAY_MILLIS);
    if millis.rem_euclid(DAY_MILLIS) == 0 {
        whole
    } else {
        whole + 1
    }
}

/// Pin a wall-clock time to `tz`. Ambiguous times take the earlier instant, times skipped by
/// a DST jump move to the first valid instant after the gap.
pub(crate) fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(stamp) => stamp,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => naive
            .checked_add_signed(Duration::hours(1))
            .and_then(|later| tz.from_local_datetime(&later).earliest())
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}
