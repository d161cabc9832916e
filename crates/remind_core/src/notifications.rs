use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::dates::days_until;
use crate::item::Item;

pub const NOTIFICATION_TITLE: &str = "Don't forget me";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Today,
    Tomorrow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
}

/// Receives ready-made notifications. Dispatch is best effort, so an `Err` here is only logged.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: NotificationRequest) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub today: usize,
    pub tomorrow: usize,
    pub delivered: usize,
}

/// Counts dated events falling today and tomorrow.
pub fn upcoming_counts<Tz: TimeZone>(events: &[Item], now: &DateTime<Tz>) -> (usize, usize) {
    events
        .iter()
        .filter_map(|event| event.date)
        .fold((0, 0), |(today, tomorrow), date| match days_until(date, now) {
            0 => (today + 1, tomorrow),
            1 => (today, tomorrow + 1),
            _ => (today, tomorrow),
        })
}

/// Best effort: sink failures are logged and never reach the caller.
pub fn dispatch_event_notifications<Tz: TimeZone>(
    events: &[Item],
    sink: &dyn NotificationSink,
    now: &DateTime<Tz>,
) -> DispatchSummary {
    let (today, tomorrow) = upcoming_counts(events, now);
    let mut summary = DispatchSummary {
        today,
        tomorrow,
        delivered: 0,
    };

    let requests = [
        (today, NotificationKind::Today, "today"),
        (tomorrow, NotificationKind::Tomorrow, "tomorrow"),
    ];
    for (count, kind, when) in requests {
        if count == 0 {
            continue;
        }
        let request = NotificationRequest {
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("You have {count} event(s) {when}!"),
            kind,
        };
        match sink.deliver(request) {
            Ok(()) => summary.delivered += 1,
            Err(err) => tracing::warn!(?kind, error = %err, "notification delivery failed"),
        }
    }

    tracing::info!(
        today,
        tomorrow,
        delivered = summary.delivered,
        "event notifications dispatched"
    );
    summary
}
