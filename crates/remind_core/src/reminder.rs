use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub const DEFAULT_REMINDER_HOUR: u32 = 8;
pub const DEFAULT_ICON: &str = "heart-outline";

/// Glyph names offered when creating an icon reminder.
pub const ICON_OPTIONS: [&str; 12] = [
    "heart-outline",
    "flower-outline",
    "gift-outline",
    "restaurant-outline",
    "call-outline",
    "car-outline",
    "home-outline",
    "fitness-outline",
    "book-outline",
    "musical-notes-outline",
    "calendar-outline",
    "time-outline",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<i64>,
    #[serde(default)]
    pub display_type: DisplayType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "default_reminder_hour")]
    pub reminder_hour: u32,
    pub next_reminder: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminded: Option<DateTime<Utc>>,
    pub status: ReminderStatus,
    #[serde(default)]
    pub completed_count: u32,
    #[serde(default)]
    pub snooze_count: u32,
    #[serde(default)]
    pub discarded_count: u32,
    pub created_at: DateTime<Utc>,
}

fn default_reminder_hour() -> u32 {
    DEFAULT_REMINDER_HOUR
}

impl Reminder {
    /// Interval in days used by a `custom` rule; anything missing or non-positive counts as one.
    pub fn effective_custom_days(&self) -> u32 {
        effective_custom_days(self.custom_days)
    }

    pub fn frequency_label(&self) -> String {
        match self.frequency {
            Frequency::Daily => "Daily".to_string(),
            Frequency::Weekly => "Weekly".to_string(),
            Frequency::Custom => format!("Every {} days", self.effective_custom_days()),
        }
    }

    /// Text shown for the reminder: its title, or the icon name for title-less icon reminders.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.icon.as_deref())
            .unwrap_or_default()
    }
}

/// Longest custom repeat interval a draft may ask for.
pub const MAX_CUSTOM_DAYS: i64 = 3650;

/// Stored intervals beyond [`MAX_CUSTOM_DAYS`] are clamped rather than rejected.
pub(crate) fn effective_custom_days(custom_days: Option<i64>) -> u32 {
    match custom_days {
        Some(days) if days > 0 => u32::try_from(days.min(MAX_CUSTOM_DAYS)).unwrap_or(1),
        _ => 1,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Custom,
}

impl FromStr for Frequency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "custom" => Ok(Frequency::Custom),
            other => Err(ParseError::new("frequency", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Icon,
    #[default]
    Text,
}

impl FromStr for DisplayType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "icon" => Ok(DisplayType::Icon),
            "text" => Ok(DisplayType::Text),
            other => Err(ParseError::new("display type", other)),
        }
    }
}

/// Persisted reminder state. Completion is an event, never a resting state, so older
/// records carrying `"completed"` are read back as `Active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[serde(alias = "completed")]
    Active,
    Snoozed,
    Discarded,
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReminderStatus::Active => "active",
            ReminderStatus::Snoozed => "snoozed",
            ReminderStatus::Discarded => "discarded",
        })
    }
}

/// What the user picked on a due reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderAction {
    Tomorrow,
    Discard,
    Done,
}

impl FromStr for ReminderAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tomorrow" | "snooze" => Ok(ReminderAction::Tomorrow),
            "discard" => Ok(ReminderAction::Discard),
            "done" | "complete" => Ok(ReminderAction::Done),
            other => Err(ParseError::new("reminder action", other)),
        }
    }
}

/// Outcome of a transition. `Completed` only lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderEvent {
    Snoozed,
    Discarded,
    Completed,
}

impl fmt::Display for ReminderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReminderEvent::Snoozed => "snoozed until tomorrow",
            ReminderEvent::Discarded => "discarded",
            ReminderEvent::Completed => "completed",
        })
    }
}
