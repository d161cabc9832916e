use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::BadgeTone;
use crate::error::ParseError;

/// Storage key holding the reminder collection.
pub const REMINDERS_KEY: &str = "reminders";

/// Entry of one of the three plain lists (events, wishlist, likes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn tone(self) -> BadgeTone {
        match self {
            Priority::High => BadgeTone::Urgent,
            Priority::Medium => BadgeTone::Warning,
            Priority::Low => BadgeTone::Positive,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParseError::new("priority", other)),
        }
    }
}

/// The item collections, each persisted as one JSON array under its own key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKey {
    Events,
    Wishlist,
    Likes,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 3] = [
        CollectionKey::Events,
        CollectionKey::Wishlist,
        CollectionKey::Likes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKey::Events => "events",
            CollectionKey::Wishlist => "wishlist",
            CollectionKey::Likes => "likes",
        }
    }

    pub fn uses_date(self) -> bool {
        matches!(self, CollectionKey::Events)
    }

    pub fn uses_priority(self) -> bool {
        matches!(self, CollectionKey::Wishlist)
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            CollectionKey::Events => "No events yet",
            CollectionKey::Wishlist => "Your wishlist is empty",
            CollectionKey::Likes => "Nothing liked yet",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        CollectionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| ParseError::new("collection", &normalized))
    }
}
