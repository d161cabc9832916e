use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Rejections raised before anything reaches the repository.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Pick an icon for an icon reminder")]
    MissingIcon,
    #[error("Reminder hour must be between 0 and 23, got {0}")]
    HourOutOfRange(u32),
    #[error("Repeat interval must be at most {max} days, got {days}")]
    IntervalTooLong { days: i64, max: i64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode collection `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("reminder `{0}` not found")]
    ReminderNotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("reminder is not due until {next_reminder}")]
    NotDue { next_reminder: DateTime<Utc> },
    #[error("reminder has been discarded")]
    Discarded,
}
