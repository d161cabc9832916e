pub mod dates;
pub mod draft;
pub mod error;
pub mod item;
pub mod notifications;
pub mod reminder;
pub mod repository;
pub mod schedule;
pub mod store;

pub use crate::draft::{ItemDraft, ReminderDraft, Valid};
pub use crate::error::{RepositoryError, StoreError, TransitionError, ValidationError};
pub use crate::item::{CollectionKey, Item, Priority};
pub use crate::reminder::{Frequency, Reminder, ReminderAction, ReminderEvent, ReminderStatus};
pub use crate::repository::{Repository, RepositoryBuilder};
pub use crate::store::{FileStore, KeyValueStore, MemoryStore};
