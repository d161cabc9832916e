use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use remind_core::notifications::{
    dispatch_event_notifications, DispatchSummary, NotificationRequest, NotificationSink,
};
use remind_core::reminder::DEFAULT_REMINDER_HOUR;
use remind_core::schedule::Transition;
use remind_core::{
    CollectionKey, FileStore, Item, ItemDraft, KeyValueStore, Reminder, ReminderAction,
    ReminderDraft, Repository, RepositoryError, ValidationError,
};
use tracing::{debug, error, info, warn};

use crate::state::{reduce_board, reduce_list, BoardMsg, ItemList, ListMsg, ReminderBoard};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) default_reminder_hour: u32,
    pub(crate) notify_events: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("REMIND_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(hour) = std::env::var("REMIND_DEFAULT_HOUR") {
            match hour.trim().parse::<u32>() {
                Ok(value) if value <= 23 => config.default_reminder_hour = value,
                _ => warn!(value = %hour, "ignoring invalid REMIND_DEFAULT_HOUR"),
            }
        }
        if let Ok(flag) = std::env::var("REMIND_NOTIFY_EVENTS") {
            config.notify_events = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn default_reminder_hour(&self) -> u32 {
        self.default_reminder_hour
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_reminder_hour: DEFAULT_REMINDER_HOUR,
            notify_events: true,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("remind"))
        .unwrap_or_else(|| PathBuf::from("remind-data"))
}

/// Delivers notifications into the log; stands in for a platform notifier.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: NotificationRequest) -> Result<()> {
        info!(
            target: "notification",
            kind = ?notification.kind,
            title = %notification.title,
            "{}",
            notification.body
        );
        Ok(())
    }
}

/// Wires the repository, the notification side channel and the screen states together.
/// Write failures are logged and the affected state is reloaded from storage.
pub struct Controller<S> {
    repository: Repository<S>,
    config: AppConfig,
    notification_sink: Option<Box<dyn NotificationSink>>,
    board: ReminderBoard,
    lists: HashMap<CollectionKey, ItemList>,
}

impl Controller<FileStore> {
    pub fn open(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(config.data_dir()).with_context(|| {
            format!("failed to prepare data directory {}", config.data_dir().display())
        })?;
        let store = FileStore::new(config.data_dir());
        info!(path = %store.root().display(), "opening reminder store");
        let repository = Repository::new(store);
        Ok(Self::with_repository(repository, config))
    }
}

impl<S: KeyValueStore> Controller<S> {
    pub fn with_repository(repository: Repository<S>, config: AppConfig) -> Self {
        Self {
            repository,
            config,
            notification_sink: Some(Box::new(LogSink)),
            board: ReminderBoard::default(),
            lists: HashMap::new(),
        }
    }

    pub fn with_notification_sink(mut self, sink: Option<Box<dyn NotificationSink>>) -> Self {
        self.notification_sink = sink;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repository
    }

    pub fn board(&self) -> &ReminderBoard {
        &self.board
    }

    pub fn list(&self, key: CollectionKey) -> Option<&ItemList> {
        self.lists.get(&key)
    }

    /// Reloads a list; refreshing events also runs the notification pass.
    pub fn refresh_list<Tz: TimeZone>(
        &mut self,
        key: CollectionKey,
        now: &DateTime<Tz>,
    ) -> &ItemList {
        let items = self.repository.load_items(key);
        debug!(collection = %key, count = items.len(), "list refreshed");
        if key == CollectionKey::Events && self.config.notify_events {
            self.dispatch_notifications(&items, now);
        }
        self.update_list(key, ListMsg::Loaded(items))
    }

    pub fn add_item<Tz: TimeZone>(
        &mut self,
        key: CollectionKey,
        draft: ItemDraft,
        now: &DateTime<Tz>,
    ) -> Result<Option<Item>, ValidationError> {
        let draft = draft.validate(key)?;
        let added = self.repository.add_item(key, draft, now.with_timezone(&Utc));
        Ok(match absorb_write_failure(added, "add item") {
            Some(item) => {
                self.update_list(key, ListMsg::Added(item.clone()));
                Some(item)
            }
            None => {
                self.reload_list(key);
                None
            }
        })
    }

    /// Returns `Ok(None)` when the item is gone or could not be written.
    pub fn edit_item(
        &mut self,
        key: CollectionKey,
        id: &str,
        draft: ItemDraft,
    ) -> Result<Option<Item>, ValidationError> {
        let draft = draft.validate(key)?;
        let edited = self.repository.edit_item(key, id, draft);
        Ok(match absorb_write_failure(edited, "edit item").flatten() {
            Some(item) => {
                self.update_list(key, ListMsg::Updated(item.clone()));
                Some(item)
            }
            None => {
                self.reload_list(key);
                None
            }
        })
    }

    pub fn delete_item(&mut self, key: CollectionKey, id: &str) -> bool {
        let removed = absorb_write_failure(self.repository.delete_item(key, id), "delete item");
        match removed {
            Some(removed) => {
                self.update_list(key, ListMsg::Removed(id.to_string()));
                removed
            }
            None => {
                self.reload_list(key);
                false
            }
        }
    }

    pub fn refresh_reminders(&mut self) -> &ReminderBoard {
        let reminders = self.repository.load_reminders();
        self.update_board(BoardMsg::Loaded(reminders))
    }

    /// Starts a new reminder; the configured default hour applies when the draft keeps
    /// the built-in one.
    pub fn new_reminder_draft(&self) -> ReminderDraft {
        ReminderDraft {
            reminder_hour: self.config.default_reminder_hour,
            ..ReminderDraft::default()
        }
    }

    pub fn add_reminder<Tz: TimeZone>(
        &mut self,
        draft: ReminderDraft,
        now: &DateTime<Tz>,
    ) -> Result<Option<Reminder>, ValidationError> {
        let draft = draft.validate()?;
        let added = self.repository.add_reminder(draft, now);
        Ok(match absorb_write_failure(added, "add reminder") {
            Some(reminder) => {
                self.update_board(BoardMsg::Updated(reminder.clone()));
                Some(reminder)
            }
            None => {
                self.refresh_reminders();
                None
            }
        })
    }

    pub fn edit_reminder<Tz: TimeZone>(
        &mut self,
        id: &str,
        draft: ReminderDraft,
        now: &DateTime<Tz>,
    ) -> Result<Option<Reminder>> {
        let draft = draft.validate()?;
        let edited = surface_logic_errors(self.repository.edit_reminder(id, draft, now))?;
        Ok(match absorb_write_failure(edited, "edit reminder") {
            Some(reminder) => {
                self.update_board(BoardMsg::Updated(reminder.clone()));
                Some(reminder)
            }
            None => {
                self.refresh_reminders();
                None
            }
        })
    }

    /// Applies a user action to a due reminder. Not-due, discarded and unknown reminders are
    /// reported as errors.
    pub fn act<Tz: TimeZone>(
        &mut self,
        id: &str,
        action: ReminderAction,
        now: &DateTime<Tz>,
    ) -> Result<Option<Transition>> {
        let applied =
            surface_logic_errors(self.repository.apply_reminder_action(id, action, now))?;
        Ok(match absorb_write_failure(applied, "record reminder action") {
            Some(transition) => {
                self.update_board(BoardMsg::Updated(transition.reminder.clone()));
                Some(transition)
            }
            None => {
                self.refresh_reminders();
                None
            }
        })
    }

    pub fn delete_reminder(&mut self, id: &str) -> bool {
        match absorb_write_failure(self.repository.delete_reminder(id), "delete reminder") {
            Some(removed) => {
                self.update_board(BoardMsg::Removed(id.to_string()));
                removed
            }
            None => {
                self.refresh_reminders();
                false
            }
        }
    }

    pub fn notify<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DispatchSummary> {
        let events = self.repository.load_items(CollectionKey::Events);
        self.dispatch_notifications(&events, now)
    }

    fn dispatch_notifications<Tz: TimeZone>(
        &self,
        events: &[Item],
        now: &DateTime<Tz>,
    ) -> Option<DispatchSummary> {
        let sink = self.notification_sink.as_deref()?;
        Some(dispatch_event_notifications(events, sink, now))
    }

    fn reload_list(&mut self, key: CollectionKey) {
        let items = self.repository.load_items(key);
        self.update_list(key, ListMsg::Loaded(items));
    }

    fn update_list(&mut self, key: CollectionKey, msg: ListMsg) -> &ItemList {
        let current = self.lists.remove(&key).unwrap_or_else(|| ItemList::new(key));
        self.lists.entry(key).or_insert(reduce_list(current, msg))
    }

    fn update_board(&mut self, msg: BoardMsg) -> &ReminderBoard {
        self.board = reduce_board(std::mem::take(&mut self.board), msg);
        &self.board
    }
}

/// Storage write failures are not user errors: log them and let the caller reload.
fn absorb_write_failure<T>(result: Result<T, RepositoryError>, operation: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(operation, error = %err, "write failed, changes were not saved");
            None
        }
    }
}

/// Splits domain failures (unknown id, not due, discarded) from storage failures so only the
/// former reach the user.
fn surface_logic_errors<T>(
    result: Result<T, RepositoryError>,
) -> Result<Result<T, RepositoryError>> {
    match result {
        Err(RepositoryError::ReminderNotFound(id)) => {
            Err(anyhow::anyhow!("reminder `{id}` not found"))
        }
        Err(RepositoryError::Transition(err)) => Err(err.into()),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use parking_lot::Mutex;
    use remind_core::error::StoreError;
    use remind_core::{MemoryStore, ReminderStatus};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<NotificationRequest>>>,
    }

    impl NotificationSink for RecordingSink {
        fn deliver(&self, notification: NotificationRequest) -> Result<()> {
            self.sent.lock().push(notification);
            Ok(())
        }
    }

    struct FrozenStore;

    impl KeyValueStore for FrozenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(Some("[]".into()))
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 19, 12, 0, 0).unwrap()
    }

    fn controller() -> Controller<MemoryStore> {
        Controller::with_repository(Repository::new(MemoryStore::new()), AppConfig::default())
    }

    #[test]
    fn refreshing_events_dispatches_notifications() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut controller = controller().with_notification_sink(Some(Box::new(RecordingSink {
            sent: Arc::clone(&sent),
        })));
        let draft = ItemDraft {
            title: "Recital".into(),
            date: NaiveDate::from_ymd_opt(2025, 10, 19),
            ..ItemDraft::default()
        };
        controller
            .add_item(CollectionKey::Events, draft, &now())
            .unwrap()
            .expect("saved");

        let list = controller.refresh_list(CollectionKey::Events, &now());
        assert_eq!(list.items().len(), 1);
        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "You have 1 event(s) today!");
    }

    #[test]
    fn validation_blocks_before_storage() {
        let mut controller = controller();
        let err = controller
            .add_item(CollectionKey::Likes, ItemDraft::default(), &now())
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingTitle);
        assert!(controller.repository().store().keys().is_empty());
    }

    #[test]
    fn reminder_actions_flow_into_the_board() {
        let mut controller = controller();
        let mut draft = controller.new_reminder_draft();
        draft.title = Some("Journal".into());
        let reminder = controller.add_reminder(draft, &now()).unwrap().expect("saved");
        assert_eq!(controller.board().reminders().len(), 1);

        let early = controller.act(&reminder.id, ReminderAction::Done, &now());
        assert!(early.is_err(), "not due yet");

        let due = reminder.next_reminder + Duration::minutes(1);
        let snoozed = controller
            .act(&reminder.id, ReminderAction::Tomorrow, &due)
            .unwrap()
            .expect("saved");
        assert_eq!(snoozed.reminder.status, ReminderStatus::Snoozed);
        assert_eq!(controller.board().reminders()[0].snooze_count, 1);

        let later = snoozed.reminder.next_reminder;
        controller
            .act(&reminder.id, ReminderAction::Discard, &later)
            .unwrap()
            .expect("saved");
        assert!(controller.board().is_empty());
        assert!(controller.repository().get_reminder(&reminder.id).is_some());

        assert!(controller.delete_reminder(&reminder.id));
        assert!(controller.repository().get_reminder(&reminder.id).is_none());
    }

    #[test]
    fn write_failures_are_absorbed() {
        let mut controller =
            Controller::with_repository(Repository::new(FrozenStore), AppConfig::default())
                .with_notification_sink(None);
        let draft = ItemDraft {
            title: "Lost".into(),
            ..ItemDraft::default()
        };
        let saved = controller.add_item(CollectionKey::Likes, draft, &now()).unwrap();
        assert!(saved.is_none());
        assert_eq!(controller.list(CollectionKey::Likes).map(|l| l.items().len()), Some(0));
        assert!(!controller.delete_item(CollectionKey::Likes, "anything"));
        assert!(controller.notify(&now()).is_none());
    }

    #[test]
    fn unknown_reminders_are_user_errors() {
        let mut controller = controller();
        let err = controller
            .act("ghost", ReminderAction::Done, &now())
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn items_are_stamped_in_utc_whatever_the_callers_zone() {
        let mut controller = controller();
        let local = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 10, 19, 14, 0, 0)
            .unwrap();
        let draft = ItemDraft {
            title: "Concert".into(),
            ..ItemDraft::default()
        };
        let item = controller
            .add_item(CollectionKey::Likes, draft, &local)
            .unwrap()
            .expect("saved");
        assert_eq!(item.created_at, now());
        assert_eq!(controller.list(CollectionKey::Likes).map(|l| l.items().len()), Some(1));
    }
}
