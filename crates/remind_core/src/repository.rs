use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::draft::{ItemDraft, ReminderDraft, Valid};
use crate::error::RepositoryError;
use crate::item::{CollectionKey, Item, REMINDERS_KEY};
use crate::reminder::{Reminder, ReminderAction, ReminderStatus};
use crate::schedule::{self, Transition};
use crate::store::KeyValueStore;

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;

type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// CRUD over whole collections. Every mutation loads the full array, changes one record and
/// writes the array back; concurrent writers race and the last one wins.
pub struct Repository<S> {
    store: S,
    next_id: IdGenerator,
}

pub struct RepositoryBuilder<S> {
    store: S,
    next_id: Option<IdGenerator>,
}

impl<S: KeyValueStore> RepositoryBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            next_id: None,
        }
    }

    pub fn with_id_generator(
        mut self,
        generator: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.next_id = Some(Box::new(generator));
        self
    }

    pub fn build(self) -> Repository<S> {
        Repository {
            store: self.store,
            next_id: self
                .next_id
                .unwrap_or_else(|| Box::new(|| Uuid::now_v7().to_string())),
        }
    }
}

impl<S: KeyValueStore> Repository<S> {
    pub fn builder(store: S) -> RepositoryBuilder<S> {
        RepositoryBuilder::new(store)
    }

    pub fn new(store: S) -> Self {
        RepositoryBuilder::new(store).build()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_items(&self, key: CollectionKey) -> Vec<Item> {
        self.load_collection(key.as_str())
    }

    pub fn save_items(&self, key: CollectionKey, items: &[Item]) -> Result<()> {
        self.save_collection(key.as_str(), items)
    }

    pub fn get_item(&self, key: CollectionKey, id: &str) -> Option<Item> {
        self.load_items(key).into_iter().find(|item| item.id == id)
    }

    /// Stores a new item at the front of the collection.
    pub fn add_item(
        &self,
        key: CollectionKey,
        draft: Valid<ItemDraft>,
        now: DateTime<Utc>,
    ) -> Result<Item> {
        let draft = draft.into_inner();
        let item = Item {
            id: (self.next_id)(),
            title: draft.title,
            date: draft.date,
            priority: draft.priority,
            description: draft.description,
            created_at: now,
        };
        let mut items = self.load_items(key);
        items.insert(0, item.clone());
        self.save_items(key, &items)?;
        tracing::info!(collection = %key, id = %item.id, "item added");
        Ok(item)
    }

    /// Replaces the record with the same id. Unknown ids leave storage untouched.
    pub fn update_item(&self, key: CollectionKey, updated: Item) -> Result<bool> {
        let mut items = self.load_items(key);
        let Some(slot) = items.iter_mut().find(|item| item.id == updated.id) else {
            tracing::warn!(collection = %key, id = %updated.id, "update for unknown item ignored");
            return Ok(false);
        };
        *slot = updated;
        self.save_items(key, &items)?;
        Ok(true)
    }

    /// Applies form input to an existing item, keeping its id and creation time.
    pub fn edit_item(
        &self,
        key: CollectionKey,
        id: &str,
        draft: Valid<ItemDraft>,
    ) -> Result<Option<Item>> {
        let Some(mut item) = self.get_item(key, id) else {
            return Ok(None);
        };
        let draft = draft.into_inner();
        item.title = draft.title;
        item.description = draft.description;
        if key.uses_date() {
            item.date = draft.date;
        }
        if key.uses_priority() {
            item.priority = draft.priority;
        }
        self.update_item(key, item.clone())?;
        Ok(Some(item))
    }

    pub fn delete_item(&self, key: CollectionKey, id: &str) -> Result<bool> {
        let mut items = self.load_items(key);
        let before = items.len();
        items.retain(|item| item.id != id);
        self.save_items(key, &items)?;
        Ok(items.len() != before)
    }

    pub fn load_reminders(&self) -> Vec<Reminder> {
        self.load_collection(REMINDERS_KEY)
    }

    pub fn save_reminders(&self, reminders: &[Reminder]) -> Result<()> {
        self.save_collection(REMINDERS_KEY, reminders)
    }

    pub fn get_reminder(&self, id: &str) -> Option<Reminder> {
        self.load_reminders()
            .into_iter()
            .find(|reminder| reminder.id == id)
    }

    /// Reminders shown by default: active or snoozed, in stored order.
    pub fn active_reminders(&self) -> Vec<Reminder> {
        schedule::active_set(self.load_reminders())
    }

    pub fn add_reminder<Tz: TimeZone>(
        &self,
        draft: Valid<ReminderDraft>,
        now: &DateTime<Tz>,
    ) -> Result<Reminder> {
        let draft = draft.into_inner();
        let next_reminder = schedule::next_occurrence_from(
            now,
            draft.frequency,
            draft.reminder_hour,
            draft.custom_days,
        )
        .with_timezone(&Utc);
        let reminder = Reminder {
            id: (self.next_id)(),
            title: draft.title,
            description: draft.description,
            frequency: draft.frequency,
            custom_days: draft.custom_days,
            display_type: draft.display_type,
            icon: draft.icon,
            reminder_hour: draft.reminder_hour,
            next_reminder,
            last_reminded: None,
            status: ReminderStatus::Active,
            completed_count: 0,
            snooze_count: 0,
            discarded_count: 0,
            created_at: now.with_timezone(&Utc),
        };
        let mut reminders = self.load_reminders();
        reminders.insert(0, reminder.clone());
        self.save_reminders(&reminders)?;
        tracing::info!(id = %reminder.id, next = %reminder.next_reminder, "reminder added");
        Ok(reminder)
    }

    pub fn update_reminder(&self, updated: Reminder) -> Result<bool> {
        let mut reminders = self.load_reminders();
        let Some(slot) = reminders.iter_mut().find(|reminder| reminder.id == updated.id) else {
            tracing::warn!(id = %updated.id, "update for unknown reminder ignored");
            return Ok(false);
        };
        *slot = updated;
        self.save_reminders(&reminders)?;
        Ok(true)
    }

    /// Saving the edit form re-arms the reminder from `now` with its new rule and makes it
    /// active again. Counters and history are kept.
    pub fn edit_reminder<Tz: TimeZone>(
        &self,
        id: &str,
        draft: Valid<ReminderDraft>,
        now: &DateTime<Tz>,
    ) -> Result<Reminder> {
        let mut reminder = self
            .get_reminder(id)
            .ok_or_else(|| RepositoryError::ReminderNotFound(id.to_string()))?;
        let draft = draft.into_inner();
        reminder.next_reminder = schedule::next_occurrence_from(
            now,
            draft.frequency,
            draft.reminder_hour,
            draft.custom_days,
        )
        .with_timezone(&Utc);
        reminder.title = draft.title;
        reminder.description = draft.description;
        reminder.frequency = draft.frequency;
        reminder.custom_days = draft.custom_days;
        reminder.display_type = draft.display_type;
        reminder.icon = draft.icon;
        reminder.reminder_hour = draft.reminder_hour;
        reminder.status = ReminderStatus::Active;
        self.update_reminder(reminder.clone())?;
        Ok(reminder)
    }

    pub fn delete_reminder(&self, id: &str) -> Result<bool> {
        let mut reminders = self.load_reminders();
        let before = reminders.len();
        reminders.retain(|reminder| reminder.id != id);
        self.save_reminders(&reminders)?;
        Ok(reminders.len() != before)
    }

    pub fn apply_reminder_action<Tz: TimeZone>(
        &self,
        id: &str,
        action: ReminderAction,
        now: &DateTime<Tz>,
    ) -> Result<Transition> {
        let mut reminders = self.load_reminders();
        let slot = reminders
            .iter_mut()
            .find(|reminder| reminder.id == id)
            .ok_or_else(|| RepositoryError::ReminderNotFound(id.to_string()))?;
        let transition = schedule::apply_action(slot, action, now)?;
        *slot = transition.reminder.clone();
        self.save_reminders(&reminders)?;
        tracing::info!(id, event = %transition.event, "reminder action recorded");
        Ok(transition)
    }
}

impl<S: KeyValueStore> Repository<S> {
    /// Missing keys read as empty; unreadable or corrupt blobs are logged and read as empty.
    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(key, %err, "failed to read collection, using empty list");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(key, %err, "corrupt collection, using empty list");
                Vec::new()
            }
        }
    }

    fn save_collection<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        let encoded = serde_json::to_string(records).map_err(|source| RepositoryError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &encoded)?;
        tracing::debug!(key, count = records.len(), "collection saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, TransitionError};
    use crate::item::Priority;
    use crate::reminder::{DisplayType, Frequency};
    use crate::store::MemoryStore;
    use chrono::{Duration, NaiveDate, Timelike};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn repository() -> Repository<MemoryStore> {
        let counter = Arc::new(AtomicUsize::new(0));
        Repository::builder(MemoryStore::new())
            .with_id_generator(move || {
                format!("id-{}", counter.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .build()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 19, 10, 0, 0).unwrap()
    }

    fn draft(title: &str) -> ItemDraft {
        ItemDraft {
            title: title.into(),
            ..ItemDraft::default()
        }
    }

    fn reminder_draft(title: &str, frequency: Frequency, hour: u32) -> Valid<ReminderDraft> {
        ReminderDraft {
            title: Some(title.into()),
            frequency,
            reminder_hour: hour,
            ..ReminderDraft::default()
        }
        .validate()
        .unwrap()
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn new_items_are_prepended_with_identity_and_timestamp() {
        let repo = repository();
        for title in ["first", "second", "third"] {
            repo.add_item(
                CollectionKey::Likes,
                draft(title).validate(CollectionKey::Likes).unwrap(),
                now(),
            )
            .unwrap();
        }
        let items = repo.load_items(CollectionKey::Likes);
        let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert_eq!(items[0].id, "id-3");
        assert_eq!(items[2].created_at, now());
        assert!(repo.load_items(CollectionKey::Events).is_empty());
    }

    #[test]
    fn saved_collections_load_back_unchanged() {
        let repo = repository();
        let items: Vec<Item> = (0..4)
            .map(|idx| Item {
                id: format!("item-{idx}"),
                title: format!("Item {idx}"),
                date: NaiveDate::from_ymd_opt(2025, 11, idx + 1),
                priority: (idx % 2 == 0).then_some(Priority::Low),
                description: None,
                created_at: now() + Duration::minutes(idx.into()),
            })
            .collect();
        repo.save_items(CollectionKey::Events, &items).unwrap();
        assert_eq!(repo.load_items(CollectionKey::Events), items);
    }

    #[test]
    fn corrupt_collections_read_as_empty() {
        let repo = repository();
        repo.store().set("wishlist", "{not json").unwrap();
        assert!(repo.load_items(CollectionKey::Wishlist).is_empty());
    }

    #[test]
    fn update_replaces_whole_record_and_ignores_unknown_ids() {
        let repo = repository();
        let item = repo
            .add_item(
                CollectionKey::Wishlist,
                draft("Bike").validate(CollectionKey::Wishlist).unwrap(),
                now(),
            )
            .unwrap();

        let mut changed = item.clone();
        changed.priority = Some(Priority::High);
        changed.description = Some("red".into());
        assert!(repo.update_item(CollectionKey::Wishlist, changed.clone()).unwrap());
        assert_eq!(repo.get_item(CollectionKey::Wishlist, &item.id), Some(changed));

        let mut stranger = item;
        stranger.id = "missing".into();
        assert!(!repo.update_item(CollectionKey::Wishlist, stranger).unwrap());
        assert_eq!(repo.load_items(CollectionKey::Wishlist).len(), 1);
    }

    #[test]
    fn edit_keeps_identity_and_fields_of_other_collections() {
        let repo = repository();
        let mut item = repo
            .add_item(
                CollectionKey::Events,
                ItemDraft {
                    title: "Gig".into(),
                    date: NaiveDate::from_ymd_opt(2025, 10, 25),
                    ..ItemDraft::default()
                }
                .validate(CollectionKey::Events)
                .unwrap(),
                now(),
            )
            .unwrap();

        let edited = repo
            .edit_item(
                CollectionKey::Events,
                &item.id,
                ItemDraft {
                    title: "Gig (moved)".into(),
                    date: NaiveDate::from_ymd_opt(2025, 10, 26),
                    ..ItemDraft::default()
                }
                .validate(CollectionKey::Events)
                .unwrap(),
            )
            .unwrap()
            .expect("item exists");

        item.title = "Gig (moved)".into();
        item.date = NaiveDate::from_ymd_opt(2025, 10, 26);
        assert_eq!(edited, item);
        assert_eq!(repo.load_items(CollectionKey::Events), vec![item]);
    }

    #[test]
    fn delete_filters_the_record_out() {
        let repo = repository();
        let like = |title: &str| {
            repo.add_item(
                CollectionKey::Likes,
                draft(title).validate(CollectionKey::Likes).unwrap(),
                now(),
            )
            .unwrap()
        };
        let keep = like("keep");
        let drop = like("drop");
        assert!(repo.delete_item(CollectionKey::Likes, &drop.id).unwrap());
        assert!(!repo.delete_item(CollectionKey::Likes, &drop.id).unwrap());
        assert_eq!(repo.load_items(CollectionKey::Likes), vec![keep]);
    }

    #[test]
    fn new_reminders_start_active_and_armed() {
        let repo = repository();
        let reminder = repo
            .add_reminder(reminder_draft("Stretch", Frequency::Weekly, 7), &now())
            .unwrap();
        assert_eq!(reminder.status, ReminderStatus::Active);
        assert_eq!(reminder.completed_count + reminder.snooze_count + reminder.discarded_count, 0);
        assert_eq!(reminder.next_reminder.date_naive(), now().date_naive() + Duration::days(7));
        assert_eq!(reminder.next_reminder.hour(), 7);
        assert_eq!(reminder.created_at, now());
        assert_eq!(repo.active_reminders(), vec![reminder]);
    }

    #[test]
    fn discarded_reminders_stay_stored_but_leave_the_active_set() {
        let repo = repository();
        let reminder = repo
            .add_reminder(reminder_draft("Gym", Frequency::Daily, 9), &now())
            .unwrap();
        let due = reminder.next_reminder;
        let transition = repo
            .apply_reminder_action(&reminder.id, ReminderAction::Discard, &due)
            .unwrap();
        assert_eq!(transition.reminder.status, ReminderStatus::Discarded);

        let stored = repo.get_reminder(&reminder.id).expect("still stored");
        assert_eq!(stored.discarded_count, 1);
        assert!(repo.active_reminders().is_empty());

        let err = repo
            .apply_reminder_action(&reminder.id, ReminderAction::Done, &due)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Transition(TransitionError::Discarded)));
    }

    #[test]
    fn edit_rearms_and_reactivates() {
        let repo = repository();
        let reminder = repo
            .add_reminder(reminder_draft("Gym", Frequency::Daily, 9), &now())
            .unwrap();
        repo.apply_reminder_action(&reminder.id, ReminderAction::Discard, &reminder.next_reminder)
            .unwrap();

        let later = now() + Duration::days(2);
        let draft = ReminderDraft {
            display_type: DisplayType::Icon,
            icon: Some("fitness-outline".into()),
            frequency: Frequency::Custom,
            custom_days: Some(3),
            reminder_hour: 18,
            ..ReminderDraft::default()
        }
        .validate()
        .unwrap();
        let edited = repo.edit_reminder(&reminder.id, draft, &later).unwrap();
        assert_eq!(edited.status, ReminderStatus::Active);
        assert_eq!(edited.discarded_count, 1);
        assert!(edited.title.is_none());
        assert_eq!(edited.next_reminder.date_naive(), later.date_naive() + Duration::days(3));
        assert_eq!(edited.next_reminder.hour(), 18);
        assert_eq!(repo.active_reminders(), vec![edited]);
    }

    #[test]
    fn unknown_reminders_are_reported() {
        let repo = repository();
        let err = repo
            .apply_reminder_action("nope", ReminderAction::Done, &now())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ReminderNotFound(id) if id == "nope"));
        assert!(!repo.delete_reminder("nope").unwrap());
    }

    #[test]
    fn write_failures_surface_to_the_caller() {
        let repo = Repository::new(ReadOnlyStore);
        let valid = draft("x").validate(CollectionKey::Likes).unwrap();
        let err = repo
            .add_item(CollectionKey::Likes, valid, now())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Store(StoreError::Io { .. })));
        assert!(repo.load_items(CollectionKey::Likes).is_empty());
    }
}
