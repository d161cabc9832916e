use chrono::{DateTime, TimeZone};
use remind_core::schedule::{is_due, is_in_active_set};
use remind_core::{CollectionKey, Item, Reminder};

/// What the reminders screen shows: the active set, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderBoard {
    reminders: Vec<Reminder>,
}

#[derive(Debug, Clone)]
pub enum BoardMsg {
    Loaded(Vec<Reminder>),
    Updated(Reminder),
    Removed(String),
}

impl ReminderBoard {
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub fn due<'a, Tz: TimeZone + 'a>(
        &'a self,
        now: &'a DateTime<Tz>,
    ) -> impl Iterator<Item = &'a Reminder> + 'a {
        self.reminders
            .iter()
            .filter(move |reminder| is_due(reminder, now))
    }
}

pub fn reduce_board(board: ReminderBoard, msg: BoardMsg) -> ReminderBoard {
    let mut reminders = board.reminders;
    match msg {
        BoardMsg::Loaded(loaded) => {
            reminders = loaded;
            reminders.retain(is_in_active_set);
        }
        BoardMsg::Updated(updated) => {
            let position = reminders.iter().position(|r| r.id == updated.id);
            match (position, is_in_active_set(&updated)) {
                (Some(idx), true) => reminders[idx] = updated,
                (Some(idx), false) => {
                    reminders.remove(idx);
                }
                (None, true) => reminders.insert(0, updated),
                (None, false) => {}
            }
        }
        BoardMsg::Removed(id) => reminders.retain(|r| r.id != id),
    }
    ReminderBoard { reminders }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemList {
    key: CollectionKey,
    items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub enum ListMsg {
    Loaded(Vec<Item>),
    Added(Item),
    Updated(Item),
    Removed(String),
}

impl ItemList {
    pub fn new(key: CollectionKey) -> Self {
        Self {
            key,
            items: Vec::new(),
        }
    }

    pub fn key(&self) -> CollectionKey {
        self.key
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

pub fn reduce_list(list: ItemList, msg: ListMsg) -> ItemList {
    let ItemList { key, mut items } = list;
    match msg {
        ListMsg::Loaded(loaded) => items = loaded,
        ListMsg::Added(item) => items.insert(0, item),
        ListMsg::Updated(updated) => {
            if let Some(slot) = items.iter_mut().find(|item| item.id == updated.id) {
                *slot = updated;
            }
        }
        ListMsg::Removed(id) => items.retain(|item| item.id != id),
    }
    ItemList { key, items }
}
