use std::ops::Deref;

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::item::{CollectionKey, Item, Priority};
use crate::reminder::{
    effective_custom_days, DisplayType, Frequency, Reminder, DEFAULT_REMINDER_HOUR,
    MAX_CUSTOM_DAYS,
};

/// Form input that passed validation. Only `validate` methods can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valid<T>(T);

impl<T> Valid<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Valid<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub description: Option<String>,
}

impl ItemDraft {
    pub fn from_item(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            date: item.date,
            priority: item.priority,
            description: item.description.clone(),
        }
    }

    /// Trims the text fields and keeps only what the collection uses: dates for events,
    /// priorities (medium unless chosen) for the wishlist.
    pub fn validate(self, key: CollectionKey) -> Result<Valid<ItemDraft>, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(Valid(ItemDraft {
            title,
            date: self.date.filter(|_| key.uses_date()),
            priority: key
                .uses_priority()
                .then(|| self.priority.unwrap_or_default()),
            description: non_empty(self.description),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub custom_days: Option<i64>,
    pub display_type: DisplayType,
    pub icon: Option<String>,
    pub reminder_hour: u32,
}

impl Default for ReminderDraft {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            frequency: Frequency::Daily,
            custom_days: None,
            display_type: DisplayType::Text,
            icon: None,
            reminder_hour: DEFAULT_REMINDER_HOUR,
        }
    }
}

impl ReminderDraft {
    pub fn from_reminder(reminder: &Reminder) -> Self {
        Self {
            title: reminder.title.clone(),
            description: reminder.description.clone(),
            frequency: reminder.frequency,
            custom_days: reminder.custom_days,
            display_type: reminder.display_type,
            icon: reminder.icon.clone(),
            reminder_hour: reminder.reminder_hour,
        }
    }

    /// Text reminders need a title, icon reminders need an icon and may carry a title too.
    pub fn validate(self) -> Result<Valid<ReminderDraft>, ValidationError> {
        if self.reminder_hour > 23 {
            return Err(ValidationError::HourOutOfRange(self.reminder_hour));
        }
        let title = non_empty(self.title);
        let icon = match self.display_type {
            DisplayType::Icon => Some(non_empty(self.icon).ok_or(ValidationError::MissingIcon)?),
            DisplayType::Text => {
                if title.is_none() {
                    return Err(ValidationError::MissingTitle);
                }
                None
            }
        };
        let custom_days = match self.frequency {
            Frequency::Custom => match self.custom_days {
                Some(days) if days > MAX_CUSTOM_DAYS => {
                    return Err(ValidationError::IntervalTooLong {
                        days,
                        max: MAX_CUSTOM_DAYS,
                    })
                }
                days => Some(i64::from(effective_custom_days(days))),
            },
            Frequency::Daily | Frequency::Weekly => None,
        };
        Ok(Valid(ReminderDraft {
            title,
            description: non_empty(self.description),
            frequency: self.frequency,
            custom_days,
            display_type: self.display_type,
            icon,
            reminder_hour: self.reminder_hour,
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_title_is_required_after_trimming() {
        let draft = ItemDraft {
            title: "   ".into(),
            ..ItemDraft::default()
        };
        assert_eq!(
            draft.validate(CollectionKey::Likes),
            Err(ValidationError::MissingTitle)
        );
    }

    #[test]
    fn item_fields_follow_the_collection() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 24);
        let draft = ItemDraft {
            title: "  Dinner  ".into(),
            date,
            priority: None,
            description: Some("  ".into()),
        };

        let event = draft.clone().validate(CollectionKey::Events).unwrap();
        assert_eq!(event.title, "Dinner");
        assert_eq!(event.date, date);
        assert_eq!(event.priority, None);
        assert_eq!(event.description, None);

        let wish = draft.validate(CollectionKey::Wishlist).unwrap();
        assert_eq!(wish.date, None);
        assert_eq!(wish.priority, Some(Priority::Medium));
    }

    #[test]
    fn text_reminder_needs_a_title() {
        let draft = ReminderDraft {
            title: Some(" ".into()),
            ..ReminderDraft::default()
        };
        assert_eq!(draft.validate(), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn icon_reminder_needs_an_icon_but_not_a_title() {
        let missing = ReminderDraft {
            display_type: DisplayType::Icon,
            ..ReminderDraft::default()
        };
        assert_eq!(missing.validate(), Err(ValidationError::MissingIcon));

        let valid = ReminderDraft {
            display_type: DisplayType::Icon,
            icon: Some("gift-outline".into()),
            ..ReminderDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.icon.as_deref(), Some("gift-outline"));
        assert!(valid.title.is_none());
    }

    #[test]
    fn text_reminders_drop_a_stale_icon() {
        let valid = ReminderDraft {
            title: Some("Stretch".into()),
            icon: Some("fitness-outline".into()),
            ..ReminderDraft::default()
        }
        .validate()
        .unwrap();
        assert!(valid.icon.is_none());
    }

    #[test]
    fn hour_must_be_on_the_clock() {
        let draft = ReminderDraft {
            title: Some("Late".into()),
            reminder_hour: 24,
            ..ReminderDraft::default()
        };
        assert_eq!(draft.validate(), Err(ValidationError::HourOutOfRange(24)));
    }

    #[test]
    fn custom_days_only_survive_on_custom_rules() {
        let base = ReminderDraft {
            title: Some("Plants".into()),
            custom_days: Some(-3),
            ..ReminderDraft::default()
        };
        assert_eq!(base.clone().validate().unwrap().custom_days, None);

        let custom = ReminderDraft {
            frequency: Frequency::Custom,
            ..base
        }
        .validate()
        .unwrap();
        assert_eq!(custom.custom_days, Some(1));
    }

    #[test]
    fn custom_interval_is_bounded() {
        let draft = |days: i64| ReminderDraft {
            title: Some("Descale kettle".into()),
            frequency: Frequency::Custom,
            custom_days: Some(days),
            ..ReminderDraft::default()
        };
        assert_eq!(
            draft(99_999_999_999).validate().unwrap_err(),
            ValidationError::IntervalTooLong {
                days: 99_999_999_999,
                max: MAX_CUSTOM_DAYS,
            }
        );
        assert_eq!(
            draft(MAX_CUSTOM_DAYS).validate().unwrap().custom_days,
            Some(MAX_CUSTOM_DAYS)
        );
    }
}
