use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::dates::resolve_local;
use crate::error::TransitionError;
use crate::reminder::{
    effective_custom_days, Frequency, Reminder, ReminderAction, ReminderEvent, ReminderStatus,
};

/// Result of applying a user action to a due reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub reminder: Reminder,
    pub event: ReminderEvent,
}

/// Next due instant for a rule, measured from the device clock.
pub fn next_occurrence(
    frequency: Frequency,
    reminder_hour: u32,
    custom_days: Option<i64>,
) -> DateTime<Utc> {
    next_occurrence_from(&Local::now(), frequency, reminder_hour, custom_days).with_timezone(&Utc)
}

/// Moves the calendar date of `now` forward by the rule's interval and pins the time to
/// `reminder_hour:00:00.000` in the same zone. The result is never on the same day as `now`.
pub fn next_occurrence_from<Tz: TimeZone>(
    now: &DateTime<Tz>,
    frequency: Frequency,
    reminder_hour: u32,
    custom_days: Option<i64>,
) -> DateTime<Tz> {
    let days = interval_days(frequency, custom_days);
    let date = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    let time = NaiveTime::from_hms_opt(reminder_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    resolve_local(&now.timezone(), date.and_time(time))
}

fn interval_days(frequency: Frequency, custom_days: Option<i64>) -> u32 {
    match frequency {
        Frequency::Daily => 1,
        Frequency::Weekly => 7,
        Frequency::Custom => effective_custom_days(custom_days),
    }
}

pub fn is_due<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> bool {
    now.with_timezone(&Utc) >= reminder.next_reminder
}

pub fn is_in_active_set(reminder: &Reminder) -> bool {
    matches!(
        reminder.status,
        ReminderStatus::Active | ReminderStatus::Snoozed
    )
}

/// Keeps the reminders shown by default, preserving order.
pub fn active_set(reminders: Vec<Reminder>) -> Vec<Reminder> {
    reminders.into_iter().filter(is_in_active_set).collect()
}

/// Snoozing always defers by a single day; completing re-arms on the reminder's own rule.
pub fn apply_action<Tz: TimeZone>(
    reminder: &Reminder,
    action: ReminderAction,
    now: &DateTime<Tz>,
) -> Result<Transition, TransitionError> {
    if reminder.status == ReminderStatus::Discarded {
        return Err(TransitionError::Discarded);
    }
    if !is_due(reminder, now) {
        return Err(TransitionError::NotDue {
            next_reminder: reminder.next_reminder,
        });
    }

    let stamp = now.with_timezone(&Utc);
    let mut updated = reminder.clone();
    let event = match action {
        ReminderAction::Tomorrow => {
            updated.status = ReminderStatus::Snoozed;
            updated.next_reminder =
                next_occurrence_from(now, Frequency::Daily, reminder.reminder_hour, None)
                    .with_timezone(&Utc);
            updated.snooze_count = updated.snooze_count.saturating_add(1);
            updated.last_reminded = Some(stamp);
            ReminderEvent::Snoozed
        }
        ReminderAction::Discard => {
            updated.status = ReminderStatus::Discarded;
            updated.discarded_count = updated.discarded_count.saturating_add(1);
            ReminderEvent::Discarded
        }
        ReminderAction::Done => {
            updated.completed_count = updated.completed_count.saturating_add(1);
            updated.last_reminded = Some(stamp);
            updated.next_reminder = next_occurrence_from(
                now,
                reminder.frequency,
                reminder.reminder_hour,
                reminder.custom_days,
            )
            .with_timezone(&Utc);
            updated.status = ReminderStatus::Active;
            ReminderEvent::Completed
        }
    };

    tracing::debug!(
        id = %reminder.id,
        ?action,
        status = %updated.status,
        next = %updated.next_reminder,
        "reminder transition applied"
    );
    Ok(Transition {
        reminder: updated,
        event,
    })
}

/// Relative wording for the next due instant, e.g. `Tomorrow at 09:00`. Days are counted on
/// the calendar of `now`'s zone.
pub fn describe_next_reminder<Tz: TimeZone>(
    next_reminder: DateTime<Utc>,
    reminder_hour: u32,
    now: &DateTime<Tz>,
) -> String {
    let at = format!(" at {:02}:00", reminder_hour);
    if next_reminder < now.with_timezone(&Utc) {
        return format!("Overdue{at}");
    }
    let next_date = next_reminder.with_timezone(&now.timezone()).date_naive();
    match next_date.signed_duration_since(now.date_naive()).num_days() {
        0 => format!("Today{at}"),
        1 => format!("Tomorrow{at}"),
        d => format!("In {d} days{at}"),
    }
}
