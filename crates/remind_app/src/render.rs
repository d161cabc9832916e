use chrono::{DateTime, TimeZone};
use remind_core::dates::{date_badge, format_date_for_display};
use remind_core::reminder::DisplayType;
use remind_core::schedule::{describe_next_reminder, is_due};
use remind_core::{Item, Reminder};

pub fn item_row<Tz: TimeZone>(item: &Item, now: &DateTime<Tz>) -> String {
    let mut row = format!("[{}] {}", item.id, item.title);
    if let Some(date) = item.date {
        row.push_str(&format!("  {}", format_date_for_display(date)));
        if let Some(badge) = date_badge(date, now) {
            row.push_str(&format!(" ({})", badge.text));
        }
    }
    if let Some(priority) = item.priority {
        row.push_str(&format!("  !{priority}"));
    }
    if let Some(description) = &item.description {
        row.push_str(&format!("\n    {description}"));
    }
    row
}

pub fn reminder_row<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> String {
    let label = match (reminder.display_type, &reminder.icon, &reminder.title) {
        (DisplayType::Icon, Some(icon), Some(title)) => format!("<{icon}> {title}"),
        (DisplayType::Icon, Some(icon), None) => format!("<{icon}>"),
        _ => reminder.label().to_string(),
    };
    let mut row = format!(
        "[{}] {}  {} · {}",
        reminder.id,
        label,
        reminder.frequency_label(),
        describe_next_reminder(reminder.next_reminder, reminder.reminder_hour, now)
    );
    if is_due(reminder, now) {
        row.push_str("  DUE: tomorrow | discard | done");
    }
    row
}
