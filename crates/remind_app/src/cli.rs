use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use remind_core::dates::parse_calendar_date;
use remind_core::reminder::{DisplayType, DEFAULT_ICON, ICON_OPTIONS};
use remind_core::{
    CollectionKey, Frequency, ItemDraft, Priority, ReminderAction, ReminderDraft,
};

use crate::app::{AppConfig, Controller};
use crate::render::{item_row, reminder_row};

#[derive(Parser, Debug)]
#[command(name = "remind")]
#[command(about = "Personal reminders, events, wishlist and likes", long_about = None)]
pub struct Cli {
    /// Directory holding the JSON collections
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a collection: events, wishlist or likes
    List { collection: CollectionKey },
    /// Add an item to a collection
    Add {
        collection: CollectionKey,
        #[command(flatten)]
        item: ItemArgs,
    },
    /// Change fields of an existing item
    Edit {
        collection: CollectionKey,
        id: String,
        #[command(flatten)]
        item: ItemArgs,
    },
    /// Remove an item
    Delete { collection: CollectionKey, id: String },
    /// Show active and snoozed reminders
    Reminders {
        /// Include discarded reminders
        #[arg(long)]
        all: bool,
    },
    /// Create a recurring reminder
    Remind(ReminderArgs),
    /// Change a reminder; it is re-armed from now
    EditReminder {
        id: String,
        #[command(flatten)]
        reminder: ReminderArgs,
    },
    /// Respond to a due reminder: tomorrow, discard or done
    Act { id: String, action: ReminderAction },
    /// Delete a reminder for good
    Forget { id: String },
    /// Send today/tomorrow event notifications
    Notify,
    /// List the built-in icon names for icon reminders
    Icons,
}

#[derive(Args, Debug, Default)]
pub struct ItemArgs {
    #[arg(long)]
    pub title: Option<String>,
    /// YYYY-MM-DD, events only
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// high, medium or low, wishlist only
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub description: Option<String>,
}

impl ItemArgs {
    fn apply(self, draft: &mut ItemDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if self.date.is_some() {
            draft.date = self.date;
        }
        if self.priority.is_some() {
            draft.priority = self.priority;
        }
        if self.description.is_some() {
            draft.description = self.description;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ReminderArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// daily, weekly or custom
    #[arg(long)]
    pub frequency: Option<Frequency>,
    /// Interval for custom frequency
    #[arg(long)]
    pub custom_days: Option<i64>,
    /// Glyph name; implies icon display unless --display is given
    #[arg(long)]
    pub icon: Option<String>,
    /// text or icon
    #[arg(long)]
    pub display: Option<DisplayType>,
    /// Hour of day, 0-23
    #[arg(long)]
    pub hour: Option<u32>,
}

impl ReminderArgs {
    fn apply(self, draft: &mut ReminderDraft) {
        if self.title.is_some() {
            draft.title = self.title;
        }
        if self.description.is_some() {
            draft.description = self.description;
        }
        if let Some(frequency) = self.frequency {
            draft.frequency = frequency;
        }
        if self.custom_days.is_some() {
            draft.custom_days = self.custom_days;
        }
        if self.icon.is_some() {
            draft.icon = self.icon;
            draft.display_type = DisplayType::Icon;
        }
        if let Some(display) = self.display {
            draft.display_type = display;
        }
        if let Some(hour) = self.hour {
            draft.reminder_hour = hour;
        }
    }
}

/// Storage write failures are logged by the controller and never fail the command.
fn warn_unsaved() {
    eprintln!("warning: changes could not be saved, see the log for details");
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_calendar_date(value).ok_or_else(|| format!("`{value}` is not a calendar date"))
}

pub fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let config = match cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    };
    let mut controller = Controller::open(config)?;
    let now = Local::now();

    match cli.command {
        Command::List { collection } => {
            let list = controller.refresh_list(collection, &now);
            if list.items().is_empty() {
                println!("{}", collection.empty_message());
            }
            for item in list.items() {
                println!("{}", item_row(item, &now));
            }
        }
        Command::Add { collection, item } => {
            let mut draft = ItemDraft::default();
            item.apply(&mut draft);
            match controller.add_item(collection, draft, &now)? {
                Some(item) => println!("{}", item_row(&item, &now)),
                None => warn_unsaved(),
            }
        }
        Command::Edit { collection, id, item } => {
            let existing = controller
                .repository()
                .get_item(collection, &id)
                .ok_or_else(|| anyhow!("no {collection} item with id `{id}`"))?;
            let mut draft = ItemDraft::from_item(&existing);
            item.apply(&mut draft);
            match controller.edit_item(collection, &id, draft)? {
                Some(item) => println!("{}", item_row(&item, &now)),
                None => warn_unsaved(),
            }
        }
        Command::Delete { collection, id } => {
            if controller.repository().get_item(collection, &id).is_none() {
                bail!("no {collection} item with id `{id}`");
            }
            if !controller.delete_item(collection, &id) {
                warn_unsaved();
            }
        }
        Command::Reminders { all } => {
            if all {
                for reminder in controller.repository().load_reminders() {
                    println!("{}  [{}]", reminder_row(&reminder, &now), reminder.status);
                }
            } else {
                let board = controller.refresh_reminders();
                if board.is_empty() {
                    println!("No reminders yet");
                }
                for reminder in board.reminders() {
                    println!("{}", reminder_row(reminder, &now));
                }
                let due = board.due(&now).count();
                if due > 0 {
                    println!("{due} due now; answer with `remind act <id> tomorrow|discard|done`");
                }
            }
        }
        Command::Remind(args) => {
            let mut draft = controller.new_reminder_draft();
            args.apply(&mut draft);
            match controller.add_reminder(draft, &now)? {
                Some(reminder) => println!("{}", reminder_row(&reminder, &now)),
                None => warn_unsaved(),
            }
        }
        Command::EditReminder { id, reminder } => {
            let existing = controller
                .repository()
                .get_reminder(&id)
                .ok_or_else(|| anyhow!("reminder `{id}` not found"))?;
            let mut draft = ReminderDraft::from_reminder(&existing);
            reminder.apply(&mut draft);
            match controller.edit_reminder(&id, draft, &now)? {
                Some(reminder) => println!("{}", reminder_row(&reminder, &now)),
                None => warn_unsaved(),
            }
        }
        Command::Act { id, action } => match controller.act(&id, action, &now)? {
            Some(transition) => {
                println!("{}: {}", transition.reminder.label(), transition.event);
                println!("{}", reminder_row(&transition.reminder, &now));
            }
            None => warn_unsaved(),
        },
        Command::Forget { id } => {
            if controller.repository().get_reminder(&id).is_none() {
                bail!("reminder `{id}` not found");
            }
            if !controller.delete_reminder(&id) {
                warn_unsaved();
            }
        }
        Command::Notify => match controller.notify(&now) {
            Some(summary) => println!(
                "{} today, {} tomorrow, {} notification(s) sent",
                summary.today, summary.tomorrow, summary.delivered
            ),
            None => println!("Notifications are disabled"),
        },
        Command::Icons => {
            for icon in ICON_OPTIONS {
                let marker = if icon == DEFAULT_ICON { " (default)" } else { "" };
                println!("{icon}{marker}");
            }
        }
    }
    Ok(())
}
