//! Sync configuration supplied by the host application.
//!
//! # Responsibility
//! - Hold every knob the engine reads: exclusions, templates, reminders,
//!   date order, jubilee ages, year window, batch threshold, calendar look.
//! - Load partial JSON documents on top of built-in defaults.
//!
//! # Invariants
//! - A validated config never yields a batch that cannot hold one occurrence
//!   together with all of its reminders.
//! - At most `MAX_REMINDER_SLOTS` reminder slots are configured.

use crate::model::record::{EventCategory, SourceRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Operation threshold per write transaction.
pub const DEFAULT_BATCH_SIZE: usize = 200;
/// Number of independently switchable reminder slots.
pub const MAX_REMINDER_SLOTS: usize = 3;
pub const DEFAULT_JUBILEE_AGES: &[i32] = &[18, 20, 30, 40, 50, 60, 70, 75, 80, 90, 100];

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Order of day and month in slash-separated dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `DD/MM/YYYY` and `DD/MM`.
    DayFirst,
    /// `MM/DD/YYYY` and `MM/DD`.
    #[default]
    MonthFirst,
}

/// Years materialized around the current year, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearWindow {
    pub back: u32,
    pub forward: u32,
}

impl Default for YearWindow {
    fn default() -> Self {
        Self {
            back: 3,
            forward: 5,
        }
    }
}

/// One reminder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSetting {
    pub enabled: bool,
    /// Offset from midnight of the event day; negative is before it.
    pub minutes: i32,
}

/// Source excluded from sync, optionally narrowed to some of its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedSource {
    pub source: SourceRef,
    /// `None` excludes the whole source.
    #[serde(default)]
    pub groups: Option<BTreeSet<String>>,
}

impl ExcludedSource {
    pub fn whole(source: SourceRef) -> Self {
        Self {
            source,
            groups: None,
        }
    }

    pub fn groups<I, S>(source: SourceRef, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source,
            groups: Some(groups.into_iter().map(Into::into).collect()),
        }
    }
}

/// Title templates keyed by category and age display.
///
/// Placeholders: `{name}`, `{label}`, `{age}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTemplates {
    pub birthday: String,
    pub birthday_with_age: String,
    pub anniversary: String,
    pub anniversary_with_age: String,
    pub custom: String,
    pub custom_with_age: String,
    pub other: String,
    pub other_with_age: String,
}

impl Default for LabelTemplates {
    fn default() -> Self {
        Self {
            birthday: "{name}'s birthday".to_string(),
            birthday_with_age: "{name}'s birthday ({age})".to_string(),
            anniversary: "{name}'s anniversary".to_string(),
            anniversary_with_age: "{name}'s anniversary ({age})".to_string(),
            custom: "{name}: {label}".to_string(),
            custom_with_age: "{name}: {label} ({age})".to_string(),
            other: "{name}'s event".to_string(),
            other_with_age: "{name}'s event ({age})".to_string(),
        }
    }
}

impl LabelTemplates {
    /// Returns the template for one `(category, include_age)` pair.
    pub fn template(&self, category: EventCategory, include_age: bool) -> &str {
        match (category, include_age) {
            (EventCategory::Birthday, false) => &self.birthday,
            (EventCategory::Birthday, true) => &self.birthday_with_age,
            (EventCategory::Anniversary, false) => &self.anniversary,
            (EventCategory::Anniversary, true) => &self.anniversary_with_age,
            (EventCategory::Custom, false) => &self.custom,
            (EventCategory::Custom, true) => &self.custom_with_age,
            (EventCategory::Other, false) => &self.other,
            (EventCategory::Other, true) => &self.other_with_age,
        }
    }
}

/// Access level granted on the synthetic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarAccess {
    #[default]
    Read,
    Owner,
}

/// Identity and look of the synthetic calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub account_name: String,
    pub account_type: String,
    pub display_name: String,
    /// ARGB color.
    pub color: u32,
    pub access: CalendarAccess,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            account_name: "Occasions".to_string(),
            account_type: "occasion.local".to_string(),
            display_name: "Birthdays & Anniversaries".to_string(),
            color: 0xFF1E_88E5,
            access: CalendarAccess::Read,
        }
    }
}

/// Full configuration for one sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub date_order: DateOrder,
    pub window: YearWindow,
    pub reminders: Vec<ReminderSetting>,
    pub excluded_sources: Vec<ExcludedSource>,
    pub jubilee_ages: BTreeSet<i32>,
    pub jubilee_marker: String,
    pub templates: LabelTemplates,
    /// Substituted for `{name}` when a record has no display name.
    pub unknown_name: String,
    pub calendar: CalendarSettings,
    pub batch_size: usize,
    pub attach_contact_links: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            window: YearWindow::default(),
            reminders: vec![
                // 09:00 on the previous day.
                ReminderSetting {
                    enabled: true,
                    minutes: -900,
                },
                ReminderSetting {
                    enabled: false,
                    minutes: 540,
                },
                ReminderSetting {
                    enabled: false,
                    minutes: -7 * 24 * 60 + 540,
                },
            ],
            excluded_sources: Vec::new(),
            jubilee_ages: DEFAULT_JUBILEE_AGES.iter().copied().collect(),
            jubilee_marker: "\u{2605} ".to_string(),
            templates: LabelTemplates::default(),
            unknown_name: "Unknown".to_string(),
            calendar: CalendarSettings::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            attach_contact_links: true,
        }
    }
}

impl SyncConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: SyncConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reminders.len() > MAX_REMINDER_SLOTS {
            return Err(ConfigError::Invalid(format!(
                "at most {MAX_REMINDER_SLOTS} reminder slots are supported, got {}",
                self.reminders.len()
            )));
        }
        let needed = 1 + self.enabled_reminder_offsets().len();
        if self.batch_size < needed {
            return Err(ConfigError::Invalid(format!(
                "batch_size {} cannot hold one event with {} reminders",
                self.batch_size,
                needed - 1
            )));
        }
        if self.calendar.account_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "calendar.account_name cannot be empty".to_string(),
            ));
        }
        if self.calendar.account_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "calendar.account_type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Offsets of enabled reminder slots, in slot order.
    ///
    /// A repeated offset is kept at its first slot only.
    pub fn enabled_reminder_offsets(&self) -> Vec<i32> {
        let mut offsets = Vec::with_capacity(self.reminders.len());
        for slot in self.reminders.iter().filter(|slot| slot.enabled) {
            if !offsets.contains(&slot.minutes) {
                offsets.push(slot.minutes);
            }
        }
        offsets
    }
}
