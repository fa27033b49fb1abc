//! Contact-event record model.
//!
//! # Responsibility
//! - Describe one raw dated entry attached to an address-book contact.
//! - Derive the dedup key that recognizes one logical event reached through
//!   several upstream links.
//!
//! # Invariants
//! - `dedup_key` only depends on `(link_identity, category, custom_label)`.
//! - `custom_label` is meaningful only for `EventCategory::Custom`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Category of a contact date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Birthday,
    Anniversary,
    /// User-labeled date; carries `custom_label`.
    Custom,
    Other,
}

impl EventCategory {
    /// Stable lowercase name used in keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::Anniversary => "anniversary",
            Self::Custom => "custom",
            Self::Other => "other",
        }
    }
}

/// Upstream account that produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef {
    pub account_type: String,
    pub account_name: String,
}

impl SourceRef {
    pub fn new(account_type: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            account_type: account_type.into(),
            account_name: account_name.into(),
        }
    }
}

impl Display for SourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.account_type, self.account_name)
    }
}

/// Stable key for suppressing duplicate records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupKey(String);

impl DedupKey {
    /// Derives the key from the link identity, category and label.
    ///
    /// Label whitespace is trimmed so that the same label typed twice does not
    /// yield two calendar entries.
    pub fn derive(
        link_identity: &str,
        category: EventCategory,
        custom_label: Option<&str>,
    ) -> Self {
        let label = match category {
            EventCategory::Custom => custom_label.map(str::trim).unwrap_or_default(),
            _ => "",
        };
        Self(format!("{}|{}|{}", link_identity, category.as_str(), label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw input unit read from the contact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEventRecord {
    /// Opaque id of the contact-linking entity.
    pub source_identity: String,
    /// Identity of the aggregated contact this record is reached through.
    pub link_identity: String,
    pub display_name: Option<String>,
    pub dedup_key: DedupKey,
    pub raw_date: String,
    pub category: EventCategory,
    pub custom_label: Option<String>,
    /// `None` for locally owned data.
    pub origin_source: Option<SourceRef>,
    /// Group ids inside `origin_source` the contact is a member of.
    pub groups: Vec<String>,
    /// Deep link back to the originating contact.
    pub contact_link: Option<String>,
}

impl ContactEventRecord {
    /// Creates a record and derives its dedup key.
    ///
    /// A custom label passed for a non-custom category is dropped.
    pub fn new(
        source_identity: impl Into<String>,
        link_identity: impl Into<String>,
        category: EventCategory,
        raw_date: impl Into<String>,
    ) -> Self {
        let link_identity = link_identity.into();
        Self {
            source_identity: source_identity.into(),
            dedup_key: DedupKey::derive(&link_identity, category, None),
            link_identity,
            display_name: None,
            raw_date: raw_date.into(),
            category,
            custom_label: None,
            origin_source: None,
            groups: Vec::new(),
            contact_link: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the custom label and re-derives the dedup key.
    pub fn with_custom_label(mut self, label: impl Into<String>) -> Self {
        if self.category == EventCategory::Custom {
            self.custom_label = Some(label.into());
            self.dedup_key = DedupKey::derive(
                &self.link_identity,
                self.category,
                self.custom_label.as_deref(),
            );
        }
        self
    }

    pub fn with_origin_source(mut self, source: SourceRef) -> Self {
        self.origin_source = Some(source);
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contact_link(mut self, link: impl Into<String>) -> Self {
        self.contact_link = Some(link.into());
        self
    }

    /// Name used in diagnostics; never the raw contact payload.
    pub fn log_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("<unnamed>")
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactEventRecord, DedupKey, EventCategory};

    #[test]
    fn dedup_key_ignores_label_for_non_custom_categories() {
        let a = DedupKey::derive("lk-1", EventCategory::Birthday, Some("x"));
        let b = DedupKey::derive("lk-1", EventCategory::Birthday, None);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_label_changes_dedup_key() {
        let first = ContactEventRecord::new("raw-1", "lk-1", EventCategory::Custom, "2001-04-05")
            .with_custom_label("Name day");
        let second = ContactEventRecord::new("raw-2", "lk-1", EventCategory::Custom, "2001-04-05")
            .with_custom_label("Graduation");
        assert_ne!(first.dedup_key, second.dedup_key);
    }

    #[test]
    fn custom_label_is_ignored_for_birthdays() {
        let record = ContactEventRecord::new("raw-1", "lk-1", EventCategory::Birthday, "--04-05")
            .with_custom_label("ignored");
        assert!(record.custom_label.is_none());
    }
}
