//! In-memory contact source.
//!
//! Used when the host application reads contacts itself and hands the
//! records over, e.g. as JSON through the FFI or CLI.

use crate::contacts::{ContactResult, ContactSource, ContactSourceError};
use crate::model::record::{ContactEventRecord, DedupKey, EventCategory, SourceRef};
use serde::Deserialize;

/// Wire shape of one record handed over by the host.
///
/// `dedup_key` is derived when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRecordInput {
    pub source_identity: String,
    pub link_identity: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub dedup_key: Option<DedupKey>,
    pub raw_date: String,
    pub category: EventCategory,
    #[serde(default)]
    pub custom_label: Option<String>,
    #[serde(default)]
    pub origin_source: Option<SourceRef>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub contact_link: Option<String>,
}

impl From<ContactRecordInput> for ContactEventRecord {
    fn from(value: ContactRecordInput) -> Self {
        let mut record = ContactEventRecord::new(
            value.source_identity,
            value.link_identity,
            value.category,
            value.raw_date,
        )
        .with_groups(value.groups);
        record.display_name = value.display_name;
        record.origin_source = value.origin_source;
        record.contact_link = value.contact_link;
        if let Some(label) = value.custom_label {
            record = record.with_custom_label(label);
        }
        if let Some(key) = value.dedup_key {
            record.dedup_key = key;
        }
        record
    }
}

/// Contact source backed by a record vector.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContactSource {
    records: Vec<ContactEventRecord>,
    denied: Option<String>,
}

impl InMemoryContactSource {
    pub fn new(records: Vec<ContactEventRecord>) -> Self {
        Self {
            records,
            denied: None,
        }
    }

    /// Parses a JSON array of `ContactRecordInput`.
    pub fn from_json_str(content: &str) -> ContactResult<Self> {
        let inputs: Vec<ContactRecordInput> = serde_json::from_str(content)
            .map_err(|err| ContactSourceError::InvalidData(err.to_string()))?;
        Ok(Self::new(inputs.into_iter().map(Into::into).collect()))
    }

    /// Simulates a store whose read permission was revoked.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            denied: Some(reason.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ContactSource for InMemoryContactSource {
    fn check_access(&self) -> ContactResult<()> {
        match &self.denied {
            Some(reason) => Err(ContactSourceError::AccessDenied(reason.clone())),
            None => Ok(()),
        }
    }

    fn read_records(&self) -> ContactResult<Vec<ContactEventRecord>> {
        self.check_access()?;
        Ok(self.records.clone())
    }
}
