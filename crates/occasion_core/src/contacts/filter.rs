//! Source exclusion and duplicate collapsing.
//!
//! # Responsibility
//! - Drop records coming from excluded accounts or excluded groups.
//! - Keep exactly one record per dedup key.
//!
//! # Invariants
//! - Records without an origin source are never excluded.
//! - Group-scoped exclusion drops a record only when it belongs to at least
//!   one group and every one of its groups is excluded.
//! - First seen wins; survivor order follows input order.

use crate::config::ExcludedSource;
use crate::model::record::{ContactEventRecord, SourceRef};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Survivors plus counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub records: Vec<ContactEventRecord>,
    pub excluded: usize,
    pub duplicates: usize,
}

#[derive(Debug, Default)]
struct Exclusion<'a> {
    whole: bool,
    groups: BTreeSet<&'a str>,
}

/// Filters excluded sources, then collapses records sharing a dedup key.
pub fn filter_and_dedup(
    records: Vec<ContactEventRecord>,
    excluded: &[ExcludedSource],
) -> FilterOutcome {
    let exclusions = index_exclusions(excluded);
    let mut seen = HashSet::new();
    let mut outcome = FilterOutcome::default();

    for record in records {
        if is_excluded(&record, &exclusions) {
            outcome.excluded += 1;
            continue;
        }
        if !seen.insert(record.dedup_key.clone()) {
            outcome.duplicates += 1;
            continue;
        }
        outcome.records.push(record);
    }

    outcome
}

fn index_exclusions(excluded: &[ExcludedSource]) -> HashMap<&SourceRef, Exclusion<'_>> {
    let mut index: HashMap<&SourceRef, Exclusion<'_>> = HashMap::new();
    for entry in excluded {
        let exclusion = index.entry(&entry.source).or_default();
        match &entry.groups {
            None => exclusion.whole = true,
            Some(groups) => exclusion.groups.extend(groups.iter().map(String::as_str)),
        }
    }
    index
}

fn is_excluded(
    record: &ContactEventRecord,
    exclusions: &HashMap<&SourceRef, Exclusion<'_>>,
) -> bool {
    let Some(source) = &record.origin_source else {
        return false;
    };
    let Some(exclusion) = exclusions.get(source) else {
        return false;
    };
    if exclusion.whole {
        return true;
    }
    !record.groups.is_empty()
        && record
            .groups
            .iter()
            .all(|group| exclusion.groups.contains(group.as_str()))
}
