//! Domain model for contact dates and their calendar projections.
//!
//! # Responsibility
//! - Define the raw contact-event record read from the contact store.
//! - Define parsed dates and the yearly occurrences built from them.
//!
//! # Invariants
//! - `ParsedDate::has_explicit_year == false` iff the sentinel year is used.
//! - Occurrences are ephemeral and rebuilt on every sync.

pub mod occurrence;
pub mod record;
