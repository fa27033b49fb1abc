//! Date-string parsing.
//!
//! # Responsibility
//! - Turn free-form contact date strings into `ParsedDate` values.
//!
//! # Invariants
//! - Formats are tried in a fixed order; the first match wins.

pub mod date_parser;
