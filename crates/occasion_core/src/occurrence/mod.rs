//! Occurrence synthesis.
//!
//! # Responsibility
//! - Expand parsed dates into yearly skeletons.
//! - Render titles and attach reminders to build the desired event set.
//!
//! # Invariants
//! - Output order is record order, then ascending year.

pub mod builder;
pub mod expander;
pub mod title;
