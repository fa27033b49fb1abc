//! Contact store seam.
//!
//! # Responsibility
//! - Define the read-only contract for the external contact store.
//! - Filter excluded sources and collapse duplicate records.
//!
//! # Invariants
//! - Records are read fresh on every sync; nothing is cached here.

pub mod filter;
pub mod memory;

use crate::model::record::ContactEventRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ContactResult<T> = Result<T, ContactSourceError>;

/// Contact store failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactSourceError {
    /// Read permission has not been granted.
    AccessDenied(String),
    /// Store cannot be reached right now.
    Unavailable(String),
    /// Store returned something that is not a record.
    InvalidData(String),
}

impl Display for ContactSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied(reason) => write!(f, "contact access denied: {reason}"),
            Self::Unavailable(reason) => write!(f, "contact store unavailable: {reason}"),
            Self::InvalidData(message) => write!(f, "invalid contact data: {message}"),
        }
    }
}

impl Error for ContactSourceError {}

/// Read-only access to contact-event records.
pub trait ContactSource {
    /// Fails when records cannot be read at all.
    fn check_access(&self) -> ContactResult<()>;
    /// Returns every dated record, including source and group metadata.
    fn read_records(&self) -> ContactResult<Vec<ContactEventRecord>>;
}
