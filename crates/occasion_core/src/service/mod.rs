//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate contact reading, occurrence building and reconciliation.
//! - Keep FFI and CLI layers decoupled from storage details.

pub mod sync_service;
