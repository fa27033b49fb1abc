//! Flutter-facing bindings for the occasion sync engine.

pub mod api;
