//! Deterministic, pure configuration model.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! decks and value snapshots and return deterministic outputs suitable for
//! tests.

pub mod condition;
pub mod deck;
pub mod document;
pub mod error;
pub mod field;
pub mod group;
pub mod module;
pub mod plan;
pub mod registry;
pub mod rule;
pub mod snapshot;
pub mod target;
pub mod values;
