//! Dependent-field deck builder and parameter-sweep runner for NJOY-style
//! processing codes.
//!
//! A deck is an ordered list of modules; each module is a list of card
//! groups whose shape depends on the values of its own fields. Decks
//! serialize to the engine's slash-terminated positional input. A sweep
//! expands variable bindings into jobs, runs each job in its own sandbox and
//! restores the deck afterwards.
//!
//! - **[`core`]**: Pure, deterministic logic (fields, rebuild, serialization,
//!   planning, snapshots). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, sandboxes, process
//!   execution). Isolated behind [`io::engine::Engine`] to enable scripted
//!   engines in tests.
//! - **[`modules`]**: Built-in module schemas.
//!
//! Orchestration modules ([`batch`], [`single`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod batch;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod modules;
pub mod single;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
