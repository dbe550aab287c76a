//! Command extraction and dispatch.
//!
//! Covers the shared verb-to-handler registry, the per-server dispatch
//! loop, and the built-in command handlers.

pub mod builtin;
pub mod registry;
pub mod router;
