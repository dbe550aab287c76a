//! Process supervision.
//!
//! Covers launching the server process, classifying its stdout, routing
//! local input, tracking the shared shutdown counter, and the per-server
//! lifecycle wiring.

pub mod classifier;
pub mod input;
pub mod launcher;
pub mod lifecycle;
pub mod server;
