//! Line-oriented stream handling.
//!
//! Covers reassembly of raw byte reads into complete lines and the
//! per-stream forwarder tasks feeding the line channels.

pub mod codec;
pub mod forwarder;
