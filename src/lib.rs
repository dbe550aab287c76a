#![forbid(unsafe_code)]

//! Supervisor core for long-running game-server processes.
//!
//! Wraps each configured server binary in a supervised process whose stdio
//! is multiplexed into line channels. In-band commands — console lines and
//! in-game chat messages carrying the configured prefix — are extracted and
//! dispatched through a shared [`command::registry::CommandRegistry`].

pub mod command;
pub mod config;
pub mod errors;
pub mod stream;
pub mod supervisor;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
