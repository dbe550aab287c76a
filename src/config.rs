//! Global configuration parsing and validation.
//!
//! Configuration lives in a single TOML file: the command prefix, channel
//! sizing, and one `[servers.<name>]` table per supervised server binary.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

fn default_command_prefix() -> char {
    '!'
}

fn default_launcher() -> String {
    "java".into()
}

fn default_channel_capacity() -> usize {
    8
}

fn default_read_buffer_bytes() -> usize {
    1024
}

/// Launch settings for one supervised server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Path to the server archive handed to the launcher.
    pub exec_path: PathBuf,
    /// Space-delimited extra launch arguments (e.g. `-Xmx2G -Xms1G`).
    #[serde(default)]
    pub exec_options: String,
    /// Launcher binary the archive is handed to.
    #[serde(default = "default_launcher")]
    pub launcher: String,
    /// Whether overall shutdown tracking skips waiting on this server.
    #[serde(default)]
    pub keep_alive: bool,
}

impl ServerConfig {
    /// Argument vector for the launcher invocation:
    /// `<launch-args…> -jar <exec-path> --nogui`.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .exec_options
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        args.push("-jar".into());
        args.push(self.exec_path.to_string_lossy().into_owned());
        args.push("--nogui".into());
        args
    }

    /// Working directory for the server: the executable's containing
    /// directory, or the current directory when the path has no parent.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        self.exec_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Character marking a console line or chat message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,
    /// Capacity of the per-server line and command channels.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Size of the raw read buffer used by each stream forwarder.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,
    /// Supervised servers keyed by display name.
    pub servers: HashMap<String, ServerConfig>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            return Err(AppError::Config(
                "at least one [servers.<name>] table is required".into(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(AppError::Config(
                "channel_capacity must be greater than zero".into(),
            ));
        }

        if self.read_buffer_bytes == 0 {
            return Err(AppError::Config(
                "read_buffer_bytes must be greater than zero".into(),
            ));
        }

        for (name, server) in &self.servers {
            if server.launcher.is_empty() {
                return Err(AppError::Config(format!(
                    "server {name}: launcher must not be empty"
                )));
            }
            if server.exec_path.as_os_str().is_empty() {
                return Err(AppError::Config(format!(
                    "server {name}: exec_path must not be empty"
                )));
            }
        }

        Ok(())
    }
}
