//! Output classifier for server stdout lines.
//!
//! For each line drawn from the stdout channel the classifier strips the
//! trailing line terminator, detects in-game chat (forwarding prefixed chat
//! text to the command channel), rewrites the server's own bracketed
//! thread/level tag to carry the supervised server's name, and emits the
//! result to the log.

use regex::Regex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{AppError, Result};

/// Pattern for an in-game chat report on stdout, e.g.
/// `[12:34:56] [Server thread/INFO]: <Alice> hello`. Captures the speaker
/// and the message text.
const CHAT_PATTERN: &str = r"\]: <([^<>]+)> (.*)$";

/// Pattern for the server's bracketed thread/level tag, e.g.
/// `[Server thread/INFO]`. The first field is replaced by the supervised
/// server's name; the second (the level) is kept.
const TAG_PATTERN: &str = r"\[([^/\[\]]+)/([^\[\]]+)\]";

/// Classifier for one server's stdout lines.
#[derive(Debug)]
pub struct Classifier {
    server_name: String,
    command_prefix: char,
    chat_re: Regex,
    tag_re: Regex,
}

impl Classifier {
    /// Build a classifier for the named server.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if either pattern fails to compile.
    pub fn new(server_name: &str, command_prefix: char) -> Result<Self> {
        let chat_re = Regex::new(CHAT_PATTERN)
            .map_err(|err| AppError::Config(format!("chat pattern: {err}")))?;
        let tag_re = Regex::new(TAG_PATTERN)
            .map_err(|err| AppError::Config(format!("tag pattern: {err}")))?;

        Ok(Self {
            server_name: server_name.to_owned(),
            command_prefix,
            chat_re,
            tag_re,
        })
    }

    /// Strip exactly one trailing line terminator: `\r\n`, `\n`, or `\r`.
    #[must_use]
    pub fn trim_line_ending(line: &str) -> &str {
        line.strip_suffix("\r\n")
            .or_else(|| line.strip_suffix('\n'))
            .or_else(|| line.strip_suffix('\r'))
            .unwrap_or(line)
    }

    /// Match the player-chat pattern, yielding `(speaker, message text)`.
    #[must_use]
    pub fn chat_message<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.chat_re.captures(line)?;
        let speaker = caps.get(1)?.as_str();
        let text = caps.get(2)?.as_str();
        Some((speaker, text))
    }

    /// Extract the command text from a message starting with the prefix.
    ///
    /// An empty message is never a command, so the prefix test tolerates
    /// empty chat text; a bare prefix yields an empty command string, which
    /// the router drops for lack of a verb.
    #[must_use]
    pub fn command_text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.command_prefix)
    }

    /// Rewrite every bracketed thread/level tag in `line` to
    /// `[<server-name>/<level>]`.
    #[must_use]
    pub fn rewrite_tag(&self, line: &str) -> String {
        self.tag_re
            .replace_all(line, |caps: &regex::Captures<'_>| {
                format!("[{}/{}]", self.server_name, &caps[2])
            })
            .into_owned()
    }

    /// Name of the server this classifier serves.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

/// Classifier task — consumes the stdout line channel.
///
/// Chat lines are logged as `speaker: text`; chat text carrying the command
/// prefix is forwarded (prefix stripped) to the command channel. Every line
/// is then tag-rewritten and emitted to the log.
pub async fn run_classifier(
    classifier: Classifier,
    mut out_rx: mpsc::Receiver<String>,
    cmd_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        let raw = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(server = %classifier.server_name, "classifier: cancellation received, stopping");
                break;
            }

            maybe_line = out_rx.recv() => {
                let Some(line) = maybe_line else {
                    debug!(server = %classifier.server_name, "classifier: stdout channel closed, stopping");
                    break;
                };
                line
            }
        };

        let line = Classifier::trim_line_ending(&raw);

        if let Some((speaker, text)) = classifier.chat_message(line) {
            info!("{speaker}: {text}");

            if let Some(cmd) = classifier.command_text(text) {
                if cmd_tx.send(cmd.to_owned()).await.is_err() {
                    debug!(server = %classifier.server_name, "classifier: command channel closed, stopping");
                    break;
                }
            }
        }

        info!("{}", classifier.rewrite_tag(line));
    }
}

/// Stderr-logging task — consumes the stderr line channel and emits each
/// line, terminator stripped, at `warn`.
pub async fn run_stderr_logger(
    server_name: String,
    mut err_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(server = %server_name, "stderr logger: cancellation received, stopping");
                break;
            }

            maybe_line = err_rx.recv() => {
                let Some(line) = maybe_line else {
                    debug!(server = %server_name, "stderr logger: stderr channel closed, stopping");
                    break;
                };
                tracing::warn!(server = %server_name, "{}", Classifier::trim_line_ending(&line));
            }
        }
    }
}
