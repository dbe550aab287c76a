//! Command dispatch loop.
//!
//! A single router task per server consumes command strings from the
//! command channel — console input with the prefix stripped and chat
//! commands extracted by the classifier — and dispatches them strictly
//! sequentially, FIFO. A slow handler therefore blocks subsequent commands
//! for that server; handlers are expected to be fast or to delegate.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::command::registry::CommandRegistry;
use crate::supervisor::server::ServerContext;

/// Split a command string into its verb and argument list.
///
/// Tokens are whitespace-delimited. Returns `None` when the string holds no
/// tokens at all (empty or whitespace-only — e.g. prefix-only input), which
/// dispatches nothing. When a verb has no arguments the list is a single
/// empty-string placeholder.
#[must_use]
pub fn parse_invocation(line: &str) -> Option<(&str, Vec<String>)> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next()?;

    let args: Vec<String> = tokens.map(str::to_owned).collect();
    if args.is_empty() {
        return Some((verb, vec![String::new()]));
    }
    Some((verb, args))
}

/// Command router task — dispatches command strings to registered handlers.
///
/// An unknown verb is not an error: the command is dropped without feedback
/// (logged at `debug` only). Handler outcomes are likewise not interpreted
/// by the core; a returned error is logged at `debug` and dispatch
/// continues.
pub async fn run_router(
    ctx: Arc<ServerContext>,
    registry: Arc<CommandRegistry>,
    mut cmd_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        let line = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(server = %ctx.name(), "router: cancellation received, stopping");
                break;
            }

            maybe_line = cmd_rx.recv() => {
                let Some(line) = maybe_line else {
                    debug!(server = %ctx.name(), "router: command channel closed, stopping");
                    break;
                };
                line
            }
        };

        let Some((verb, args)) = parse_invocation(&line) else {
            continue;
        };

        let Some(handler) = registry.get(verb) else {
            debug!(server = %ctx.name(), verb, "router: unknown command verb, ignoring");
            continue;
        };

        if let Err(err) = handler(Arc::clone(&ctx), args).await {
            debug!(server = %ctx.name(), verb, %err, "router: command handler returned error");
        }
    }
}
