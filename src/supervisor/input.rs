//! Local-input routing and the stdin writer task.
//!
//! Console lines arrive on the server's input channel. A line starting with
//! the command prefix is routed (prefix stripped) to the command channel;
//! anything else — the empty line included — is passed verbatim to the
//! stdin writer, which owns the child's stdin handle and appends the
//! newline.

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Local-input routing task.
///
/// Splits the input channel into command dispatches and raw console writes
/// based on the configured prefix character. A bare prefix routes an empty
/// command string, which the router drops for lack of a verb.
pub async fn run_input_router(
    server_name: String,
    command_prefix: char,
    mut input_rx: mpsc::Receiver<String>,
    cmd_tx: mpsc::Sender<String>,
    stdin_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        let line = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(server = %server_name, "input router: cancellation received, stopping");
                break;
            }

            maybe_line = input_rx.recv() => {
                let Some(line) = maybe_line else {
                    debug!(server = %server_name, "input router: input channel closed, stopping");
                    break;
                };
                line
            }
        };

        let delivered = if let Some(cmd) = line.strip_prefix(command_prefix) {
            cmd_tx.send(cmd.to_owned()).await.is_ok()
        } else {
            stdin_tx.send(line).await.is_ok()
        };

        if !delivered {
            debug!(server = %server_name, "input router: downstream channel closed, stopping");
            break;
        }
    }
}

/// Stdin writer task — owns the child's stdin.
///
/// Receives console lines from its channel and writes `line + "\n"`. The
/// channel preserves FIFO order per producer; the bounded capacity provides
/// backpressure when the server stops consuming its stdin. A write failure
/// (the process has gone away) stops only this writer.
pub async fn run_stdin_writer(
    server_name: String,
    mut stdin: ChildStdin,
    mut line_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(server = %server_name, "stdin writer: cancellation received, stopping");
                break;
            }

            maybe_line = line_rx.recv() => {
                let Some(line) = maybe_line else {
                    debug!(server = %server_name, "stdin writer: line channel closed, stopping");
                    break;
                };

                let mut bytes = line.into_bytes();
                bytes.push(b'\n');

                if let Err(err) = stdin.write_all(&bytes).await {
                    warn!(server = %server_name, %err, "stdin writer: write to server stdin failed, stopping");
                    break;
                }
            }
        }
    }
}
