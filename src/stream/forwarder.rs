//! Stream forwarder task.
//!
//! One forwarder runs per raw server stream (stdout, stderr). It drives a
//! [`FramedRead`] over the stream using [`LineCodec`] and pushes each
//! completed line onto its dedicated mpsc channel. The channel's bounded
//! capacity provides backpressure: a slow consumer eventually blocks the
//! forwarder on `send`.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::stream::codec::LineCodec;
use crate::{AppError, Result};

/// Forward complete lines from `stream` into `line_tx` until EOF,
/// cancellation, or a terminal read failure.
///
/// Lines are delivered in read order, trailing `\n` intact. The forwarder
/// never reads from its channel — it is the sole producer.
///
/// # Cancellation
///
/// Respects `cancel`: when the token fires the forwarder exits cleanly,
/// leaving any buffered fragment unread.
///
/// # Errors
///
/// Returns `AppError::Stream` on a non-EOF read failure. The error is
/// terminal for this forwarder only; the caller logs it and the stream's
/// forwarding stops silently from the supervised process's point of view.
pub async fn run_forwarder<R>(
    server_name: String,
    stream_label: &'static str,
    stream: R,
    read_buffer_bytes: usize,
    line_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::with_capacity(stream, LineCodec::new(), read_buffer_bytes);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(server = %server_name, stream = stream_label, "forwarder: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!(server = %server_name, stream = stream_label, "forwarder: EOF detected");
                        break;
                    }

                    Some(Err(err)) => {
                        return Err(AppError::Stream(format!(
                            "{stream_label} read failed: {err}"
                        )));
                    }

                    Some(Ok(line)) => {
                        if line_tx.send(line).await.is_err() {
                            debug!(server = %server_name, stream = stream_label, "forwarder: line channel closed, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
