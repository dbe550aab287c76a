//! Per-server lifecycle wiring.
//!
//! [`start`] takes a spawned process from `Starting` to `Online`: it wires
//! the stdio pipes to their forwarder tasks, starts the classifier, stderr
//! logger, command router, input router, and stdin writer, and installs the
//! exit watcher that drives the `Online → Offline` transition. The output
//! pipeline listens on the server's root cancellation token while the
//! input side runs on a child token, so [`ServerHandle::wait`] can drain
//! the pipeline after a natural exit and [`ServerHandle::shutdown`] can
//! still tear the whole set down at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::command::registry::CommandRegistry;
use crate::command::router;
use crate::config::ServerConfig;
use crate::stream::forwarder::run_forwarder;
use crate::supervisor::classifier::{run_classifier, run_stderr_logger, Classifier};
use crate::supervisor::input::{run_input_router, run_stdin_writer};
use crate::supervisor::launcher::spawn_server;
use crate::supervisor::lifecycle::WaitCounter;
use crate::{AppError, Result};

/// Supervisor tuning shared by all servers, taken from the global config.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Character marking a line as a command.
    pub command_prefix: char,
    /// Capacity of the line and command channels.
    pub channel_capacity: usize,
    /// Raw read buffer size for the stream forwarders.
    pub read_buffer_bytes: usize,
}

/// How a supervised process left the `Online` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The process exited on its own; `code` is `None` when it was
    /// terminated by a signal.
    Exited {
        /// OS exit code, when one was reported.
        code: Option<i32>,
    },
    /// The supervisor cancelled the server and killed the process.
    Killed,
    /// Waiting on the process failed — an abnormal, hard failure for this
    /// server's supervision (siblings are unaffected).
    WaitFailed(String),
}

/// The capability surface handed to command handlers: the supervised
/// process as seen from the outside.
#[derive(Debug)]
pub struct ServerContext {
    name: String,
    online: AtomicBool,
    stdin_tx: mpsc::Sender<String>,
}

impl ServerContext {
    /// Build a detached context around a stdin-channel sender. The flag
    /// starts offline; [`start`] flips it once the process is running.
    #[must_use]
    pub fn new(name: &str, stdin_tx: mpsc::Sender<String>) -> Self {
        Self {
            name: name.to_owned(),
            online: AtomicBool::new(false),
            stdin_tx,
        }
    }

    /// Display name of the server.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the process is believed to be running.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    /// Queue a line for the server's stdin. The stdin writer appends the
    /// newline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Supervise` when the stdin writer has stopped.
    pub async fn send_raw(&self, line: &str) -> Result<()> {
        self.stdin_tx.send(line.to_owned()).await.map_err(|_| {
            AppError::Supervise(format!("server {}: stdin channel closed", self.name))
        })
    }
}

/// Handle to one online supervised server.
///
/// The task set is split along the drain order a natural exit requires:
/// the output pipeline (forwarders, classifier, stderr logger) runs to
/// completion off pipe EOF and channel closure, the input side stops on
/// its own child token, and the command router stops once the last
/// command sender is gone.
#[derive(Debug)]
pub struct ServerHandle {
    ctx: Arc<ServerContext>,
    keep_alive: bool,
    input_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
    input_cancel: CancellationToken,
    pipeline_tasks: Vec<JoinHandle<()>>,
    input_tasks: Vec<JoinHandle<()>>,
    router_task: JoinHandle<()>,
    exit: JoinHandle<ExitOutcome>,
}

impl ServerHandle {
    /// Display name of the server.
    #[must_use]
    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    /// Whether the process is believed to be running.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.ctx.is_online()
    }

    /// Whether overall shutdown tracking skips this server.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Shared context, as handed to command handlers.
    #[must_use]
    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.ctx)
    }

    /// Sender side of the server's local-input channel, for console fan-out.
    #[must_use]
    pub fn input(&self) -> mpsc::Sender<String> {
        self.input_tx.clone()
    }

    /// Deliver one local console line to the server's input channel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Supervise` when the input router has stopped.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        self.input_tx.send(line.to_owned()).await.map_err(|_| {
            AppError::Supervise(format!("server {}: input channel closed", self.name()))
        })
    }

    /// Wait for the process to exit, then drain and join the task set.
    ///
    /// On a natural exit nothing is cancelled until the output pipeline has
    /// run dry: the forwarders end at pipe EOF, the classifier and stderr
    /// logger end when their line channels close behind them, and the
    /// command router dispatches every queued command before its channel
    /// closes. Output read before the process died is never dropped.
    pub async fn wait(mut self) -> ExitOutcome {
        let outcome = match (&mut self.exit).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(server = %self.ctx.name(), %err, "exit watcher task failed");
                ExitOutcome::WaitFailed(format!("exit watcher task failed: {err}"))
            }
        };

        // Output pipeline first: the forwarders stop at EOF and drop their
        // senders, which lets the classifier and stderr logger run dry.
        for task in self.pipeline_tasks.drain(..) {
            join_task(self.ctx.name(), task).await;
        }

        // Input side next; stopping the input router drops the last
        // command sender.
        self.input_cancel.cancel();
        for task in self.input_tasks.drain(..) {
            join_task(self.ctx.name(), task).await;
        }

        // The router drains what is queued, then stops on channel close.
        join_task(self.ctx.name(), self.router_task).await;

        outcome
    }

    /// Stop the server: cancel every task, kill the process if it is still
    /// running, and join the task set.
    pub async fn shutdown(self) -> ExitOutcome {
        self.cancel.cancel();
        self.wait().await
    }
}

/// Start one supervised server: spawn the process and wire its task set.
///
/// On success the server is `Online`; when `keep_alive` is false the shared
/// [`WaitCounter`] has been incremented and will be decremented by the exit
/// watcher.
///
/// # Errors
///
/// Returns `AppError::Config` if the classifier patterns fail to compile,
/// or `AppError::Launch` if the process cannot be started.
pub fn start(
    name: &str,
    config: &ServerConfig,
    options: &SupervisorOptions,
    registry: Arc<CommandRegistry>,
    counter: WaitCounter,
) -> Result<ServerHandle> {
    let classifier = Classifier::new(name, options.command_prefix)?;
    let spawned = spawn_server(name, config)?;

    let capacity = options.channel_capacity;
    let (out_tx, out_rx) = mpsc::channel::<String>(capacity);
    let (err_tx, err_rx) = mpsc::channel::<String>(capacity);
    let (cmd_tx, cmd_rx) = mpsc::channel::<String>(capacity);
    let (input_tx, input_rx) = mpsc::channel::<String>(capacity);
    let (stdin_tx, stdin_rx) = mpsc::channel::<String>(capacity);

    let ctx = Arc::new(ServerContext::new(name, stdin_tx));
    ctx.set_online(true);

    if !config.keep_alive {
        counter.increment();
    }

    let cancel = CancellationToken::new();
    let input_cancel = cancel.child_token();
    let mut pipeline_tasks = Vec::with_capacity(4);
    let mut input_tasks = Vec::with_capacity(2);

    // Stream forwarders: stdout and stderr.
    {
        let server = name.to_owned();
        let token = cancel.clone();
        let buffer = options.read_buffer_bytes;
        let stdout = spawned.stdout;
        pipeline_tasks.push(tokio::spawn(async move {
            let label = "stdout";
            if let Err(err) =
                run_forwarder(server.clone(), label, stdout, buffer, out_tx, token).await
            {
                warn!(server = %server, stream = label, %err, "stream forwarder terminated");
            }
        }));
    }
    {
        let server = name.to_owned();
        let token = cancel.clone();
        let buffer = options.read_buffer_bytes;
        let stderr = spawned.stderr;
        pipeline_tasks.push(tokio::spawn(async move {
            let label = "stderr";
            if let Err(err) =
                run_forwarder(server.clone(), label, stderr, buffer, err_tx, token).await
            {
                warn!(server = %server, stream = label, %err, "stream forwarder terminated");
            }
        }));
    }

    // Output classifier and stderr logger.
    pipeline_tasks.push(tokio::spawn(run_classifier(
        classifier,
        out_rx,
        cmd_tx.clone(),
        cancel.clone(),
    )));
    pipeline_tasks.push(tokio::spawn(run_stderr_logger(
        name.to_owned(),
        err_rx,
        cancel.clone(),
    )));

    // Command router; stops on cancellation or once both command senders
    // (classifier and input router) are gone.
    let router_task = tokio::spawn(router::run_router(
        Arc::clone(&ctx),
        registry,
        cmd_rx,
        cancel.clone(),
    ));

    // Input side runs on the child token so a draining `wait` can stop it
    // without touching the output pipeline.
    input_tasks.push(tokio::spawn(run_input_router(
        name.to_owned(),
        options.command_prefix,
        input_rx,
        cmd_tx,
        ctx.stdin_tx.clone(),
        input_cancel.clone(),
    )));
    input_tasks.push(tokio::spawn(run_stdin_writer(
        name.to_owned(),
        spawned.stdin,
        stdin_rx,
        input_cancel.clone(),
    )));

    // Exit watcher drives Online → Offline.
    let exit = spawn_exit_watcher(
        Arc::clone(&ctx),
        spawned.child,
        config.keep_alive,
        counter,
        cancel.clone(),
    );

    info!(server = name, keep_alive = config.keep_alive, "server online");

    Ok(ServerHandle {
        ctx,
        keep_alive: config.keep_alive,
        input_tx,
        cancel,
        input_cancel,
        pipeline_tasks,
        input_tasks,
        router_task,
        exit,
    })
}

async fn join_task(server: &str, task: JoinHandle<()>) {
    if let Err(err) = task.await {
        warn!(server = %server, %err, "supervision task failed during join");
    }
}

/// Classify the result of waiting on the server process.
///
/// A reported status is a normal exit; `code` is `None` when the process
/// was terminated by a signal. An errored wait is the distinguishable
/// abnormal outcome [`ExitOutcome::WaitFailed`].
#[must_use]
pub fn classify_wait(result: std::io::Result<std::process::ExitStatus>) -> ExitOutcome {
    match result {
        Ok(status) => ExitOutcome::Exited {
            code: status.code(),
        },
        Err(err) => ExitOutcome::WaitFailed(format!("process wait failed: {err}")),
    }
}

/// Spawn the task that blocks on process termination.
///
/// A fired cancellation token kills the child before reporting
/// [`ExitOutcome::Killed`]. In every outcome the online flag flips false
/// and the counter is decremented for non-keep-alive servers.
fn spawn_exit_watcher(
    ctx: Arc<ServerContext>,
    mut child: tokio::process::Child,
    keep_alive: bool,
    counter: WaitCounter,
    cancel: CancellationToken,
) -> JoinHandle<ExitOutcome> {
    tokio::spawn(async move {
        let outcome = tokio::select! {
            result = child.wait() => classify_wait(result),

            () = cancel.cancelled() => {
                if let Err(err) = child.kill().await {
                    warn!(server = %ctx.name(), %err, "failed to kill server process");
                }
                ExitOutcome::Killed
            }
        };

        ctx.set_online(false);
        if !keep_alive {
            counter.decrement();
        }

        match &outcome {
            ExitOutcome::Exited { code } => {
                info!(server = %ctx.name(), code = code.unwrap_or(-1), "server process exited");
            }
            ExitOutcome::Killed => {
                info!(server = %ctx.name(), "server process killed by supervisor");
            }
            ExitOutcome::WaitFailed(msg) => {
                error!(server = %ctx.name(), error = %msg, "server supervision failed");
            }
        }

        outcome
    })
}
