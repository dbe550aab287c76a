#![forbid(unsafe_code)]

//! `game-warden` — game-server process supervisor binary.
//!
//! Bootstraps configuration, builds the shared command registry, starts one
//! supervisor per configured server, and fans local console input out to
//! every server's input channel until all tracked servers finish or a
//! shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use game_warden::command::builtin;
use game_warden::config::GlobalConfig;
use game_warden::supervisor::lifecycle::WaitCounter;
use game_warden::supervisor::server::{self, ExitOutcome, ServerHandle, SupervisorOptions};
use game_warden::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "game-warden", about = "Game-server process supervisor", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("game-warden bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = GlobalConfig::load_from_path(&args.config)?;
    info!(
        servers = config.servers.len(),
        prefix = %config.command_prefix,
        "configuration loaded"
    );

    let registry = Arc::new(builtin::default_registry());
    let counter = WaitCounter::new();
    let options = SupervisorOptions {
        command_prefix: config.command_prefix,
        channel_capacity: config.channel_capacity,
        read_buffer_bytes: config.read_buffer_bytes,
    };

    // ── Start supervisors ───────────────────────────────
    let mut handles: Vec<ServerHandle> = Vec::with_capacity(config.servers.len());
    for (name, server_config) in &config.servers {
        match server::start(
            name,
            server_config,
            &options,
            Arc::clone(&registry),
            counter.clone(),
        ) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                // Launch failure is fatal for this server only.
                error!(server = %name, %err, "failed to start server");
            }
        }
    }

    if handles.is_empty() {
        return Err(AppError::Supervise("no server could be started".into()));
    }

    // ── Console fan-out ─────────────────────────────────
    let ct = CancellationToken::new();
    let console_handle = spawn_console_loop(&handles, ct.clone());

    // ── Wait for completion or shutdown signal ──────────
    tokio::select! {
        () = counter.wait_idle() => {
            info!("all tracked servers finished");
        }
        () = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }
    ct.cancel();

    // ── Orderly per-server teardown ─────────────────────
    for handle in handles {
        let name = handle.name().to_owned();
        match handle.shutdown().await {
            ExitOutcome::Exited { code } => {
                info!(server = %name, code = code.unwrap_or(-1), "server finished");
            }
            ExitOutcome::Killed => {
                info!(server = %name, "server stopped");
            }
            ExitOutcome::WaitFailed(msg) => {
                error!(server = %name, error = %msg, "server supervision failed");
            }
        }
    }

    let _ = console_handle.await;
    info!("game-warden shut down");

    Ok(())
}

/// Read local console lines and deliver each one to every server's input
/// channel. Stops on console EOF or cancellation.
fn spawn_console_loop(
    handles: &[ServerHandle],
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let inputs: Vec<(String, tokio::sync::mpsc::Sender<String>)> = handles
        .iter()
        .map(|handle| (handle.name().to_owned(), handle.input()))
        .collect();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!("console loop: cancellation received, stopping");
                    break;
                }

                next = lines.next_line() => match next {
                    Ok(Some(line)) => {
                        for (name, tx) in &inputs {
                            if tx.send(line.clone()).await.is_err() {
                                debug!(server = %name, "console loop: input channel closed");
                            }
                        }
                    }
                    Ok(None) => {
                        debug!("console loop: EOF on local stdin");
                        break;
                    }
                    Err(err) => {
                        warn!(%err, "console loop: read failed, stopping");
                        break;
                    }
                }
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
