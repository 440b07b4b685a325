//! Process-level lifecycle: signal handling and fatal termination.
//!
//! A signal or fatal error ends the process immediately. Work in flight is
//! not drained.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use scrapeline_core::error::AppError;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGINT or SIGTERM.
    Signal,
    /// Unrecoverable initialization or generator failure.
    Fatal,
}

impl Termination {
    pub fn exit_code(self) -> i32 {
        match self {
            Termination::Signal => 0,
            Termination::Fatal => 1,
        }
    }
}

/// SIGINT and SIGTERM handlers, installed when constructed.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Install the handlers. Must be called inside the runtime.
    pub fn register() -> Result<Self, AppError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let install = |kind: SignalKind| {
                signal(kind).map_err(|e| {
                    AppError::ConfigError(format!("Failed to install signal handler: {e}"))
                })
            };
            Ok(Self {
                interrupt: install(SignalKind::interrupt())?,
                terminate: install(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        Ok(Self {})
    }

    /// Resolve on the first SIGINT or SIGTERM (Ctrl-C on non-unix targets).
    pub async fn recv(&mut self) {
        #[cfg(unix)]
        tokio::select! {
            _ = self.interrupt.recv() => {}
            _ = self.terminate.recv() => {}
        }

        #[cfg(not(unix))]
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

/// Spawn the task that cancels `shutdown` and exits on the first signal.
pub fn spawn_signal_handler(
    mut signals: ShutdownSignals,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        signals.recv().await;
        tracing::info!("Bye !");
        shutdown.cancel();
        std::process::exit(Termination::Signal.exit_code());
    })
}

/// Log a fatal error and terminate with a non-zero status.
pub fn abort(error: &AppError) -> ! {
    tracing::error!(error = %error, "Fatal error, exiting");
    std::process::exit(Termination::Fatal.exit_code());
}
