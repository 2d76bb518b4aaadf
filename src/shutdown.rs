use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handed to every long running task. The token says "stop now"; the
/// guard sender is held until the task is actually gone, which is what
/// `ShutdownHandler::wait` blocks on.
#[derive(Clone)]
pub struct ShutdownSignals {
    pub token: CancellationToken,
    pub _guard: mpsc::Sender<()>,
}

pub struct ShutdownHandler {
    signals: ShutdownSignals,
    all_guards_dropped: mpsc::Receiver<()>,
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandler {
    pub fn new() -> Self {
        let (guard, all_guards_dropped) = mpsc::channel(1);
        Self {
            signals: ShutdownSignals {
                token: CancellationToken::new(),
                _guard: guard,
            },
            all_guards_dropped,
        }
    }

    pub fn signals(&self) -> ShutdownSignals {
        self.signals.clone()
    }

    /// Block until SIGINT, SIGTERM or some task cancels the token, then
    /// wait for every holder of a `ShutdownSignals` to drop theirs.
    pub async fn wait(mut self) {
        // SIGINT is ctrl+c, SIGTERM is how systemd stops us
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("error: failed to install SIGINT handler");
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("error: failed to install SIGTERM handler");

        select! {
            _ = self.signals.token.cancelled() => {
                info!("Shutdown requested by a task");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
                self.signals.token.cancel();
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                self.signals.token.cancel();
            }
        }

        drop(self.signals);
        self.all_guards_dropped.recv().await;
    }
}
