use crate::registry::AppEntry;
use crate::shutdown::ShutdownSignals;
use tokio::sync::mpsc;
use tracing::{error, info};

mod run;

pub use run::{Completed, RunError, execute};

// Pipeline runner actor. Triggers are enqueued here and each one runs
// in its own task, so overlapping triggers interleave freely.
struct Runner {
    shutdown: ShutdownSignals,
    receiver: mpsc::Receiver<RunnerMessage>,
}

enum RunnerMessage {
    Run { app: AppEntry },
}

impl Runner {
    fn new(shutdown: ShutdownSignals, receiver: mpsc::Receiver<RunnerMessage>) -> Self {
        Self { shutdown, receiver }
    }

    fn handle_message(&mut self, msg: RunnerMessage) {
        match msg {
            RunnerMessage::Run { app } => {
                info!("[{}] pipeline queued, {} commands", app.name, app.commands.len());

                tokio::spawn(async move {
                    match run::execute(&app).await {
                        Ok(done) => {
                            info!(
                                "[{}] pipeline completed, {} commands run",
                                app.name, done.commands_run
                            );
                        }
                        Err(err) => {
                            error!("[{}] pipeline failed: {}", app.name, err);
                        }
                    }
                });
            }
        }
    }

    async fn run(&mut self) {
        info!("Pipeline runner task is running");

        loop {
            tokio::select! {
                Some(msg) = self.receiver.recv() => {
                    self.handle_message(msg);
                }
                _ = self.shutdown.token.cancelled() => {
                    break;
                }
            }
        }

        info!("Pipeline runner shutting down");
    }
}

#[derive(Clone)]
pub struct PipelineHandle {
    sender: mpsc::Sender<RunnerMessage>,
}

impl PipelineHandle {
    pub fn new(shutdown: ShutdownSignals) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let mut actor = Runner::new(shutdown, receiver);
        tokio::spawn(async move { actor.run().await });

        Self { sender }
    }

    /// Enqueue one run of the app's pipeline and return immediately.
    /// Completion and failure are observed in the log, not here.
    pub async fn dispatch(&self, app: AppEntry) {
        _ = self.sender.send(RunnerMessage::Run { app }).await;
    }
}
