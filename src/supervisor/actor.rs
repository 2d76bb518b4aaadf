use crate::shutdown::ShutdownSignals;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// What the supervised tunnel client is currently doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelStatus {
    Starting,
    Running,
    Exited(i32),
    Failed,
}

pub enum ActorMessage {
    Reload,
    Status { rpc: oneshot::Sender<TunnelStatus> },
}

/// Start the tunnel client with its stdio piped to us.
pub fn launch(binary: &Path, args: &[String]) -> std::io::Result<Child> {
    Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}

// Tunnel client supervisor actor
pub struct Actor {
    shutdown: ShutdownSignals,
    receiver: mpsc::Receiver<ActorMessage>,
    binary: PathBuf,
    args: Vec<String>,
    status: TunnelStatus,
}

impl Actor {
    pub fn new(
        shutdown: ShutdownSignals,
        receiver: mpsc::Receiver<ActorMessage>,
        binary: PathBuf,
        args: Vec<String>,
    ) -> Self {
        Self {
            shutdown,
            receiver,
            binary,
            args,
            status: TunnelStatus::Starting,
        }
    }

    async fn handle_message(&mut self, msg: ActorMessage, stdin: &mut Option<ChildStdin>) {
        match msg {
            ActorMessage::Reload => match stdin {
                Some(stdin) => {
                    info!("Asking the tunnel client to reload");
                    if let Err(err) = stdin.write_all(b"reload\n").await {
                        error!("Failed to signal tunnel client: {err}");
                        return;
                    }
                    if let Err(err) = stdin.flush().await {
                        error!("Failed to signal tunnel client: {err}");
                    }
                }
                None => warn!("Tunnel client has no stdin, dropping reload signal"),
            },
            ActorMessage::Status { rpc } => {
                _ = rpc.send(self.status.clone());
            }
        }
    }

    pub async fn run(&mut self) {
        info!("Tunnel supervisor task is running");

        let mut child = match launch(&self.binary, &self.args) {
            Ok(child) => child,
            Err(err) => {
                error!(
                    "Failed to launch tunnel client {}: {err}",
                    self.binary.display()
                );
                self.status = TunnelStatus::Failed;
                self.idle().await;
                return;
            }
        };

        self.status = TunnelStatus::Running;
        info!("Tunnel client started: {}", self.binary.display());

        forward_lines(child.stdout.take());
        forward_lines(child.stderr.take());

        let mut stdin = child.stdin.take();

        loop {
            tokio::select! {
                Some(msg) = self.receiver.recv() => {
                    self.handle_message(msg, &mut stdin).await;
                }
                status = child.wait() => {
                    let code = status.ok().and_then(|s| s.code()).unwrap_or(-1);
                    info!("[tunnel] client exited with code {code}");
                    self.status = TunnelStatus::Exited(code);
                    break;
                }
                _ = self.shutdown.token.cancelled() => {
                    info!("Tunnel supervisor shutting down");
                    return;
                }
            }
        }

        // no restart on exit; the trigger endpoint keeps working and
        // reload signals are dropped until the daemon is restarted
        self.idle().await;
    }

    async fn idle(&mut self) {
        loop {
            tokio::select! {
                Some(msg) = self.receiver.recv() => {
                    match msg {
                        ActorMessage::Reload => {
                            warn!("Tunnel client is not running, dropping reload signal");
                        }
                        ActorMessage::Status { rpc } => {
                            _ = rpc.send(self.status.clone());
                        }
                    }
                }
                _ = self.shutdown.token.cancelled() => {
                    break;
                }
            }
        }

        info!("Tunnel supervisor shutting down");
    }
}

fn forward_lines(stream: Option<impl AsyncRead + Unpin + Send + 'static>) {
    tokio::spawn(async move {
        if let Some(stream) = stream {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("[tunnel] {line}");
            }
        }
    });
}
