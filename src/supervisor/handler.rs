use super::actor::{Actor, ActorMessage, TunnelStatus};
use crate::config::TunnelConfig;
use crate::shutdown::ShutdownSignals;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

#[derive(Clone)]
pub struct Handler {
    sender: mpsc::Sender<ActorMessage>,
}

impl Handler {
    pub fn new(shutdown: ShutdownSignals, tunnel: &TunnelConfig) -> Self {
        Self::with_command(shutdown, tunnel.binary.clone(), tunnel.args())
    }

    /// Supervise an arbitrary command. The daemon always goes through
    /// `new`; tests supervise something small instead.
    pub fn with_command(shutdown: ShutdownSignals, binary: PathBuf, args: Vec<String>) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let mut actor = Actor::new(shutdown, receiver, binary, args);
        tokio::spawn(async move { actor.run().await });

        Self { sender }
    }

    /// One way signal: ask the running client to reload its tunnels.
    pub async fn reload(&self) {
        _ = self.sender.send(ActorMessage::Reload).await;
    }

    pub async fn status(&self) -> TunnelStatus {
        let (rpc, receiver) = oneshot::channel();
        _ = self.sender.send(ActorMessage::Status { rpc }).await;
        receiver.await.unwrap_or(TunnelStatus::Failed)
    }
}
