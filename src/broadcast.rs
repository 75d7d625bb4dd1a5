//! Broadcaster actor
//!
//! The single fan-out point for public lines. Handles snapshot the registry
//! when a broadcast is issued and queue the line with its recipients; the
//! dispatcher task then posts it into every recipient's mailbox. Because
//! all broadcasts pass through one queue, every recipient sees them in the
//! same order the dispatcher took them.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::registry::Registry;
use crate::session::UserSession;

/// Capacity of the dispatcher's command queue
pub const BROADCAST_BUFFER_SIZE: usize = 256;

/// Commands sent from broadcast handles to the dispatcher
#[derive(Debug)]
pub enum BroadcastCommand {
    /// Deliver a formatted line to the sessions online when it was issued
    Deliver {
        line: String,
        recipients: Vec<Arc<UserSession>>,
    },
}

/// The broadcast dispatcher
///
/// Runs as exactly one task for the whole server.
pub struct Broadcaster {
    /// Command receiver channel
    receiver: mpsc::Receiver<BroadcastCommand>,
}

/// Cloneable handle used by sessions to issue broadcasts
#[derive(Debug, Clone)]
pub struct BroadcastHandle {
    registry: Arc<Registry>,
    sender: mpsc::Sender<BroadcastCommand>,
}

impl Broadcaster {
    /// Create a dispatcher and the handle that feeds it
    pub fn new(registry: Arc<Registry>) -> (Self, BroadcastHandle) {
        let (sender, receiver) = mpsc::channel(BROADCAST_BUFFER_SIZE);
        (Self { receiver }, BroadcastHandle { registry, sender })
    }

    /// Run the dispatch loop
    ///
    /// Continuously receives and fans out until all handles are dropped.
    pub async fn run(mut self) {
        info!("Broadcaster started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Broadcaster shutting down");
    }

    fn handle_command(&self, cmd: BroadcastCommand) {
        match cmd {
            BroadcastCommand::Deliver { line, recipients } => {
                Self::fan_out(&line, &recipients);
            }
        }
    }

    /// Post `line` to every recipient; one closed mailbox never stops the rest
    fn fan_out(line: &str, recipients: &[Arc<UserSession>]) {
        let mut delivered = 0usize;
        for recipient in recipients {
            match recipient.send(line) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Broadcast to {} skipped: {}", recipient.id, e),
            }
        }
        debug!("Broadcast delivered to {}/{}", delivered, recipients.len());
    }
}

impl BroadcastHandle {
    /// Broadcast `text` as spoken by `sender`: `[address]name: text`
    pub async fn broadcast(&self, sender: &UserSession, text: &str) -> Result<(), AppError> {
        self.broadcast_line(sender.chat_line(text)).await
    }

    /// Broadcast an already formatted line
    pub async fn broadcast_line(&self, line: String) -> Result<(), AppError> {
        let recipients = self.registry.sessions().await;
        self.sender
            .send(BroadcastCommand::Deliver { line, recipients })
            .await
            .map_err(|_| AppError::ServerClosed)
    }
}
