//! ChatServer root context and accept loop
//!
//! `ChatServer` owns the registry, the broadcaster handle and the command
//! interpreter, and is cloned into every connection. The accept loop hands
//! each accepted stream to `handle_connection` exactly once.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broadcast::{BroadcastHandle, Broadcaster};
use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::interpreter::CommandInterpreter;
use crate::registry::Registry;

/// Shared state for one chat room
#[derive(Debug, Clone)]
pub struct ChatServer {
    config: Arc<ServerConfig>,
    registry: Arc<Registry>,
    broadcaster: BroadcastHandle,
    interpreter: CommandInterpreter,
}

impl ChatServer {
    /// Build the room and spawn its broadcast dispatcher
    ///
    /// Must be called inside a tokio runtime. The dispatcher stops once
    /// every clone of the returned server has been dropped.
    pub fn start(config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new());
        let (broadcaster, handle) = Broadcaster::new(Arc::clone(&registry));
        tokio::spawn(broadcaster.run());

        let interpreter = CommandInterpreter::new(Arc::clone(&registry), handle.clone());

        Self {
            config: Arc::new(config),
            registry,
            broadcaster: handle,
            interpreter,
        }
    }

    /// Settings this room was started with
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Online users
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handle to the room's broadcast dispatcher
    pub fn broadcaster(&self) -> &BroadcastHandle {
        &self.broadcaster
    }

    /// Command interpreter shared by every connection
    pub fn interpreter(&self) -> &CommandInterpreter {
        &self.interpreter
    }

    /// Accept connections forever
    pub async fn serve(self, listener: TcpListener) {
        self.serve_until(listener, std::future::pending::<()>()).await;
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Accept errors are logged and skipped. Sessions already running are
    /// left to end on their own.
    pub async fn serve_until<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Acceptor shutting down");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        info!("New connection from {}", addr);
                        let server = self.clone();

                        // Spawn handler task for each connection
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, server).await {
                                error!("Connection handler error for {}: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
            }
        }
    }
}
