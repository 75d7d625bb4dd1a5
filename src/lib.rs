//! Single-Room Line Chat Server Library
//!
//! A TCP chat room speaking a newline-delimited text protocol. Users pick a
//! display name, chat publicly, or send directed messages to one another.
//!
//! # Features
//! - Public broadcast chat (`[address]name: text`)
//! - Directory query (`who`)
//! - Renaming (`rename|NAME`)
//! - Directed messages (`to|NAME|TEXT`)
//! - Idle eviction after a fixed inactivity window
//! - Menu-driven terminal client
//!
//! # Architecture
//! - `Registry` maps names to sessions behind a read-preferring `RwLock`
//! - Each connection runs a read loop (with idle watchdog) and a writer task
//!   draining that user's `Mailbox`
//! - One `Broadcaster` task fans public lines out to every mailbox
//! - `ChatServer` is the root context cloned into every connection
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_room::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(config.bind_addr()).await.unwrap();
//!     ChatServer::start(config).serve(listener).await;
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod handler;
pub mod interpreter;
pub mod mailbox;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod terminal;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{BroadcastHandle, Broadcaster};
pub use config::{ClientConfig, ServerArgs, ServerConfig};
pub use error::{AppError, RegistryError, SendError};
pub use handler::handle_connection;
pub use interpreter::CommandInterpreter;
pub use mailbox::{mailbox, Mailbox, MailboxReceiver};
pub use message::{ClientRequest, ParseError, ServerNotice};
pub use registry::Registry;
pub use server::ChatServer;
pub use session::UserSession;
pub use terminal::{MenuChoice, TerminalClient};
pub use types::SessionId;
