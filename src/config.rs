//! Server and client configuration
//!
//! Command-line flags are parsed with clap; each flag can also come from
//! the environment. The core only ever sees the resolved `ServerConfig`.

use std::time::Duration;

use clap::Parser;

/// Default bind / connect IP
pub const DEFAULT_IP: &str = "127.0.0.1";

/// Default port
pub const DEFAULT_PORT: u16 = 8888;

/// Inactivity window after which a session is kicked
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Longest accepted line, terminator excluded
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Resolved server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    pub idle_timeout: Duration,
    pub max_line_length: usize,
}

impl ServerConfig {
    /// `ip:port` for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: DEFAULT_IP.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Server command-line flags
#[derive(Debug, Parser)]
#[command(name = "chat_room", version, about = "Single-room line-based chat server")]
pub struct ServerArgs {
    /// IP address to listen on
    #[arg(long, env = "CHAT_IP", default_value = DEFAULT_IP)]
    pub ip: String,

    /// Port to listen on
    #[arg(long, env = "CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seconds without input before a user is kicked
    #[arg(long, env = "CHAT_IDLE_TIMEOUT_SECS", default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    pub idle_timeout_secs: u64,

    /// Longest accepted line in bytes
    #[arg(long, env = "CHAT_MAX_LINE_LENGTH", default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            ip: args.ip,
            port: args.port,
            idle_timeout: Duration::from_secs(args.idle_timeout_secs),
            max_line_length: args.max_line_length,
        }
    }
}

/// Client command-line flags
#[derive(Debug, Clone, Parser)]
#[command(name = "chat_client", version, about = "Menu-driven client for chat_room")]
pub struct ClientConfig {
    /// Server IP address
    #[arg(long, env = "CHAT_IP", default_value = DEFAULT_IP)]
    pub ip: String,

    /// Server port
    #[arg(long, env = "CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ClientConfig {
    /// `ip:port` for `TcpStream::connect`
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
