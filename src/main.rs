//! Line Chat Server - Entry Point
//!
//! Parses flags, starts the ChatServer and accepts connections until Ctrl-C.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_room::{ChatServer, ServerArgs, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_room=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_room=info")),
        )
        .init();

    let config = ServerConfig::from(ServerArgs::parse());

    // Start TCP listener
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", addr);
    info!(
        "Idle timeout {}s, max line {} bytes",
        config.idle_timeout.as_secs(),
        config.max_line_length
    );

    let server = ChatServer::start(config);
    server
        .serve_until(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!("Chat server stopped");
    Ok(())
}
