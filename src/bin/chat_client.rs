//! Line Chat Client - Entry Point
//!
//! Connects to the server, copies everything it sends to stdout, and runs
//! the menu on stdin.

use clap::Parser;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chat_room::{ClientConfig, TerminalClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so the menu on stdout stays readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_room=warn")),
        )
        .init();

    let config = ClientConfig::parse();
    let addr = config.server_addr();

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!(">>>>>>> failed to connect to {}: {}", addr, e);
            return Err(e.into());
        }
    };
    println!(">>>>>>> connected to {}", addr);
    info!("Connected to {}", addr);

    let (mut read_half, write_half) = stream.into_split();

    // Server replies go straight to the terminal
    let responses = tokio::spawn(async move {
        if let Err(e) = tokio::io::copy(&mut read_half, &mut tokio::io::stdout()).await {
            warn!("Connection read failed: {}", e);
        }
    });

    let mut client = TerminalClient::new(
        BufReader::new(tokio::io::stdin()),
        write_half,
        tokio::io::stdout(),
    );
    client.run().await?;

    responses.abort();
    Ok(())
}
