//! Connection handler
//!
//! Owns one accepted connection's lifecycle: join, read loop with idle
//! watchdog, and teardown. Output goes through the session's mailbox to a
//! separate writer task, so a slow socket only ever stalls its own writer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::mailbox::{mailbox, MailboxReceiver};
use crate::message::{ServerNotice, JOINED, LEFT};
use crate::server::ChatServer;
use crate::session::UserSession;
use crate::types::SessionId;

/// How long teardown waits for the writer to flush before aborting it
pub const WRITER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the read loop stopped
#[derive(Debug)]
enum CloseReason {
    /// Peer closed its side
    Eof,
    /// No line within the idle window
    IdleTimeout,
    /// Framing or transport failure
    ReadError(AppError),
    /// Broadcaster is gone, the server is going down
    ServerClosed,
}

/// Handle a newly accepted connection
///
/// Returns once the session has fully torn down. Only transport and join
/// failures are reported as errors; EOF and idle eviction are normal ends.
pub async fn handle_connection<S>(
    stream: S,
    peer_addr: SocketAddr,
    server: ChatServer,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let address = peer_addr.to_string();
    let (read_half, write_half) = tokio::io::split(stream);
    let mut lines = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(server.config().max_line_length),
    );
    let mut sink = FramedWrite::new(write_half, LinesCodec::new());

    let (mailbox, mailbox_rx) = mailbox();
    let session = Arc::new(UserSession::new(address, mailbox));

    // Joining
    if let Err(e) = server.registry().insert(Arc::clone(&session)).await {
        warn!("Refusing {} from {}: {}", session.id, peer_addr, e);
        let _ = sink.send(ServerNotice::NameTaken.to_string()).await;
        let _ = SinkExt::<String>::close(&mut sink).await;
        return Err(e.into());
    }
    info!("Client {} joined from {}", session.id, peer_addr);

    let mut writer = tokio::spawn(writer_loop(session.id, mailbox_rx, sink));

    let reason = match server.broadcaster().broadcast(&session, JOINED).await {
        Ok(()) => read_loop(&server, &session, &mut lines).await,
        Err(_) => CloseReason::ServerClosed,
    };

    if let CloseReason::IdleTimeout = reason {
        info!("Client {} idle, kicking", session.id);
        // Notify before teardown so the notice is the last line written
        let _ = session.notify(ServerNotice::Kicked);
        session.close();
    }
    drop(lines);

    // Closed
    server.registry().remove_session(&session).await;
    if let Err(e) = server.broadcaster().broadcast(&session, LEFT).await {
        debug!("Left notice for {} not sent: {}", session.id, e);
    }
    session.close();

    if tokio::time::timeout(WRITER_SHUTDOWN_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        warn!("Writer for {} did not finish, aborting", session.id);
        writer.abort();
    }

    info!("Client {} disconnected ({:?})", session.id, reason);

    match reason {
        CloseReason::ReadError(e) => Err(e),
        CloseReason::ServerClosed => Err(AppError::ServerClosed),
        CloseReason::Eof | CloseReason::IdleTimeout => Ok(()),
    }
}

/// Read lines until EOF, error, or the idle window elapses with no line
async fn read_loop<R>(
    server: &ChatServer,
    session: &Arc<UserSession>,
    lines: &mut FramedRead<R, LinesCodec>,
) -> CloseReason
where
    R: AsyncRead + Unpin,
{
    let idle_timeout = server.config().idle_timeout;

    loop {
        // Every received line restarts the window
        let next = match tokio::time::timeout(idle_timeout, lines.next()).await {
            Err(_) => return CloseReason::IdleTimeout,
            Ok(next) => next,
        };

        match next {
            None => {
                debug!("Client {} sent EOF", session.id);
                return CloseReason::Eof;
            }
            Some(Err(e)) => {
                warn!("Read error for {}: {}", session.id, e);
                return CloseReason::ReadError(e.into());
            }
            Some(Ok(line)) => {
                debug!("Line from {}: {:?}", session.id, line);
                if server.interpreter().handle_line(session, &line).await.is_err() {
                    return CloseReason::ServerClosed;
                }
            }
        }
    }
}

/// Drain a mailbox onto the socket, one line per message, in order
///
/// Ends when the mailbox is closed or a write fails. Write failures are
/// not retried; the read loop decides when the session ends.
pub async fn writer_loop<S>(id: SessionId, mut mailbox: MailboxReceiver, mut sink: S)
where
    S: Sink<String, Error = LinesCodecError> + Unpin,
{
    while let Some(line) = mailbox.recv().await {
        if let Err(e) = sink.send(line).await {
            warn!("Write to {} failed: {}", id, e);
            break;
        }
    }
    debug!("Writer loop ended for {}", id);

    let _ = sink.close().await;
}
