//! Command interpreter
//!
//! Executes one decoded client line against the shared state: directory
//! queries and replies go straight to mailboxes, renames go through the
//! registry, and everything else is handed to the broadcaster.

use std::sync::Arc;

use tracing::{debug, info};

use crate::broadcast::BroadcastHandle;
use crate::error::{AppError, RegistryError};
use crate::message::{chat_line, ClientRequest, ServerNotice, ONLINE};
use crate::registry::Registry;
use crate::session::UserSession;

/// Dispatches client lines for every session of one server
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    registry: Arc<Registry>,
    broadcaster: BroadcastHandle,
}

impl CommandInterpreter {
    /// Create an interpreter over the server's registry and broadcaster
    pub fn new(registry: Arc<Registry>, broadcaster: BroadcastHandle) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Handle one line received from `session`
    ///
    /// Protocol errors are answered to the sender and return `Ok`. The only
    /// error is a stopped broadcaster.
    pub async fn handle_line(&self, session: &Arc<UserSession>, line: &str) -> Result<(), AppError> {
        match ClientRequest::parse(line) {
            Ok(request) => self.handle_request(session, request).await,
            Err(e) => {
                debug!("Rejected line from {}: {}", session.id, e);
                let _ = session.notify(e.into());
                Ok(())
            }
        }
    }

    /// Execute an already parsed request
    pub async fn handle_request(
        &self,
        session: &Arc<UserSession>,
        request: ClientRequest,
    ) -> Result<(), AppError> {
        match request {
            ClientRequest::Empty => {
                debug!("Empty line from {}", session.id);
                Ok(())
            }
            ClientRequest::Who => {
                self.handle_who(session).await;
                Ok(())
            }
            ClientRequest::Rename { name } => {
                self.handle_rename(session, name).await;
                Ok(())
            }
            ClientRequest::DirectMessage { target, body } => {
                self.handle_direct(session, &target, &body).await;
                Ok(())
            }
            ClientRequest::Public { text } => self.broadcaster.broadcast(session, &text).await,
        }
    }

    /// Handle directory query: one line per other online user
    async fn handle_who(&self, session: &UserSession) {
        let own_name = session.name();
        for (name, address) in self.registry.snapshot().await {
            if name == own_name {
                continue;
            }
            let _ = session.send(chat_line(&address, &name, ONLINE));
        }
    }

    /// Handle name change
    async fn handle_rename(&self, session: &Arc<UserSession>, new_name: String) {
        let old_name = session.name();
        match self.registry.rename(&old_name, &new_name, session).await {
            Ok(()) => {
                info!("Session {} renamed '{}' -> '{}'", session.id, old_name, new_name);
                let _ = session.notify(ServerNotice::Renamed { name: new_name });
            }
            Err(RegistryError::NameTaken(name)) => {
                debug!("Session {} rename to '{}' refused: taken", session.id, name);
                let _ = session.notify(ServerNotice::NameTaken);
            }
        }
    }

    /// Handle directed message; bypasses the broadcaster entirely
    async fn handle_direct(&self, session: &UserSession, target: &str, body: &str) {
        // Directed messages only go to other users
        if target == session.name() {
            let _ = session.notify(ServerNotice::NoSuchUser);
            return;
        }

        let Some(recipient) = self.registry.lookup(target).await else {
            let _ = session.notify(ServerNotice::NoSuchUser);
            return;
        };

        if body.is_empty() {
            let _ = session.notify(ServerNotice::EmptyMessage);
            return;
        }

        let notice = ServerNotice::Direct {
            from: session.name(),
            body: body.to_string(),
        };
        if let Err(e) = recipient.notify(notice) {
            debug!("Directed message to '{}' dropped: {}", target, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::broadcast::Broadcaster;
    use crate::mailbox::{mailbox, MailboxReceiver};

    struct Room {
        registry: Arc<Registry>,
        interpreter: CommandInterpreter,
    }

    impl Room {
        fn start() -> Self {
            let registry = Arc::new(Registry::new());
            let (broadcaster, handle) = Broadcaster::new(Arc::clone(&registry));
            tokio::spawn(broadcaster.run());
            let interpreter = CommandInterpreter::new(Arc::clone(&registry), handle);
            Self {
                registry,
                interpreter,
            }
        }

        async fn join(&self, address: &str, name: &str) -> (Arc<UserSession>, MailboxReceiver) {
            let (mailbox, rx) = mailbox();
            let session = Arc::new(UserSession::new(address, mailbox));
            self.registry.insert(Arc::clone(&session)).await.unwrap();
            if name != address {
                self.registry.rename(address, name, &session).await.unwrap();
            }
            (session, rx)
        }
    }

    async fn recv(rx: &mut MailboxReceiver) -> Option<String> {
        tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_who_lists_others_only() {
        let room = Room::start();
        let (alice, mut alice_rx) = room.join("10.0.0.1:1", "alice").await;
        let (_bob, _) = room.join("10.0.0.1:2", "bob").await;
        let (_carol, _) = room.join("10.0.0.1:3", "carol").await;

        room.interpreter.handle_line(&alice, "who").await.unwrap();

        let mut lines = vec![
            recv(&mut alice_rx).await.unwrap(),
            recv(&mut alice_rx).await.unwrap(),
        ];
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "[10.0.0.1:2]bob: online...".to_string(),
                "[10.0.0.1:3]carol: online...".to_string(),
            ]
        );
        assert_eq!(recv(&mut alice_rx).await, None);
    }

    #[tokio::test]
    async fn test_rename_success_and_collision() {
        let room = Room::start();
        let (first, mut first_rx) = room.join("10.0.0.1:1", "10.0.0.1:1").await;
        let (second, mut second_rx) = room.join("10.0.0.1:2", "10.0.0.1:2").await;

        room.interpreter.handle_line(&first, "rename|alice").await.unwrap();
        assert_eq!(
            recv(&mut first_rx).await.as_deref(),
            Some("your name has been changed to alice")
        );

        room.interpreter.handle_line(&second, "rename|alice").await.unwrap();
        assert_eq!(recv(&mut second_rx).await.as_deref(), Some("name already in use"));
        assert_eq!(second.name(), "10.0.0.1:2");
        assert_eq!(first.name(), "alice");
        // Nothing leaked to the other user
        assert_eq!(recv(&mut first_rx).await, None);
    }

    #[tokio::test]
    async fn test_rename_rejects_empty_and_separator() {
        let room = Room::start();
        let (user, mut rx) = room.join("10.0.0.1:1", "user").await;

        room.interpreter.handle_line(&user, "rename|").await.unwrap();
        assert_eq!(recv(&mut rx).await.as_deref(), Some("name must not be empty"));

        room.interpreter.handle_line(&user, "rename|a|b").await.unwrap();
        assert_eq!(recv(&mut rx).await.as_deref(), Some("name must not contain '|'"));
        assert_eq!(user.name(), "user");
    }

    #[tokio::test]
    async fn test_direct_message_reaches_only_target() {
        let room = Room::start();
        let (alice, mut alice_rx) = room.join("10.0.0.1:1", "alice").await;
        let (_bob, mut bob_rx) = room.join("10.0.0.1:2", "bob").await;
        let (_carol, mut carol_rx) = room.join("10.0.0.1:3", "carol").await;

        room.interpreter.handle_line(&alice, "to|bob|hello").await.unwrap();

        assert_eq!(recv(&mut bob_rx).await.as_deref(), Some("alice says to you: hello"));
        assert_eq!(recv(&mut alice_rx).await, None);
        assert_eq!(recv(&mut carol_rx).await, None);
    }

    #[tokio::test]
    async fn test_direct_message_body_keeps_separators() {
        let room = Room::start();
        let (alice, _alice_rx) = room.join("10.0.0.1:1", "alice").await;
        let (_bob, mut bob_rx) = room.join("10.0.0.1:2", "bob").await;

        room.interpreter.handle_line(&alice, "to|bob|a|b|c").await.unwrap();

        assert_eq!(recv(&mut bob_rx).await.as_deref(), Some("alice says to you: a|b|c"));
    }

    #[tokio::test]
    async fn test_direct_message_errors() {
        let room = Room::start();
        let (alice, mut alice_rx) = room.join("10.0.0.1:1", "alice").await;
        let (_bob, mut bob_rx) = room.join("10.0.0.1:2", "bob").await;

        room.interpreter.handle_line(&alice, "to||hello").await.unwrap();
        assert_eq!(
            recv(&mut alice_rx).await.as_deref(),
            Some("malformed directed-message syntax, expected to|name|text")
        );

        room.interpreter.handle_line(&alice, "to|dave|hello").await.unwrap();
        assert_eq!(recv(&mut alice_rx).await.as_deref(), Some("no such user"));

        room.interpreter.handle_line(&alice, "to|bob|").await.unwrap();
        assert_eq!(
            recv(&mut alice_rx).await.as_deref(),
            Some("empty message, please resend")
        );

        assert_eq!(recv(&mut bob_rx).await, None);
    }

    #[tokio::test]
    async fn test_direct_message_to_self_is_not_echoed() {
        let room = Room::start();
        let (alice, mut alice_rx) = room.join("10.0.0.1:1", "al").await;
        let (_bob, mut bob_rx) = room.join("10.0.0.1:2", "bob").await;

        room.interpreter.handle_line(&alice, "to|al|hi").await.unwrap();

        assert_eq!(recv(&mut alice_rx).await.as_deref(), Some("no such user"));
        assert_eq!(recv(&mut alice_rx).await, None);
        assert_eq!(recv(&mut bob_rx).await, None);
    }

    #[tokio::test]
    async fn test_public_line_is_broadcast() {
        let room = Room::start();
        let (alice, mut alice_rx) = room.join("10.0.0.1:1", "alice").await;
        let (_bob, mut bob_rx) = room.join("10.0.0.1:2", "bob").await;

        room.interpreter.handle_line(&alice, "hi all").await.unwrap();

        assert_eq!(recv(&mut alice_rx).await.as_deref(), Some("[10.0.0.1:1]alice: hi all"));
        assert_eq!(recv(&mut bob_rx).await.as_deref(), Some("[10.0.0.1:1]alice: hi all"));
    }

    #[tokio::test]
    async fn test_empty_line_is_ignored() {
        let room = Room::start();
        let (alice, mut alice_rx) = room.join("10.0.0.1:1", "alice").await;
        let (_bob, mut bob_rx) = room.join("10.0.0.1:2", "bob").await;

        room.interpreter.handle_line(&alice, "").await.unwrap();

        assert_eq!(recv(&mut alice_rx).await, None);
        assert_eq!(recv(&mut bob_rx).await, None);
    }
}
