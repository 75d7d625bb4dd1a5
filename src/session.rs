//! User session definition
//!
//! Represents one connected user: identity, display name, peer address and
//! the mailbox feeding its writer loop. The socket halves themselves are
//! owned by the connection handler's read loop and writer loop.

use std::sync::{Mutex, PoisonError};

use crate::error::SendError;
use crate::mailbox::Mailbox;
use crate::message::{chat_line, ServerNotice};
use crate::types::SessionId;

/// Connected user information
///
/// The name starts out as the peer address and is only changed by the
/// registry while it holds its write lock, so a name is never observed
/// out of step with the registry key it is filed under.
#[derive(Debug)]
pub struct UserSession {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Peer address, fixed for the life of the connection
    pub address: String,
    /// Current display name
    name: Mutex<String>,
    /// Core → writer loop channel
    mailbox: Mailbox,
}

impl UserSession {
    /// Create a new session whose name defaults to its address
    pub fn new(address: impl Into<String>, mailbox: Mailbox) -> Self {
        let address = address.into();
        Self {
            id: SessionId::new(),
            name: Mutex::new(address.clone()),
            address,
            mailbox,
        }
    }

    /// Current display name
    pub fn name(&self) -> String {
        self.name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_name(&self, name: String) {
        *self.name.lock().unwrap_or_else(PoisonError::into_inner) = name;
    }

    /// Queue a raw line for this user
    pub fn send(&self, line: impl Into<String>) -> Result<(), SendError> {
        self.mailbox.deliver(line)
    }

    /// Queue a status line for this user
    pub fn notify(&self, notice: ServerNotice) -> Result<(), SendError> {
        self.mailbox.deliver(notice.to_string())
    }

    /// Format `text` as spoken by this user: `[address]name: text`
    pub fn chat_line(&self, text: &str) -> String {
        chat_line(&self.address, &self.name(), text)
    }

    /// Close the mailbox, ending the writer loop once it drains. Idempotent.
    pub fn close(&self) {
        self.mailbox.close();
    }

    /// Check whether the mailbox is closed
    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}
