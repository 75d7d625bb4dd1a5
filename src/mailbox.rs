//! Per-user outbound mailbox
//!
//! An ordered, unbounded queue of text lines from the core to one
//! connection's writer loop. Delivery never waits, so a stuck reader can't
//! stall whoever is fanning out to it. Closing the mailbox drops the only
//! sender, which wakes the writer loop with `None` once queued lines drain.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::error::SendError;

/// Sending half, owned by a `UserSession`
#[derive(Debug)]
pub struct Mailbox {
    sender: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

/// Receiving half, consumed by the writer loop
#[derive(Debug)]
pub struct MailboxReceiver {
    receiver: mpsc::UnboundedReceiver<String>,
}

/// Create a connected mailbox pair
pub fn mailbox() -> (Mailbox, MailboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Mailbox {
            sender: Mutex::new(Some(tx)),
        },
        MailboxReceiver { receiver: rx },
    )
}

impl Mailbox {
    /// Queue a line for the writer loop
    ///
    /// Fails if the mailbox was closed or the writer loop has exited.
    pub fn deliver(&self, line: impl Into<String>) -> Result<(), SendError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(line.into()).map_err(|_| SendError::ChannelClosed),
            None => Err(SendError::ChannelClosed),
        }
    }

    /// Close the mailbox. Idempotent.
    ///
    /// Lines already queued are still handed to the writer loop.
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// True once closed, or once the writer loop dropped its receiver
    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}

impl MailboxReceiver {
    /// Wait for the next line; `None` once the mailbox is closed and drained
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_delivery_preserves_order() {
        let (mailbox, mut rx) = mailbox();
        mailbox.deliver("one").unwrap();
        mailbox.deliver("two").unwrap();
        mailbox.deliver("three").unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
        assert_eq!(rx.recv().await.as_deref(), Some("three"));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let (mailbox, mut rx) = mailbox();
        mailbox.deliver("last words").unwrap();
        mailbox.close();

        assert!(mailbox.is_closed());
        assert_eq!(rx.recv().await.as_deref(), Some("last words"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_rejects_delivery() {
        let (mailbox, _rx) = mailbox();
        mailbox.close();
        mailbox.close();
        assert_eq!(mailbox.deliver("late"), Err(SendError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_receiver() {
        let (mailbox, mut rx) = mailbox();
        let waiter = tokio::spawn(async move { rx.recv().await });

        tokio::task::yield_now().await;
        mailbox.close();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("receiver was not woken")
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_rejects_delivery() {
        let (mailbox, rx) = mailbox();
        drop(rx);
        assert!(mailbox.is_closed());
        assert_eq!(mailbox.deliver("nobody home"), Err(SendError::ChannelClosed));
    }
}
