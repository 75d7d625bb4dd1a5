//! Error types for the chat server
//!
//! Defines application-level errors, mailbox send errors and registry errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Transport failures end the affected session only; they are never
/// propagated to other sessions.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal for the session)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error: oversized line, invalid UTF-8 or IO (fatal for the session)
    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// The connection's default name is already registered by another session
    #[error("Name already in use: {0}")]
    NameTaken(String),

    /// The broadcast dispatcher has stopped
    #[error("Broadcaster closed")]
    ServerClosed,
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NameTaken(name) => AppError::NameTaken(name),
        }
    }
}

/// Message send errors
///
/// Occurs when attempting to deliver into a closed mailbox.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The mailbox has been closed or its writer loop is gone
    #[error("Channel closed")]
    ChannelClosed,
}

/// Registry mutation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another online session already uses this name
    #[error("Name already in use: {0}")]
    NameTaken(String),
}
