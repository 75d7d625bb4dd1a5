//! Message protocol definitions
//!
//! Newline-delimited UTF-8 text protocol. Client lines are parsed into a
//! `ClientRequest`; server status lines are rendered from a `ServerNotice`.
//! Broadcast and directory lines share the `[address]name: text` layout.

use std::fmt;

use thiserror::Error;

/// Body of the broadcast emitted when a user joins
pub const JOINED: &str = "joined";

/// Body of the broadcast emitted when a user leaves
pub const LEFT: &str = "left";

/// Body of one directory entry in a `who` reply
pub const ONLINE: &str = "online...";

const WHO: &str = "who";
const RENAME_PREFIX: &str = "rename|";
const DIRECT_PREFIX: &str = "to|";
const FIELD_SEPARATOR: char = '|';

/// Client → Server request
///
/// One decoded line, classified by prefix. The most specific form wins:
/// exact `who`, then `rename|`, then `to|`, anything else is public chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    /// Zero-length line; carries no content
    Empty,
    /// Directory of online users
    Who,
    /// Change own display name
    Rename { name: String },
    /// Message to exactly one other user. `body` may be empty here;
    /// the interpreter rejects that after resolving the target.
    DirectMessage { target: String, body: String },
    /// Public line for everyone in the room
    Public { text: String },
}

/// Request grammar errors
///
/// Reported back to the sender as a plain-text line, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// `to|` with nothing before the second separator
    #[error("Directed message without a target")]
    EmptyTarget,
    /// `rename|` with nothing after it
    #[error("Empty name")]
    EmptyName,
    /// A name containing the field separator could never be addressed
    #[error("Name contains '|'")]
    InvalidName,
}

impl ClientRequest {
    /// Parse one line with its terminator already stripped
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        if line.is_empty() {
            return Ok(ClientRequest::Empty);
        }

        if line == WHO {
            return Ok(ClientRequest::Who);
        }

        if let Some(name) = line.strip_prefix(RENAME_PREFIX) {
            if name.is_empty() {
                return Err(ParseError::EmptyName);
            }
            if name.contains(FIELD_SEPARATOR) {
                return Err(ParseError::InvalidName);
            }
            return Ok(ClientRequest::Rename {
                name: name.to_string(),
            });
        }

        if let Some(rest) = line.strip_prefix(DIRECT_PREFIX) {
            // Only the first separator splits; the body keeps any further '|'
            let (target, body) = rest.split_once(FIELD_SEPARATOR).unwrap_or((rest, ""));
            if target.is_empty() {
                return Err(ParseError::EmptyTarget);
            }
            return Ok(ClientRequest::DirectMessage {
                target: target.to_string(),
                body: body.to_string(),
            });
        }

        Ok(ClientRequest::Public {
            text: line.to_string(),
        })
    }

    /// Encode as a wire line, without the terminator
    pub fn to_line(&self) -> String {
        match self {
            ClientRequest::Empty => String::new(),
            ClientRequest::Who => WHO.to_string(),
            ClientRequest::Rename { name } => format!("{}{}", RENAME_PREFIX, name),
            ClientRequest::DirectMessage { target, body } => {
                format!("{}{}{}{}", DIRECT_PREFIX, target, FIELD_SEPARATOR, body)
            }
            ClientRequest::Public { text } => text.clone(),
        }
    }
}

/// Server → Client status line
///
/// Replies that go to a single mailbox. Broadcast and directory lines
/// use [`chat_line`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerNotice {
    /// Rename succeeded
    Renamed { name: String },
    /// Rename target (or join name) already registered
    NameTaken,
    /// `rename|` without a name
    EmptyName,
    /// Name with a '|' in it
    InvalidName,
    /// `to|` without a target
    MalformedDirect,
    /// Directed message target is not online
    NoSuchUser,
    /// Directed message with an empty body
    EmptyMessage,
    /// Directed message delivered to its target
    Direct { from: String, body: String },
    /// Idle timeout eviction
    Kicked,
}

impl fmt::Display for ServerNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerNotice::Renamed { name } => {
                write!(f, "your name has been changed to {}", name)
            }
            ServerNotice::NameTaken => f.write_str("name already in use"),
            ServerNotice::EmptyName => f.write_str("name must not be empty"),
            ServerNotice::InvalidName => f.write_str("name must not contain '|'"),
            ServerNotice::MalformedDirect => {
                f.write_str("malformed directed-message syntax, expected to|name|text")
            }
            ServerNotice::NoSuchUser => f.write_str("no such user"),
            ServerNotice::EmptyMessage => f.write_str("empty message, please resend"),
            ServerNotice::Direct { from, body } => write!(f, "{} says to you: {}", from, body),
            ServerNotice::Kicked => f.write_str("you have been kicked for inactivity"),
        }
    }
}

/// Convert ParseError to ServerNotice for client notification
impl From<ParseError> for ServerNotice {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::EmptyTarget => ServerNotice::MalformedDirect,
            ParseError::EmptyName => ServerNotice::EmptyName,
            ParseError::InvalidName => ServerNotice::InvalidName,
        }
    }
}

/// Format a room line: `[address]name: text`
pub fn chat_line(address: &str, name: &str, text: &str) -> String {
    format!("[{}]{}: {}", address, name, text)
}
