//! Error types for the chat client.
//!
//! This module defines error types for transport-level faults, line
//! tokenizing failures, input format validation and the client API
//! preconditions.

use thiserror::Error;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Transport-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// Line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Length of the offending line.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Illegal control character in a line.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// The peer closed the WebSocket or sent an unusable frame.
    #[error("websocket error: {0}")]
    WebSocket(String),
}

/// Errors encountered when tokenizing a protocol line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was invalid or missing.
    #[error("invalid command")]
    InvalidCommand,

    /// Tokenizing failed with context.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Byte position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: &'static str,
    },
}

/// Malformed user input, rejected before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// Channel name does not match `^#?[A-Za-z0-9_]{3,25}$`.
    #[error("the channel name (\"{0}\") is in an invalid format")]
    ChannelName(String),

    /// Login name does not match the account name pattern.
    #[error("the login name (\"{0}\") is in an invalid format")]
    Login(String),

    /// OAuth token is not 30 alphanumeric characters with an optional `oauth:` prefix.
    #[error("the OAuth token is in an invalid format")]
    OAuthToken,
}

/// Errors returned by the public client API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The operation needs a live connection.
    #[error("the client is not connected")]
    NotConnected,

    /// Anonymous clients can only receive.
    #[error("the client is logged in anonymously and cannot send messages")]
    Anonymous,

    /// The target channel is not joined.
    #[error("the client is not connected to the channel {0}")]
    NotJoined(String),

    /// The client has been disposed.
    #[error("the client has been disposed")]
    Disposed,

    /// Input validation failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Writing to or establishing the transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Connecting took longer than the configured timeout.
    #[error("connection attempt timed out")]
    Timeout,
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        Self::Transport(err.to_string())
    }
}
