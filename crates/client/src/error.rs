use std::fmt;

use thiserror::Error;

/// The four remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    List,
}

impl Operation {
    /// Status code the remote API answers with on success.
    pub fn expected_status(self) -> u16 {
        match self {
            Self::Create => 201,
            Self::Update | Self::List => 200,
            Self::Delete => 204,
        }
    }

    /// Whether repeating the call is safe. Create is not: a blind retry can
    /// produce a second record for the same document.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Self::Create)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::List => write!(f, "list"),
        }
    }
}

/// Error payload returned by the server, decoded when it is JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(serde_json::Value),
    Text(String),
    Empty,
}

impl ErrorBody {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str(trimmed) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{}", &text[..floor_char_boundary(text, 500)]),
            Self::Empty => write!(f, "<empty body>"),
        }
    }
}

pub(crate) fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure; no response was received.
    #[error("{operation} request failed: {message}")]
    Transport { operation: Operation, message: String },

    /// The server answered with something other than the expected status.
    #[error("{operation} returned HTTP {status} (expected {expected}): {body}")]
    Status {
        operation: Operation,
        status: u16,
        expected: u16,
        body: ErrorBody,
    },

    /// A success response whose body could not be decoded.
    #[error("{operation} response could not be decoded: {message}")]
    Decode { operation: Operation, message: String },

    /// The server's pagination metadata is inconsistent.
    #[error("pagination error: {0}")]
    Pagination(String),

    /// Client could not be constructed (bad base URL, bad credential).
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => Some(*operation),
            Self::Pagination(_) => Some(Operation::List),
            Self::Config(_) => None,
        }
    }

    /// True when the failed call may be repeated without side effects.
    pub fn is_idempotent_op(&self) -> bool {
        self.operation().is_some_and(Operation::is_idempotent)
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
