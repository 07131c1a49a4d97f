use crate::types::{Email, UserId};
use thiserror::Error;

/// Store-layer error type.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Store error wrapper. Never reinterpreted as a domain error.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Invalid enumerated value (role, node kind).
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Invalid email input.
    #[error("invalid email: {0}")]
    InvalidEmail(String),
    /// Referenced node does not exist.
    #[error("node not found: {node}")]
    NodeNotFound { node: String },
    /// Referenced user does not exist.
    #[error("user not found: {user}")]
    UserNotFound { user: UserId },
    /// Another user already holds the email.
    #[error("email already exists: {email}")]
    EmailConflict { email: Email },
    /// A node name matched more than one node in the tree.
    #[error("node name is ambiguous: {name} matches {matches} nodes")]
    AmbiguousNode { name: String, matches: usize },
    /// Target scope is not contained in the caller scope.
    #[error("forbidden")]
    Forbidden,
}

/// Coarse error classification for boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input rejected before touching data.
    Invalid,
    /// Referenced node or user does not exist.
    NotFound,
    /// Uniqueness violated.
    Conflict,
    /// Access denied by the ACL check or the role gate.
    Forbidden,
    /// Opaque failure from beneath the core.
    Internal,
}

impl Error {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(_) => ErrorKind::Internal,
            Self::InvalidId(_)
            | Self::InvalidValue(_)
            | Self::InvalidEmail(_)
            | Self::AmbiguousNode { .. } => ErrorKind::Invalid,
            Self::NodeNotFound { .. } | Self::UserNotFound { .. } => ErrorKind::NotFound,
            Self::EmailConflict { .. } => ErrorKind::Conflict,
            Self::Forbidden => ErrorKind::Forbidden,
        }
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "INTERNAL",
            Self::InvalidId(_) => "INVALID_ID",
            Self::InvalidValue(_) => "INVALID_VALUE",
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::EmailConflict { .. } => "EMAIL_EXISTS",
            Self::AmbiguousNode { .. } => "AMBIGUOUS_NODE",
            Self::Forbidden => "FORBIDDEN",
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}
