//! Error taxonomy shared by every step of the operation protocol.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error class, stable across backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Unimplemented,
    ResourceExhausted,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument   => "INVALID_ARGUMENT",
            ErrorCode::NotFound          => "NOT_FOUND",
            ErrorCode::Unimplemented     => "UNIMPLEMENTED",
            ErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorCode::Internal          => "INTERNAL",
        };
        f.write_str(s)
    }
}

/// Failure of a protocol step. Propagated unchanged up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed call sequence, bad or missing input, undersized output buffer.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend does not know the requested primitive.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend knows the primitive but cannot run it.
    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Runtime failure inside the backend.
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn unimplemented(msg: impl Into<String>) -> Self {
        Error::Unimplemented(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Error::ResourceExhausted(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidArgument(_)   => ErrorCode::InvalidArgument,
            Error::NotFound(_)          => ErrorCode::NotFound,
            Error::Unimplemented(_)     => ErrorCode::Unimplemented,
            Error::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
            Error::Internal(_)          => ErrorCode::Internal,
        }
    }

    /// Message without the class prefix
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidArgument(m)
            | Error::NotFound(m)
            | Error::Unimplemented(m)
            | Error::ResourceExhausted(m)
            | Error::Internal(m) => m,
        }
    }
}
