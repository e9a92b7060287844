use std::fmt;

use thiserror::Error;

/// Result type for store and name-parsing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for operations on the RPC surface
pub type RpcResult<T> = std::result::Result<T, Status>;

/// Abstract failure conditions raised by the parser and the store
///
/// These carry no transport vocabulary; the service layer maps each variant
/// onto a [`Status`] before it reaches a caller.
#[derive(Error, Debug)]
pub enum Error {
    /// A resource name that does not match the expected grammar
    #[error("malformed name: {0}")]
    MalformedName(String),

    /// A request field with a missing or unusable value
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A well-formed name that does not resolve to an existing resource
    #[error("not found: {0}")]
    NotFound(String),

    /// An identifier collision on create
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// An internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Status codes surfaced to RPC callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// An RPC error: a status code plus a human-readable message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    /// Creates a new Status with the given code and message
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns the status code
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the status message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::MalformedName(_) | Error::InvalidArgument(_) => StatusCode::InvalidArgument,
            Error::NotFound(_) => StatusCode::NotFound,
            Error::AlreadyExists(_) => StatusCode::AlreadyExists,
            Error::Internal(_) => StatusCode::Internal,
        };

        Self {
            code,
            message: err.to_string(),
        }
    }
}
