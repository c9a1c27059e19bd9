//! Structured error handling for storage adapter operations.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors surfaced by the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-supplied input was rejected before any remote call.
    InvalidInput,
    /// The remote resource does not exist.
    NotFound,
    /// The remote resource is in a conflicting state.
    Conflict,
    /// The storage service refused the credentials or the operation.
    Authorization,
    /// Transport-level failure reported by the SDK.
    Network,
    /// A fetch did not complete within the configured timeout.
    Timeout,
    /// The caller cancelled the operation.
    Cancelled,
    /// The SDK dropped a completion without ever completing it.
    Abandoned,
    /// A fetched record could not be converted into the requested type.
    Conversion,
    /// Invalid adapter configuration.
    Configuration,
    /// Any other failure reported by the storage SDK.
    External,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Check if this error kind is typically retryable.
    ///
    /// The adapters never retry on their own; this is a hint for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput).with_message(message)
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound).with_message(message)
    }

    /// Creates a new cancellation error.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled).with_message("operation was cancelled")
    }

    /// Creates a new timeout error.
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::new(ErrorKind::Timeout).with_message(format!("no response after {timeout:?}"))
    }

    /// Creates a new abandoned-completion error.
    pub fn abandoned() -> Self {
        Self::new(ErrorKind::Abandoned).with_message("completion dropped before the operation ended")
    }

    /// Creates a new conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion).with_message(message)
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration).with_message(message)
    }

    /// Creates a new error reported by the storage SDK.
    pub fn external(source: impl Into<BoxedError>) -> Self {
        Self::from_source(ErrorKind::External, source)
    }

    /// Returns the error kind.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if the operation was cancelled by the caller.
    #[inline]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Local I/O failures are external to the storage service.
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::from_source(ErrorKind::External, error).with_message("I/O operation failed")
    }
}
