//! Store error types and result alias.
//!
//! Every [`SortedSetStore`](crate::SortedSetStore) implementation maps its
//! internal failures onto [`StoreError`], so callers can react to a closed
//! connection or a timeout the same way regardless of the backend in use.
//!
//! # Error Types
//!
//! - [`StoreError::Connection`] - Network or connection-related failures
//! - [`StoreError::Timeout`] - Operation exceeded its time limit
//! - [`StoreError::Serialization`] - A member could not be encoded or decoded
//! - [`StoreError::InvalidArgument`] - A primitive was called with an unusable argument
//! - [`StoreError::SizeLimitExceeded`] - A key or member exceeds configured limits
//! - [`StoreError::Internal`] - Backend-specific internal errors
//!
//! # Example
//!
//! ```
//! use socialgraph_store::{StoreError, StoreResult};
//!
//! fn dial(addr: &str) -> StoreResult<()> {
//!     Err(StoreError::connection(format!("connection refused: {addr}")))
//! }
//!
//! assert!(dial("127.0.0.1:6379").unwrap_err().is_transient());
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to an ordered-set store.
///
/// Errors preserve their source chain via the `#[source]` attribute, enabling
/// debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// New variants may be added in future minor releases. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Connection or network error.
    ///
    /// The store could not be reached, or the connection dropped while a
    /// primitive was in flight.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization or deserialization error.
    ///
    /// Raised when a stored member cannot be decoded into the caller's
    /// representation (for example, a member that is not valid UTF-8).
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// A primitive was called with an argument the store cannot accept,
    /// such as a NaN score.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// A key or member exceeds the configured size limit.
    #[error("{kind} size {actual} exceeds limit of {limit} bytes")]
    SizeLimitExceeded {
        /// Which part was too large (`"key"` or `"member"`).
        kind: &'static str,
        /// Actual size in bytes.
        actual: usize,
        /// Configured maximum in bytes.
        limit: usize,
    },

    /// Internal store error.
    ///
    /// Catch-all for backend-specific errors that don't fit other categories.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Operation timed out.
    #[error("Operation timeout")]
    Timeout,
}

impl StoreError {
    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Creates a new `SizeLimitExceeded` error.
    #[must_use]
    pub fn size_limit_exceeded(kind: &'static str, actual: usize, limit: usize) -> Self {
        Self::SizeLimitExceeded { kind, actual, limit }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns `true` if retrying the same call may succeed.
    ///
    /// Connection failures and timeouts are transient. Argument, size and
    /// serialization errors will fail again on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric field is below its allowed minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// Smallest accepted value.
        min: String,
        /// The value that was supplied.
        value: String,
    },

    /// A field holds a value that is not allowed.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::connection("reset").is_transient());
        assert!(StoreError::timeout().is_transient());
        assert!(!StoreError::internal("boom").is_transient());
        assert!(!StoreError::invalid_argument("NaN score").is_transient());
        assert!(!StoreError::serialization("bad utf-8").is_transient());
        assert!(!StoreError::size_limit_exceeded("key", 600, 512).is_transient());
    }

    #[test]
    fn source_chain_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        let err = StoreError::connection_with_source("lost connection", io);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("peer reset"));
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            StoreError::size_limit_exceeded("member", 2048, 1024).to_string(),
            "member size 2048 exceeds limit of 1024 bytes"
        );
        assert_eq!(StoreError::timeout().to_string(), "Operation timeout");
        let config = ConfigError::BelowMinimum {
            field: "page_size",
            min: "1".into(),
            value: "0".into(),
        };
        assert_eq!(config.to_string(), "page_size must be at least 1, got 0");
    }
}
