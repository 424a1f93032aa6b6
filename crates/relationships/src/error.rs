//! Relationship engine error types.
//!
//! Store failures are wrapped unchanged in [`RelationshipError::Store`]; the
//! engine never retries on its own. Argument errors are raised before any
//! store call, so a rejected request has no side effects.

use socialgraph_store::{ConfigError, StoreError};
use thiserror::Error;

/// Result type alias for relationship engine operations.
pub type Result<T> = std::result::Result<T, RelationshipError>;

/// Errors returned by [`RelationshipEngine`](crate::RelationshipEngine).
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RelationshipError {
    /// The ordered-set store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An identity could not be used as a set member or key segment.
    #[error("invalid identity {identity:?}: {reason}")]
    InvalidIdentity {
        /// The rejected identity, as given.
        identity: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A page number or page size of zero was requested.
    #[error("invalid page: page {page}, page size {page_size} (both must be at least 1)")]
    InvalidPage {
        /// Requested 1-based page number.
        page: u64,
        /// Requested page size.
        page_size: u64,
    },

    /// Engine configuration failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RelationshipError {
    /// Creates an `InvalidIdentity` error.
    #[must_use]
    pub fn invalid_identity(identity: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidIdentity { identity: identity.into(), reason }
    }

    /// Returns `true` if re-running the failed operation may succeed.
    ///
    /// Only transient store failures qualify. Every engine mutation is
    /// idempotent, so retrying after a transient failure converges.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::InvalidIdentity { .. } | Self::InvalidPage { .. } | Self::Config(_) => false,
        }
    }
}
