//! Health check types for ordered-set stores.
//!
//! [`SortedSetStore::health_check`](crate::SortedSetStore::health_check)
//! returns a [`HealthStatus`] rather than a bare `Result<()>`, so a store that
//! is reachable but slow (or serving from a replica) can report itself as
//! degraded instead of failing outright.
//!
//! | `HealthProbe`  | `HealthStatus` | Serve traffic? |
//! |----------------|----------------|----------------|
//! | `Liveness`     | `Healthy`      | yes            |
//! | `Readiness`    | `Healthy`      | yes            |
//! | `Readiness`    | `Degraded`     | yes            |
//! | `Readiness`    | `Unhealthy`    | no             |
//! | `Startup`      | `Healthy`      | yes            |

use std::{collections::BTreeMap, fmt, time::Duration};

/// The kind of health probe to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthProbe {
    /// Process is alive and the store handle is not deadlocked.
    Liveness,
    /// The store can serve reads and writes.
    Readiness,
    /// Initial connection to the store has been established.
    Startup,
}

impl fmt::Display for HealthProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liveness => write!(f, "liveness"),
            Self::Readiness => write!(f, "readiness"),
            Self::Startup => write!(f, "startup"),
        }
    }
}

/// Health status reported by a store.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use socialgraph_store::health::{HealthMetadata, HealthStatus};
///
/// let status = HealthStatus::healthy(HealthMetadata::new(Duration::from_millis(2), "memory"));
/// assert!(status.is_healthy());
/// ```
#[derive(Debug, Clone)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy(HealthMetadata),
    /// Store is operational with reduced capability; the string says why.
    Degraded(HealthMetadata, String),
    /// Store cannot serve traffic; the string says why.
    Unhealthy(HealthMetadata, String),
}

impl HealthStatus {
    /// Creates a `Healthy` status.
    #[must_use = "creating a status has no side effects"]
    pub fn healthy(metadata: HealthMetadata) -> Self {
        Self::Healthy(metadata)
    }

    /// Creates a `Degraded` status with a reason.
    #[must_use = "creating a status has no side effects"]
    pub fn degraded(metadata: HealthMetadata, reason: impl Into<String>) -> Self {
        Self::Degraded(metadata, reason.into())
    }

    /// Creates an `Unhealthy` status with a reason.
    #[must_use = "creating a status has no side effects"]
    pub fn unhealthy(metadata: HealthMetadata, reason: impl Into<String>) -> Self {
        Self::Unhealthy(metadata, reason.into())
    }

    /// Returns `true` if the store is fully healthy.
    #[must_use = "health status predicates should be checked"]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }

    /// Returns `true` if the store is degraded.
    #[must_use = "health status predicates should be checked"]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }

    /// Returns `true` if the store is unhealthy.
    #[must_use = "health status predicates should be checked"]
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(..))
    }

    /// Returns the metadata attached to this status.
    #[must_use]
    pub fn metadata(&self) -> &HealthMetadata {
        match self {
            Self::Healthy(m) | Self::Degraded(m, _) | Self::Unhealthy(m, _) => m,
        }
    }

    /// Returns the degradation or failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Healthy(_) => None,
            Self::Degraded(_, reason) | Self::Unhealthy(_, reason) => Some(reason),
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy(m) => write!(f, "healthy ({}ms)", m.check_duration.as_millis()),
            Self::Degraded(m, reason) => {
                write!(f, "degraded: {} ({}ms)", reason, m.check_duration.as_millis())
            },
            Self::Unhealthy(m, reason) => {
                write!(f, "unhealthy: {} ({}ms)", reason, m.check_duration.as_millis())
            },
        }
    }
}

/// Timing and identification for one health check.
#[derive(Debug, Clone)]
pub struct HealthMetadata {
    /// How long the check took.
    pub check_duration: Duration,
    /// Store implementation name (`"memory"`, `"metered"`, ...).
    pub backend: String,
    /// Store-specific details such as `set_count`.
    pub details: BTreeMap<String, String>,
}

impl HealthMetadata {
    /// Creates metadata for a check that took `check_duration`.
    #[must_use]
    pub fn new(check_duration: Duration, backend: impl Into<String>) -> Self {
        Self { check_duration, backend: backend.into(), details: BTreeMap::new() }
    }

    /// Adds a detail entry, returning `self` for chaining.
    #[must_use = "returns the modified metadata for chaining"]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
