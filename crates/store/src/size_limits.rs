//! Key and member size validation.
//!
//! Set keys in this workspace are short composite strings and members are
//! identity strings, so anything large is almost certainly a bug upstream.
//! Stores accept an optional [`SizeLimits`] at construction time and call
//! [`validate_entry`] on every write path.
//!
//! | Limit | Default |
//! |-------|---------|
//! | `max_key_size` | 512 bytes |
//! | `max_member_size` | 1024 bytes |

use crate::{ConfigError, StoreError};

/// Default maximum key size in bytes.
pub const DEFAULT_MAX_KEY_SIZE: usize = 512;

/// Default maximum member size in bytes.
pub const DEFAULT_MAX_MEMBER_SIZE: usize = 1024;

/// Configurable size limits for set keys and members.
///
/// # Example
///
/// ```
/// use socialgraph_store::SizeLimits;
///
/// let limits = SizeLimits::new(128, 64).unwrap();
/// assert_eq!(limits.max_member_size(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    max_key_size: usize,
    max_member_size: usize,
}

impl SizeLimits {
    /// Creates size limits with the given bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if either limit is zero.
    pub fn new(max_key_size: usize, max_member_size: usize) -> Result<Self, ConfigError> {
        if max_key_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_key_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if max_member_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_member_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        Ok(Self { max_key_size, max_member_size })
    }

    /// Returns the maximum allowed key size in bytes.
    #[must_use]
    pub fn max_key_size(&self) -> usize {
        self.max_key_size
    }

    /// Returns the maximum allowed member size in bytes.
    #[must_use]
    pub fn max_member_size(&self) -> usize {
        self.max_member_size
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { max_key_size: DEFAULT_MAX_KEY_SIZE, max_member_size: DEFAULT_MAX_MEMBER_SIZE }
    }
}

/// Validates a key and member against the given limits.
pub fn validate_entry(key: &[u8], member: &[u8], limits: &SizeLimits) -> Result<(), StoreError> {
    validate_key_size(key, limits)?;
    if member.len() > limits.max_member_size {
        return Err(StoreError::size_limit_exceeded(
            "member",
            member.len(),
            limits.max_member_size,
        ));
    }
    Ok(())
}

/// Validates key size only, for operations that carry no member.
pub fn validate_key_size(key: &[u8], limits: &SizeLimits) -> Result<(), StoreError> {
    if key.len() > limits.max_key_size {
        return Err(StoreError::size_limit_exceeded("key", key.len(), limits.max_key_size));
    }
    Ok(())
}
