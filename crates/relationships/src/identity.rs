//! Opaque identity values.
//!
//! An [`Identity`] is whatever the caller uses to name a user: a database
//! id, a UUID, a handle. The engine only compares identities for equality and
//! stores their string form as a set member and as the last segment of a key.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use socialgraph_store::{DEFAULT_MAX_KEY_SIZE, StoreError};

use crate::error::{RelationshipError, Result};

/// Longest accepted identity, in bytes.
///
/// Together with [`MAX_SEGMENT_LEN`](crate::config::MAX_SEGMENT_LEN) this keeps
/// every key within the store's default key limit.
pub const MAX_IDENTITY_LEN: usize = DEFAULT_MAX_KEY_SIZE / 2;

/// An opaque participant in the social graph.
///
/// # Examples
///
/// ```
/// use socialgraph::Identity;
///
/// assert_eq!(Identity::from(42_u64), Identity::from("42"));
/// assert_eq!(Identity::from("alice").as_str(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from its string form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the string form stored in the ordered-set store.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the member bytes written to the store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consumes the identity, returning its string form.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Rejects identities that cannot name a set member or end a key.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(RelationshipError::invalid_identity(&self.0, "must not be empty"));
        }
        if self.0.len() > MAX_IDENTITY_LEN {
            return Err(RelationshipError::invalid_identity(
                &self.0,
                "exceeds the maximum identity length",
            ));
        }
        Ok(())
    }

    /// Decodes a member read back from the store.
    pub(crate) fn from_member(member: Bytes) -> Result<Self> {
        let value = String::from_utf8(member.to_vec()).map_err(|e| {
            StoreError::serialization_with_source("stored member is not valid UTF-8", e)
        })?;
        Ok(Self(value))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Identity> for Identity {
    fn from(value: &Identity) -> Self {
        value.clone()
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Identity {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

impl_from_integer!(u32, u64, i32, i64);
