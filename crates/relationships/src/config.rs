//! Configuration for the relationship engine.
//!
//! [`RelationshipConfig`] names the sets the engine writes to, picks the
//! default page size, and chooses how multi-set mutations reach the store
//! ([`WriteMode`]). It can be built in code through the generated builder or
//! deserialized from any serde format; deserialized values are validated when
//! the engine is constructed.

use serde::{Deserialize, Serialize};
use socialgraph_store::{ConfigError, DEFAULT_MAX_KEY_SIZE};

use crate::{error::Result, identity::MAX_IDENTITY_LEN, keys::Relation};

/// Longest accepted namespace or role segment, in bytes.
pub const MAX_SEGMENT_LEN: usize = (DEFAULT_MAX_KEY_SIZE - MAX_IDENTITY_LEN) / 2 - 1;

/// Default key namespace.
const DEFAULT_NAMESPACE: &str = "socialgraph";

/// Default number of identities per page.
const DEFAULT_PAGE_SIZE: u64 = 25;

/// How a mutation that touches several sets is sent to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Every write of one operation is buffered in a store pipeline and
    /// committed atomically. Reads needed to decide the writes happen first.
    #[default]
    Pipelined,
    /// Writes are issued one primitive at a time, in an order that never lets
    /// the reciprocated sets claim more than the following sets support.
    Sequential,
}

/// Configuration for [`RelationshipEngine`](crate::RelationshipEngine).
///
/// # Example
///
/// ```
/// use socialgraph::{RelationshipConfig, WriteMode};
///
/// let config = RelationshipConfig::builder()
///     .namespace("social")
///     .page_size(10)
///     .write_mode(WriteMode::Sequential)
///     .build()?;
///
/// assert_eq!(config.namespace(), "social");
/// assert_eq!(config.page_size(), 10);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipConfig {
    /// Prefix shared by every key the engine writes.
    #[serde(default = "default_namespace")]
    pub(crate) namespace: String,

    /// Role segment of the following sets.
    #[serde(default = "default_following_key")]
    pub(crate) following_key: String,

    /// Role segment of the followers sets.
    #[serde(default = "default_followers_key")]
    pub(crate) followers_key: String,

    /// Role segment of the blocked sets.
    #[serde(default = "default_blocked_key")]
    pub(crate) blocked_key: String,

    /// Role segment of the reciprocated sets.
    #[serde(default = "default_reciprocated_key")]
    pub(crate) reciprocated_key: String,

    /// Page size used by [`Page::first`](crate::Page::first) and the page count helpers.
    #[serde(default = "default_page_size")]
    pub(crate) page_size: u64,

    /// How multi-set mutations are written.
    #[serde(default)]
    pub(crate) write_mode: WriteMode,

    /// Read the nearest valid page instead of rejecting page 0 or returning
    /// nothing past the end.
    #[serde(default)]
    pub(crate) clamp_pages: bool,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

fn default_following_key() -> String {
    Relation::Following.default_key().to_owned()
}

fn default_followers_key() -> String {
    Relation::Followers.default_key().to_owned()
}

fn default_blocked_key() -> String {
    Relation::Blocked.default_key().to_owned()
}

fn default_reciprocated_key() -> String {
    Relation::Reciprocated.default_key().to_owned()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            following_key: default_following_key(),
            followers_key: default_followers_key(),
            blocked_key: default_blocked_key(),
            reciprocated_key: default_reciprocated_key(),
            page_size: default_page_size(),
            write_mode: WriteMode::default(),
            clamp_pages: false,
        }
    }
}

#[bon::bon]
impl RelationshipConfig {
    /// Creates a new configuration, validating every field.
    ///
    /// # Optional Fields
    ///
    /// * `namespace` - Key prefix (default: `socialgraph`).
    /// * `following_key`, `followers_key`, `blocked_key`, `reciprocated_key` - Role
    ///   segments (default: the relation names).
    /// * `page_size` - Default page size (default: 25).
    /// * `write_mode` - [`WriteMode`] (default: `Pipelined`).
    /// * `clamp_pages` - Clamp out-of-range pages (default: false).
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::Config`](crate::RelationshipError::Config) if:
    /// - The namespace or a role segment is empty or contains `:`
    /// - Two role segments are equal
    /// - `page_size` is zero
    #[builder]
    pub fn new(
        #[builder(into, default = default_namespace())] namespace: String,
        #[builder(into, default = default_following_key())] following_key: String,
        #[builder(into, default = default_followers_key())] followers_key: String,
        #[builder(into, default = default_blocked_key())] blocked_key: String,
        #[builder(into, default = default_reciprocated_key())] reciprocated_key: String,
        #[builder(default = default_page_size())] page_size: u64,
        #[builder(default)] write_mode: WriteMode,
        #[builder(default)] clamp_pages: bool,
    ) -> Result<Self> {
        let config = Self {
            namespace,
            following_key,
            followers_key,
            blocked_key,
            reciprocated_key,
            page_size,
            write_mode,
            clamp_pages,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants [`new`](Self::new) enforces.
    ///
    /// Deserialized configurations skip the builder, so the engine calls this
    /// again before using one.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_segment("namespace", &self.namespace)?;

        let roles = self.role_keys();
        for (field, value) in roles {
            validate_segment(field, value)?;
        }
        for (i, &(field, value)) in roles.iter().enumerate() {
            if let Some(&(other, _)) = roles[i + 1..].iter().find(|&&(_, v)| v == value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value:?} is also used by {other}"),
                });
            }
        }

        if self.page_size < 1 {
            return Err(ConfigError::BelowMinimum {
                field: "page_size",
                min: "1".into(),
                value: self.page_size.to_string(),
            });
        }
        Ok(())
    }

    /// Returns the key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the role segment configured for `relation`.
    #[must_use]
    pub fn role_key(&self, relation: Relation) -> &str {
        match relation {
            Relation::Following => &self.following_key,
            Relation::Followers => &self.followers_key,
            Relation::Blocked => &self.blocked_key,
            Relation::Reciprocated => &self.reciprocated_key,
        }
    }

    /// Returns the default page size.
    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Returns the write mode.
    #[must_use]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Returns whether out-of-range pages are clamped.
    #[must_use]
    pub fn clamp_pages(&self) -> bool {
        self.clamp_pages
    }

    fn role_keys(&self) -> [(&'static str, &str); 4] {
        [
            ("following_key", &self.following_key),
            ("followers_key", &self.followers_key),
            ("blocked_key", &self.blocked_key),
            ("reciprocated_key", &self.reciprocated_key),
        ]
    }
}

fn validate_segment(field: &'static str, value: &str) -> std::result::Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid { field, reason: "must not be empty".into() });
    }
    if value.len() > MAX_SEGMENT_LEN {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{} bytes exceeds the limit of {MAX_SEGMENT_LEN}", value.len()),
        });
    }
    if value.contains(':') {
        return Err(ConfigError::Invalid { field, reason: format!("{value:?} contains ':'") });
    }
    Ok(())
}
