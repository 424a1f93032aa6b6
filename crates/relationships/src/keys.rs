//! Relations and the key space they live in.
//!
//! Every identity owns one sorted set per [`Relation`], stored under
//! `{namespace}:{role}:{identity}`. The scheme is stable: changing the
//! namespace or a role segment orphans existing data.

use std::fmt;

use crate::{config::RelationshipConfig, identity::Identity};

/// One of the four per-identity sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Identities this identity follows.
    Following,
    /// Identities following this identity.
    Followers,
    /// Identities this identity has blocked.
    Blocked,
    /// Identities that this identity follows and that follow it back.
    Reciprocated,
}

impl Relation {
    /// All relations, in key-space order.
    pub const ALL: [Relation; 4] =
        [Relation::Following, Relation::Followers, Relation::Blocked, Relation::Reciprocated];

    /// Returns the role segment used when none is configured.
    #[must_use]
    pub const fn default_key(self) -> &'static str {
        match self {
            Self::Following => "following",
            Self::Followers => "followers",
            Self::Blocked => "blocked",
            Self::Reciprocated => "reciprocated",
        }
    }

    /// Returns the relation seen from the other side of an edge.
    ///
    /// `B ∈ Following(A)` exactly when `A ∈ Followers(B)`; blocked and
    /// reciprocated sets mirror themselves.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Following => Self::Followers,
            Self::Followers => Self::Following,
            Self::Blocked => Self::Blocked,
            Self::Reciprocated => Self::Reciprocated,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_key())
    }
}

/// Builds store keys from a validated [`RelationshipConfig`].
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefixes: [String; 4],
}

impl KeySpace {
    /// Precomputes the `{namespace}:{role}:` prefix of every relation.
    #[must_use]
    pub fn new(config: &RelationshipConfig) -> Self {
        let prefixes = Relation::ALL
            .map(|relation| format!("{}:{}:", config.namespace(), config.role_key(relation)));
        Self { prefixes }
    }

    /// Returns the key of `identity`'s set for `relation`.
    #[must_use]
    pub fn key(&self, relation: Relation, identity: &Identity) -> Vec<u8> {
        let prefix = &self.prefixes[relation as usize];
        let mut key = Vec::with_capacity(prefix.len() + identity.as_bytes().len());
        key.extend_from_slice(prefix.as_bytes());
        key.extend_from_slice(identity.as_bytes());
        key
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(&RelationshipConfig::default())
    }
}
