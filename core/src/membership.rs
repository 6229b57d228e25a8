use serde::{Deserialize, Serialize};

use crate::ids::{UserId, VaultId};

/// Prefix namespacing vault membership records in the backing store. It
/// keeps the vault keyspace disjoint from any other entity type that may
/// later share the same store.
pub const VAULT_KEY_PREFIX: &str = "VAULT#";

/// A persisted vault membership. One record exists per `(vault, user)`
/// pair; removal flips `active` to `false` and never deletes the record,
/// so a later re-add reuses the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub vault: VaultId,
    pub user: UserId,
    pub active: bool,
}

impl MembershipRecord {
    /// Build a fresh active membership, the state written by an add.
    pub fn active(vault: impl Into<VaultId>, user: impl Into<UserId>) -> Self {
        Self {
            vault: vault.into(),
            user: user.into(),
            active: true,
        }
    }

    /// The composite key addressing this record in the store.
    pub fn key(&self) -> RecordKey {
        RecordKey::for_membership(self.vault.as_str(), self.user.as_str())
    }
}

/// Two-part composite key addressing a single record in the key-value
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub partition: String,
    pub sort: String,
}

impl RecordKey {
    /// Derive the key for a `(vault, user)` pair. Pure and deterministic.
    ///
    /// Identifiers are opaque and are not escaped beyond the fixed prefix,
    /// so callers must not use identifiers that collide after prefixing.
    pub fn for_membership(vault: &str, user: &str) -> Self {
        Self {
            partition: format!("{VAULT_KEY_PREFIX}{vault}"),
            sort: user.to_owned(),
        }
    }
}
