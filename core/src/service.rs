use anyhow::Error as AnyError;
use thiserror::Error;

use crate::{db::MembershipBackendRef, lookup::fetch_membership, membership::MembershipRecord};

/// Failure taxonomy for membership operations. `NotFound` is an expected
/// outcome of check and remove, distinguished from backend failures at
/// every layer so callers can branch on it without string comparison.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("user {user} is not a member of vault {vault}")]
    NotFound { vault: String, user: String },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] AnyError),
}

impl MembershipError {
    fn not_found(vault: &str, user: &str) -> Self {
        Self::NotFound {
            vault: vault.to_owned(),
            user: user.to_owned(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// The membership operations over an injected store backend.
///
/// Per `(vault, user)` pair a record is in one of three states: never
/// created, active, or inactive. Add moves any state to active, remove
/// moves an existing record to inactive, and check reports active records
/// only. The service holds no state of its own; concurrent operations on
/// the same pair interleave as read-then-write with last writer winning.
#[derive(Clone)]
pub struct MembershipService {
    backend: MembershipBackendRef,
}

impl MembershipService {
    pub fn new(backend: MembershipBackendRef) -> Self {
        Self { backend }
    }

    /// Grant membership. Idempotent: the record is upserted with
    /// `active = true` regardless of prior state, so re-adding a removed
    /// member reactivates the same record and adding an active member is a
    /// no-op success.
    pub async fn add(&self, vault: &str, user: &str) -> Result<(), MembershipError> {
        ensure_identifiers(vault, user)?;
        let record = MembershipRecord::active(vault, user);
        self.backend.put(&record).await?;
        Ok(())
    }

    /// Report whether the user is currently an active member. An inactive
    /// record reads the same as no record at all.
    pub async fn check(&self, vault: &str, user: &str) -> Result<MembershipRecord, MembershipError> {
        ensure_identifiers(vault, user)?;
        match fetch_membership(self.backend.as_ref(), vault, user).await? {
            Some(record) if record.active => Ok(record),
            _ => Err(MembershipError::not_found(vault, user)),
        }
    }

    /// Revoke membership. The record must already exist, active or not;
    /// it is overwritten with `active = false`, never deleted. Removing a
    /// user who was never added fails with `NotFound`.
    pub async fn remove(&self, vault: &str, user: &str) -> Result<(), MembershipError> {
        ensure_identifiers(vault, user)?;
        let mut record = fetch_membership(self.backend.as_ref(), vault, user)
            .await?
            .ok_or_else(|| MembershipError::not_found(vault, user))?;
        record.active = false;
        self.backend.put(&record).await?;
        Ok(())
    }
}

fn ensure_identifiers(vault: &str, user: &str) -> Result<(), MembershipError> {
    if vault.trim().is_empty() {
        return Err(MembershipError::Validation(
            "vault id must not be empty".to_owned(),
        ));
    }
    if user.trim().is_empty() {
        return Err(MembershipError::Validation(
            "user id must not be empty".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::{MembershipBackend, memory::MemoryMembershipStore};
    use crate::lookup::MembershipLookup;

    fn create_service() -> MembershipService {
        MembershipService::new(Arc::new(MemoryMembershipStore::default()))
    }

    async fn stored_record(
        service: &MembershipService,
        vault: &str,
        user: &str,
    ) -> Option<MembershipRecord> {
        let items = service
            .backend
            .query(&MembershipLookup::new(vault, user))
            .await
            .unwrap();
        items.into_iter().next()
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let service = create_service();
        service.add("v", "u").await.unwrap();
        service.add("v", "u").await.unwrap();

        let record = service.check("v", "u").await.unwrap();
        assert!(record.active);
    }

    #[tokio::test]
    async fn add_then_check_reports_member() {
        let service = create_service();
        service.add("v", "u").await.unwrap();

        let record = service.check("v", "u").await.unwrap();
        assert_eq!(record.vault.as_str(), "v");
        assert_eq!(record.user.as_str(), "u");
    }

    #[tokio::test]
    async fn check_without_add_is_not_found() {
        let service = create_service();
        let err = service.check("v", "u").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remove_without_add_is_not_found() {
        let service = create_service();
        let err = service.remove("v", "u").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn removed_member_reads_as_non_member_but_record_persists() {
        let service = create_service();
        service.add("v", "u").await.unwrap();
        service.remove("v", "u").await.unwrap();

        let err = service.check("v", "u").await.unwrap_err();
        assert!(err.is_not_found());

        let record = stored_record(&service, "v", "u").await.expect("record kept");
        assert!(!record.active);
    }

    #[tokio::test]
    async fn re_add_after_remove_reactivates() {
        let service = create_service();
        service.add("v", "u").await.unwrap();
        service.remove("v", "u").await.unwrap();
        service.add("v", "u").await.unwrap();

        let record = service.check("v", "u").await.unwrap();
        assert!(record.active);
    }

    #[tokio::test]
    async fn remove_of_inactive_record_succeeds() {
        let service = create_service();
        service.add("v", "u").await.unwrap();
        service.remove("v", "u").await.unwrap();

        // Only full absence is an error; an inactive record stays removable.
        service.remove("v", "u").await.unwrap();
        let record = stored_record(&service, "v", "u").await.expect("record kept");
        assert!(!record.active);
    }

    #[tokio::test]
    async fn memberships_are_isolated_per_vault() {
        let service = create_service();
        service.add("v1", "u").await.unwrap();
        service.add("v2", "u").await.unwrap();
        service.remove("v1", "u").await.unwrap();

        assert!(service.check("v1", "u").await.unwrap_err().is_not_found());
        assert!(service.check("v2", "u").await.unwrap().active);
    }

    #[tokio::test]
    async fn empty_identifiers_are_rejected() {
        let service = create_service();
        let err = service.add("", "u").await.unwrap_err();
        assert!(matches!(err, MembershipError::Validation(_)));

        let err = service.add("v", "  ").await.unwrap_err();
        assert!(matches!(err, MembershipError::Validation(_)));
    }
}
