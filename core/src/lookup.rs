use anyhow::Result;

use crate::{
    db::MembershipBackend,
    membership::{MembershipRecord, RecordKey},
};

/// A single-item equality lookup against the membership store: both key
/// parts must match, and at most `limit` items are requested.
#[derive(Debug, Clone)]
pub struct MembershipLookup {
    pub key: RecordKey,
    pub limit: usize,
}

impl MembershipLookup {
    pub fn new(vault: &str, user: &str) -> Self {
        Self {
            key: RecordKey::for_membership(vault, user),
            limit: 1,
        }
    }
}

/// Fetch the membership record for a `(vault, user)` pair, if one exists.
///
/// `Ok(None)` is the distinguished not-found outcome; backend failures
/// propagate as errors and are never conflated with an absent record.
pub async fn fetch_membership(
    backend: &dyn MembershipBackend,
    vault: &str,
    user: &str,
) -> Result<Option<MembershipRecord>> {
    let lookup = MembershipLookup::new(vault, user);
    let items = backend.query(&lookup).await?;
    Ok(interpret_items(items))
}

/// Interpret the item set returned by a backend query.
///
/// The key invariant guarantees at most one item; should a backend ever
/// return more, the first is taken and the rest ignored.
pub fn interpret_items(items: Vec<MembershipRecord>) -> Option<MembershipRecord> {
    items.into_iter().next()
}
