use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use super::MembershipBackend;
use crate::{lookup::MembershipLookup, membership::MembershipRecord};

/// In-memory membership store, used by tests and `store_backend = "memory"`.
#[derive(Default)]
pub struct MemoryMembershipStore {
    records: DashMap<(String, String), MembershipRecord>,
}

#[async_trait]
impl MembershipBackend for MemoryMembershipStore {
    async fn put(&self, record: &MembershipRecord) -> Result<()> {
        let key = record.key();
        self.records
            .insert((key.partition, key.sort), record.clone());
        Ok(())
    }

    async fn query(&self, lookup: &MembershipLookup) -> Result<Vec<MembershipRecord>> {
        let key = (lookup.key.partition.clone(), lookup.key.sort.clone());
        let mut items = Vec::new();
        if let Some(entry) = self.records.get(&key) {
            items.push(entry.value().clone());
        }
        items.truncate(lookup.limit);
        Ok(items)
    }
}
