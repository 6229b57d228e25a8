use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, DBCompressionType, DEFAULT_COLUMN_FAMILY_NAME,
    Direction, IteratorMode, Options,
};

use super::MembershipBackend;
use crate::{
    lookup::MembershipLookup,
    membership::{MembershipRecord, RecordKey},
};

/// RocksDB-backed membership store. Records are JSON-encoded under a
/// composite key of the partition and sort parts separated by a NUL byte,
/// which cannot appear in either part.
pub struct RocksMembershipStore {
    db: DB,
    path: PathBuf,
}

const KEY_SEPARATOR: u8 = 0;

impl RocksMembershipStore {
    pub const MEMBERSHIP_CF: &'static str = "memberships";

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create membership store directory at {}",
                    parent.display()
                )
            })?;
        }

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_compression_type(DBCompressionType::Lz4);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(DBCompressionType::Lz4);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(DEFAULT_COLUMN_FAMILY_NAME, cf_opts.clone()),
            ColumnFamilyDescriptor::new(Self::MEMBERSHIP_CF, cf_opts),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors).with_context(|| {
            format!(
                "failed to open rocksdb membership store at {}",
                path.display()
            )
        })?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn memberships_cf(&self) -> &ColumnFamily {
        self.db
            .cf_handle(Self::MEMBERSHIP_CF)
            .expect("memberships column family present")
    }

    fn record_key(key: &RecordKey) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(key.partition.len() + key.sort.len() + 1);
        bytes.extend_from_slice(key.partition.as_bytes());
        bytes.push(KEY_SEPARATOR);
        bytes.extend_from_slice(key.sort.as_bytes());
        bytes
    }

    fn partition_prefix(partition: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(partition.len() + 1);
        bytes.extend_from_slice(partition.as_bytes());
        bytes.push(KEY_SEPARATOR);
        bytes
    }
}

#[async_trait]
impl MembershipBackend for RocksMembershipStore {
    async fn put(&self, record: &MembershipRecord) -> Result<()> {
        let key = Self::record_key(&record.key());
        let value = serde_json::to_vec(record).context("failed to encode membership record")?;
        self.db
            .put_cf(self.memberships_cf(), key, value)
            .context("failed to write membership record")
    }

    async fn query(&self, lookup: &MembershipLookup) -> Result<Vec<MembershipRecord>> {
        let prefix = Self::partition_prefix(&lookup.key.partition);
        let mut items = Vec::new();
        let iter = self.db.iterator_cf(
            self.memberships_cf(),
            IteratorMode::From(&prefix, Direction::Forward),
        );
        for entry in iter {
            let (key, value) = entry?;
            if !key.starts_with(&prefix) {
                break;
            }
            if key[prefix.len()..] != *lookup.key.sort.as_bytes() {
                continue;
            }
            let record: MembershipRecord =
                serde_json::from_slice(&value).context("failed to decode membership record")?;
            items.push(record);
            if items.len() >= lookup.limit {
                break;
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (TempDir, RocksMembershipStore) {
        let dir = TempDir::new().expect("create temp dir");
        let store = RocksMembershipStore::open(dir.path().join("membership-kv")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_and_query_round_trip() {
        let (_dir, store) = create_store();
        let record = MembershipRecord::active("vault-a", "user-a");
        store.put(&record).await.unwrap();

        let items = store
            .query(&MembershipLookup::new("vault-a", "user-a"))
            .await
            .unwrap();
        assert_eq!(items, vec![record]);
    }

    #[tokio::test]
    async fn query_misses_absent_record() {
        let (_dir, store) = create_store();
        let items = store
            .query(&MembershipLookup::new("vault-a", "user-a"))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn put_overwrites_record_with_same_key() {
        let (_dir, store) = create_store();
        store
            .put(&MembershipRecord::active("vault-a", "user-a"))
            .await
            .unwrap();

        let mut removed = MembershipRecord::active("vault-a", "user-a");
        removed.active = false;
        store.put(&removed).await.unwrap();

        let items = store
            .query(&MembershipLookup::new("vault-a", "user-a"))
            .await
            .unwrap();
        assert_eq!(items, vec![removed]);
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let (_dir, store) = create_store();
        store
            .put(&MembershipRecord::active("vault-a", "user-a"))
            .await
            .unwrap();
        store
            .put(&MembershipRecord::active("vault-b", "user-a"))
            .await
            .unwrap();

        let items = store
            .query(&MembershipLookup::new("vault-a", "user-a"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].vault.as_str(), "vault-a");
    }

    #[tokio::test]
    async fn sort_key_must_match_exactly() {
        let (_dir, store) = create_store();
        store
            .put(&MembershipRecord::active("vault-a", "user-ab"))
            .await
            .unwrap();

        let items = store
            .query(&MembershipLookup::new("vault-a", "user-a"))
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
