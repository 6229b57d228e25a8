use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::{
    config::{AppConfig, StoreBackend},
    lookup::MembershipLookup,
    membership::MembershipRecord,
};

pub mod memory;
pub mod rocks;

/// Storage collaborator for membership records. The service requires
/// exactly two primitives from its backend; transactions, batches, and
/// secondary indexes are out of contract.
#[async_trait]
pub trait MembershipBackend: Send + Sync {
    /// Idempotent upsert keyed by the record's derived key. Overwrites any
    /// existing record with the same key.
    async fn put(&self, record: &MembershipRecord) -> Result<()>;

    /// Return the (possibly empty) set of items matching an equality
    /// condition on the lookup's partition and sort key, honoring its
    /// limit.
    async fn query(&self, lookup: &MembershipLookup) -> Result<Vec<MembershipRecord>>;
}

pub type MembershipBackendRef = Arc<dyn MembershipBackend>;

#[derive(Clone)]
pub struct Database {
    backend: MembershipBackendRef,
}

impl Database {
    pub fn connect(config: &AppConfig) -> Result<Self> {
        let backend: MembershipBackendRef = match config.store_backend {
            StoreBackend::Memory => {
                info!("using in-memory membership store");
                Arc::new(memory::MemoryMembershipStore::default())
            }
            StoreBackend::RocksDb => {
                let path = Self::resolve_store_path(&config.store_path)?;
                info!(path = %path.display(), "opening rocksdb membership store");
                Arc::new(rocks::RocksMembershipStore::open(&path)?)
            }
        };

        Ok(Self { backend })
    }

    pub fn membership_backend(&self) -> MembershipBackendRef {
        self.backend.clone()
    }

    fn resolve_store_path(path: &str) -> Result<PathBuf> {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            Ok(path)
        } else {
            let cwd = std::env::current_dir().context("failed to obtain current directory")?;
            Ok(cwd.join(path))
        }
    }
}
