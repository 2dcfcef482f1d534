//! Service facade over the record store.
//!
//! Each API groups the store calls, row mapping and aggregation for one area
//! of the rulebook. None of them recover from store failures; errors are
//! returned to the caller as they arrive.

mod admin;
mod backup;
mod rules;
mod sections;

pub use admin::*;
pub use backup::*;
pub use rules::*;
pub use sections::*;

use std::sync::Arc;

use crate::store::RecordStore;

/// All service APIs sharing one store handle.
#[derive(Clone)]
pub struct Services {
    pub rules: RulesApi,
    pub sections: SectionsApi,
    pub admin: AdminApi,
    pub backups: BackupApi,
}

impl Services {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            rules: RulesApi::new(store.clone()),
            sections: SectionsApi::new(store.clone()),
            admin: AdminApi::new(store.clone()),
            backups: BackupApi::new(store),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::Services;
    use crate::store::{Filter, RecordStore, Row, Select, SqliteStore, StoreError, Table};

    /// Wraps a real store and injects failures or counts writes.
    pub struct FlakyStore {
        inner: Arc<dyn RecordStore>,
        pub fail_insert_into: Option<Table>,
        pub fail_filtered_select_on: Option<Table>,
        pub writes: AtomicUsize,
    }

    impl FlakyStore {
        pub fn new(inner: Arc<dyn RecordStore>) -> Self {
            Self {
                inner,
                fail_insert_into: None,
                fail_filtered_select_on: None,
                writes: AtomicUsize::new(0),
            }
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn injected(table: Table) -> StoreError {
            StoreError::Service {
                status: 503,
                code: None,
                message: format!("injected failure on {}", table),
            }
        }
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
            if query.filter.is_some() && self.fail_filtered_select_on == Some(query.table) {
                return Err(Self::injected(query.table));
            }
            self.inner.select(query).await
        }

        async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_insert_into == Some(table) {
                return Err(Self::injected(table));
            }
            self.inner.insert(table, row).await
        }

        async fn update(&self, table: Table, id: &str, changes: Row) -> Result<Row, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.update(table, id, changes).await
        }

        async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(table, filter).await
        }

        async fn count(&self, table: Table) -> Result<u64, StoreError> {
            self.inner.count(table).await
        }
    }

    pub async fn sqlite_store() -> (Arc<SqliteStore>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteStore::open(&temp_dir.path().join("rulebook.sqlite"))
            .await
            .expect("Failed to open store");
        (Arc::new(store), temp_dir)
    }

    pub async fn sqlite_services() -> (Services, TempDir) {
        let (store, temp_dir) = sqlite_store().await;
        (Services::new(store), temp_dir)
    }
}
