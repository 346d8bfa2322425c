use moneta_core::{AccountId, CanonicalTransaction, ImportId};
use moneta_ingest::{StorageError, TransactionStore};

use crate::db::{self, DbPool};

/// SQLite-backed implementation of the orchestrator's storage contract.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        SqliteStore { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl TransactionStore for SqliteStore {
    async fn create_import(
        &self,
        account_id: AccountId,
        filename: Option<&str>,
    ) -> Result<ImportId, StorageError> {
        db::create_data_import(&self.pool, account_id, filename)
            .await
            .map_err(|e| StorageError(e.into()))
    }

    async fn contains(&self, checksum: &str) -> Result<bool, StorageError> {
        db::transaction_exists(&self.pool, checksum)
            .await
            .map_err(|e| StorageError(e.into()))
    }

    async fn insert(
        &self,
        transaction: &CanonicalTransaction,
        import_id: ImportId,
    ) -> Result<(), StorageError> {
        db::insert_transaction(&self.pool, transaction, import_id)
            .await
            .map_err(|e| StorageError(e.into()))?;
        Ok(())
    }
}
