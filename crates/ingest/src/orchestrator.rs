//! Whole-file import: adapter resolution, parsing, identity-based dedup, and
//! handoff to the storage collaborator.

use moneta_core::{AccountId, CanonicalTransaction, ImportId};
use serde::Serialize;
use std::io::Read;
use thiserror::Error;

use crate::adapter::ingest;
use crate::error::IngestError;
use crate::registry;

/// Failure inside the storage collaborator. Implementations wrap their native
/// error type (sqlx, etc.) via anyhow so the orchestrator stays backend-free.
#[derive(Error, Debug)]
#[error("Storage error: {0}")]
pub struct StorageError(#[from] pub anyhow::Error);

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Storage collaborator contract. Each insert must be effectively atomic per
/// checksum so that two processes importing the same file cannot both write a
/// row (the SQLite implementation relies on the checksum primary key).
#[allow(async_fn_in_trait)]
pub trait TransactionStore {
    /// Open a new import batch for an account. Deleting the batch later must
    /// cascade to every transaction inserted under it.
    async fn create_import(
        &self,
        account_id: AccountId,
        filename: Option<&str>,
    ) -> Result<ImportId, StorageError>;

    /// Whether a transaction with this identity is already present.
    async fn contains(&self, checksum: &str) -> Result<bool, StorageError>;

    async fn insert(
        &self,
        transaction: &CanonicalTransaction,
        import_id: ImportId,
    ) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Data records scanned after the header, no-op lines included.
    pub total: usize,
    pub inserted: usize,
    /// Records skipped because their identity was already stored.
    pub skipped: usize,
}

/// Run one import: resolve the institution's adapter, parse the whole source
/// (all-or-nothing), then insert each new record under a fresh batch.
///
/// The batch is created only after parsing succeeds, so a malformed file
/// writes nothing. A storage failure aborts the remainder of the batch;
/// retrying the whole file is safe because dedup by checksum is idempotent.
pub async fn run_import<R, S>(
    store: &S,
    source: R,
    account_id: AccountId,
    institution: &str,
    filename: Option<&str>,
) -> Result<ImportSummary, ImportError>
where
    R: Read,
    S: TransactionStore,
{
    let adapter = registry::lookup(institution)?;
    let parsed = ingest(adapter, source, account_id)?;

    let import_id = store.create_import(account_id, filename).await?;

    let mut inserted = 0;
    let mut skipped = 0;
    for tx in &parsed.transactions {
        if store.contains(&tx.checksum).await? {
            tracing::debug!(checksum = %tx.checksum, "duplicate transaction skipped");
            skipped += 1;
            continue;
        }
        store.insert(tx, import_id).await?;
        inserted += 1;
    }

    let summary = ImportSummary {
        total: parsed.rows_seen,
        inserted,
        skipped,
    };
    tracing::info!(
        institution,
        account = %account_id,
        import = %import_id,
        total = summary.total,
        inserted = summary.inserted,
        skipped = summary.skipped,
        "import complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryInner>,
    }

    #[derive(Default)]
    struct MemoryInner {
        next_import: i64,
        transactions: HashMap<String, (CanonicalTransaction, ImportId)>,
    }

    impl TransactionStore for MemoryStore {
        async fn create_import(
            &self,
            _account_id: AccountId,
            _filename: Option<&str>,
        ) -> Result<ImportId, StorageError> {
            let mut inner = self.inner.lock().unwrap();
            inner.next_import += 1;
            Ok(ImportId(inner.next_import))
        }

        async fn contains(&self, checksum: &str) -> Result<bool, StorageError> {
            Ok(self.inner.lock().unwrap().transactions.contains_key(checksum))
        }

        async fn insert(
            &self,
            transaction: &CanonicalTransaction,
            import_id: ImportId,
        ) -> Result<(), StorageError> {
            self.inner
                .lock()
                .unwrap()
                .transactions
                .insert(transaction.checksum.clone(), (transaction.clone(), import_id));
            Ok(())
        }
    }

    /// Store whose inserts fail after a threshold, for abort-path tests.
    struct FlakyStore {
        inner: MemoryStore,
        allowed_inserts: Mutex<usize>,
    }

    impl TransactionStore for FlakyStore {
        async fn create_import(
            &self,
            account_id: AccountId,
            filename: Option<&str>,
        ) -> Result<ImportId, StorageError> {
            self.inner.create_import(account_id, filename).await
        }

        async fn contains(&self, checksum: &str) -> Result<bool, StorageError> {
            self.inner.contains(checksum).await
        }

        async fn insert(
            &self,
            transaction: &CanonicalTransaction,
            import_id: ImportId,
        ) -> Result<(), StorageError> {
            let mut allowed = self.allowed_inserts.lock().unwrap();
            if *allowed == 0 {
                return Err(StorageError(anyhow!("disk full")));
            }
            *allowed -= 1;
            drop(allowed);
            self.inner.insert(transaction, import_id).await
        }
    }

    const CHASE_FILE: &str = "\
Transaction Date,Post Date,Description,Category,Type,Amount,Memo
03/02/2024,03/04/2024,STARBUCKS #1234,Food & Drink,Sale,-6.45,
03/10/2024,03/10/2024,AUTOMATIC PAYMENT - THANK,,Payment,420.00,
03/12/2024,03/13/2024,NETFLIX.COM,Entertainment,Sale,-15.49,
";

    #[tokio::test]
    async fn first_import_inserts_everything() {
        let store = MemoryStore::default();
        let summary = run_import(
            &store,
            CHASE_FILE.as_bytes(),
            AccountId(1),
            "chase",
            Some("chase-march.csv"),
        )
        .await
        .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                total: 3,
                inserted: 3,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn reimport_is_idempotent() {
        let store = MemoryStore::default();
        run_import(&store, CHASE_FILE.as_bytes(), AccountId(1), "chase", None)
            .await
            .unwrap();
        let second = run_import(&store, CHASE_FILE.as_bytes(), AccountId(1), "chase", None)
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(store.inner.lock().unwrap().transactions.len(), 3);
    }

    #[tokio::test]
    async fn same_file_under_another_account_is_not_a_duplicate() {
        let store = MemoryStore::default();
        run_import(&store, CHASE_FILE.as_bytes(), AccountId(1), "chase", None)
            .await
            .unwrap();
        let other = run_import(&store, CHASE_FILE.as_bytes(), AccountId(2), "chase", None)
            .await
            .unwrap();
        assert_eq!(other.inserted, 3);
    }

    #[tokio::test]
    async fn unknown_institution_fails_before_storage() {
        let store = MemoryStore::default();
        let err = run_import(&store, CHASE_FILE.as_bytes(), AccountId(1), "hsbc", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Ingest(IngestError::UnknownInstitution(_))
        ));
        assert_eq!(store.inner.lock().unwrap().next_import, 0);
    }

    #[tokio::test]
    async fn parse_failure_creates_no_batch() {
        let store = MemoryStore::default();
        let bad = "\
Transaction Date,Post Date,Description,Category,Type,Amount,Memo
03/02/2024,03/04/2024,STARBUCKS,Food & Drink,Sale,not-money,
";
        let err = run_import(&store, bad.as_bytes(), AccountId(1), "chase", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Ingest(IngestError::Row { .. })));
        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.next_import, 0);
        assert!(inner.transactions.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_aborts_and_retry_completes() {
        let store = FlakyStore {
            inner: MemoryStore::default(),
            allowed_inserts: Mutex::new(2),
        };
        let err = run_import(&store, CHASE_FILE.as_bytes(), AccountId(1), "chase", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Storage(_)));
        assert_eq!(store.inner.inner.lock().unwrap().transactions.len(), 2);

        // Retrying the whole file picks up only what is missing.
        *store.allowed_inserts.lock().unwrap() = usize::MAX;
        let retry = run_import(&store, CHASE_FILE.as_bytes(), AccountId(1), "chase", None)
            .await
            .unwrap();
        assert_eq!(retry.inserted, 1);
        assert_eq!(retry.skipped, 2);
    }
}
