//! moneta-ingest: per-institution CSV adapters, the adapter registry, and the
//! import orchestrator that turns statements into deduplicated canonical
//! transactions.

pub mod adapter;
pub mod amex;
pub mod bofa;
pub mod bofa_cc;
pub mod chase;
pub mod discover;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod rules;
pub(crate) mod util;

pub use adapter::{ingest, InstitutionAdapter, ParsedStatement};
pub use error::{IngestError, RowError};
pub use orchestrator::{run_import, ImportError, ImportSummary, StorageError, TransactionStore};
pub use registry::{available, lookup};
pub use rules::{classify, is_transfer, RowFacts, RuleField, RuleMatch, TransferRule};
