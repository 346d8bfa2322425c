pub mod account;
pub mod checksum;
pub mod transaction;

pub use account::{Account, AccountId};
pub use transaction::{
    CanonicalTransaction, ImportId, TransactionDraft, TransactionType, ValidationError,
};
