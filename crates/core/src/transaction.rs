use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::account::AccountId;
use super::checksum::transaction_checksum;

/// Reference to the import batch a transaction was ingested under. The batch
/// owns its transactions: deleting a batch cascades to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportId(pub i64);

impl fmt::Display for ImportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
            TransactionType::Transfer => write!(f, "transfer"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(ValidationError::UnknownTransactionType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Description is empty")]
    EmptyDescription,
    #[error("Unknown transaction type: '{0}'")]
    UnknownTransactionType(String),
}

/// Parsed row fields before validation and identity assignment. Adapters
/// build one of these per CSV row; `amount` must already carry the canonical
/// sign (negative = money leaving the account).
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub account_id: AccountId,
    pub transaction_date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    pub bank_category: Option<String>,
    pub amount: Decimal,
    pub kind: TransactionType,
    pub metadata: BTreeMap<String, String>,
}

/// The normalized transaction shape every institution adapter produces.
/// Immutable after construction; `checksum` is the deterministic identity
/// used as primary key and dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub checksum: String,
    pub account_id: AccountId,
    pub transaction_date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    pub bank_category: Option<String>,
    pub amount: Decimal,
    pub kind: TransactionType,
    pub metadata: BTreeMap<String, String>,
}

impl CanonicalTransaction {
    /// Normalize and validate a draft, then seal it with its checksum.
    ///
    /// Description whitespace is normalized here (trim + collapse runs to a
    /// single space) so every parse of the same source row feeds identical
    /// bytes into the identity hash.
    pub fn validate(draft: TransactionDraft) -> Result<CanonicalTransaction, ValidationError> {
        let description = normalize_whitespace(&draft.description);
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let checksum = transaction_checksum(
            draft.account_id,
            draft.transaction_date,
            draft.post_date,
            &description,
            draft.amount,
            &draft.metadata,
        );

        Ok(CanonicalTransaction {
            checksum,
            account_id: draft.account_id,
            transaction_date: draft.transaction_date,
            post_date: draft.post_date,
            description,
            bank_category: draft.bank_category,
            amount: draft.amount,
            kind: draft.kind,
            metadata: draft.metadata,
        })
    }
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
