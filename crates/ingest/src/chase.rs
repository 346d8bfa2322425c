//! Chase credit card CSV. Charges are negative and pass through; the export
//! carries both a transaction and a post date plus a native `Type` column.

use csv::StringRecord;
use moneta_core::{AccountId, CanonicalTransaction, TransactionDraft};
use std::collections::BTreeMap;

use crate::adapter::InstitutionAdapter;
use crate::error::RowError;
use crate::rules::{classify, RowFacts, RuleField, RuleMatch, TransferRule};
use crate::util::{field, optional_field, parse_amount, parse_date};

const HEADER: &[&str] = &[
    "Transaction Date",
    "Post Date",
    "Description",
    "Category",
    "Type",
    "Amount",
    "Memo",
];

const TRANSFER_RULES: &[TransferRule] = &[
    TransferRule::new(RuleField::TypeField, RuleMatch::Equals, "Payment"),
    TransferRule::new(
        RuleField::Description,
        RuleMatch::Contains,
        "AUTOMATIC PAYMENT",
    ),
];

pub struct Chase;

impl InstitutionAdapter for Chase {
    fn key(&self) -> &'static str {
        "chase"
    }

    fn expected_header(&self) -> &'static [&'static str] {
        HEADER
    }

    fn transfer_rules(&self) -> &'static [TransferRule] {
        TRANSFER_RULES
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        account_id: AccountId,
    ) -> Result<Option<CanonicalTransaction>, RowError> {
        let trans_date_str = field(record, 0, "Transaction Date")?;
        let post_date_str = field(record, 1, "Post Date")?;
        let description = field(record, 2, "Description")?;
        let category = field(record, 3, "Category")?;
        let type_field = field(record, 4, "Type")?;
        let amount_str = field(record, 5, "Amount")?;
        let memo = optional_field(record, 6);

        if trans_date_str.is_empty() {
            return Err(RowError::MissingField("Transaction Date"));
        }
        if amount_str.is_empty() {
            return Err(RowError::MissingField("Amount"));
        }

        let transaction_date = parse_date(trans_date_str)?;
        let post_date = parse_date(post_date_str)?;
        let amount = parse_amount(amount_str)?;

        let mut metadata = BTreeMap::new();
        if !memo.is_empty() {
            metadata.insert("memo".to_string(), memo.to_string());
        }

        let facts = RowFacts {
            description,
            category: (!category.is_empty()).then_some(category),
            type_field: Some(type_field),
        };
        let kind = classify(TRANSFER_RULES, &facts, amount);

        CanonicalTransaction::validate(TransactionDraft {
            account_id,
            transaction_date,
            post_date: Some(post_date),
            description: description.to_string(),
            bank_category: (!category.is_empty()).then(|| category.to_string()),
            amount,
            kind,
            metadata,
        })
        .map(Some)
        .map_err(RowError::from)
    }
}
