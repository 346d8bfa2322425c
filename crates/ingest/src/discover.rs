//! Discover card CSV. Charges are positive in the raw export and get negated
//! into the canonical sign convention.

use csv::StringRecord;
use moneta_core::{AccountId, CanonicalTransaction, TransactionDraft};
use std::collections::BTreeMap;

use crate::adapter::InstitutionAdapter;
use crate::error::RowError;
use crate::rules::{classify, RowFacts, RuleField, RuleMatch, TransferRule};
use crate::util::{field, parse_amount, parse_date};

const HEADER: &[&str] = &["Trans. Date", "Post Date", "Description", "Amount", "Category"];

const TRANSFER_RULES: &[TransferRule] = &[
    TransferRule::new(
        RuleField::Category,
        RuleMatch::Equals,
        "Payments and Credits",
    ),
    TransferRule::new(
        RuleField::Description,
        RuleMatch::Prefix,
        "DIRECTPAY FULL BALANCE",
    ),
];

pub struct Discover;

impl InstitutionAdapter for Discover {
    fn key(&self) -> &'static str {
        "discover"
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
        let trans_date_str = field(record, 0, "Trans. Date")?;
        let post_date_str = field(record, 1, "Post Date")?;
        let description = field(record, 2, "Description")?;
        let amount_str = field(record, 3, "Amount")?;
        let category = field(record, 4, "Category")?;

        if trans_date_str.is_empty() {
            return Err(RowError::MissingField("Trans. Date"));
        }
        if amount_str.is_empty() {
            return Err(RowError::MissingField("Amount"));
        }

        let transaction_date = parse_date(trans_date_str)?;
        let post_date = parse_date(post_date_str)?;
        // Discover reports charges positive; flip into the canonical sign.
        let amount = -parse_amount(amount_str)?;

        let facts = RowFacts {
            description,
            category: (!category.is_empty()).then_some(category),
            type_field: None,
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
            metadata: BTreeMap::new(),
        })
        .map(Some)
        .map_err(RowError::from)
    }
}
