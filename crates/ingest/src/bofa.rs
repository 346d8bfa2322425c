//! Bank of America checking/savings CSV. Exports open with a short summary
//! section before the real header; the driver scans past it. Amounts already
//! carry the canonical sign (negative = outgoing).

use csv::StringRecord;
use moneta_core::{AccountId, CanonicalTransaction, TransactionDraft};
use std::collections::BTreeMap;

use crate::adapter::InstitutionAdapter;
use crate::error::RowError;
use crate::rules::{classify, RowFacts, RuleField, RuleMatch, TransferRule};
use crate::util::{field, parse_amount, parse_date};

const HEADER: &[&str] = &["Date", "Description", "Amount", "Running Bal."];

/// The documented summary block is 6 lines; the bound only guards against
/// scanning an unrecognized file forever.
const PREAMBLE_LIMIT: usize = 16;

/// Known credit-card payment markers: each is the ACH descriptor another card
/// issuer stamps on the checking-side leg of an autopay pull.
const TRANSFER_RULES: &[TransferRule] = &[
    TransferRule::new(
        RuleField::Description,
        RuleMatch::Contains,
        "DISCOVER DES:E-PAYMENT",
    ),
    TransferRule::new(
        RuleField::Description,
        RuleMatch::Contains,
        "CHASE CREDIT CRD DES:AUTOPAY",
    ),
    TransferRule::new(
        RuleField::Description,
        RuleMatch::Contains,
        "AMERICAN EXPRESS DES:ACH PMT",
    ),
];

pub struct BankOfAmerica;

impl InstitutionAdapter for BankOfAmerica {
    fn key(&self) -> &'static str {
        "bofa"
    }

    fn expected_header(&self) -> &'static [&'static str] {
        HEADER
    }

    fn preamble_limit(&self) -> usize {
        PREAMBLE_LIMIT
    }

    fn transfer_rules(&self) -> &'static [TransferRule] {
        TRANSFER_RULES
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        account_id: AccountId,
    ) -> Result<Option<CanonicalTransaction>, RowError> {
        let date_str = field(record, 0, "Date")?;
        let description = field(record, 1, "Description")?;
        let amount_str = field(record, 2, "Amount")?;
        let running_balance = field(record, 3, "Running Bal.")?;

        if amount_str.is_empty() {
            // The first data row is a balance marker, not a transaction.
            if description.starts_with("Beginning balance") {
                return Ok(None);
            }
            return Err(RowError::MissingField("Amount"));
        }
        if date_str.is_empty() {
            return Err(RowError::MissingField("Date"));
        }

        let transaction_date = parse_date(date_str)?;
        let amount = parse_amount(amount_str)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("running_balance".to_string(), running_balance.to_string());

        let facts = RowFacts {
            description,
            category: None,
            type_field: None,
        };
        let kind = classify(TRANSFER_RULES, &facts, amount);

        CanonicalTransaction::validate(TransactionDraft {
            account_id,
            transaction_date,
            post_date: None,
            description: description.to_string(),
            bank_category: None,
            amount,
            kind,
            metadata,
        })
        .map(Some)
        .map_err(RowError::from)
    }
}
