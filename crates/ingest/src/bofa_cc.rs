//! Bank of America credit card CSV. Charges are negative and pass through;
//! positive amounts are card payments arriving from another account, so they
//! classify as transfers by sign rather than by a description rule.

use csv::StringRecord;
use moneta_core::{AccountId, CanonicalTransaction, TransactionDraft, TransactionType};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::adapter::InstitutionAdapter;
use crate::error::RowError;
use crate::rules::TransferRule;
use crate::util::{field, parse_amount, parse_date};

const HEADER: &[&str] = &[
    "Posted Date",
    "Reference Number",
    "Payee",
    "Address",
    "Amount",
];

pub struct BankOfAmericaCard;

impl InstitutionAdapter for BankOfAmericaCard {
    fn key(&self) -> &'static str {
        "bofacc"
    }

    fn expected_header(&self) -> &'static [&'static str] {
        HEADER
    }

    fn transfer_rules(&self) -> &'static [TransferRule] {
        &[]
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        account_id: AccountId,
    ) -> Result<Option<CanonicalTransaction>, RowError> {
        let date_str = field(record, 0, "Posted Date")?;
        let reference_number = field(record, 1, "Reference Number")?;
        let payee = field(record, 2, "Payee")?;
        let address = field(record, 3, "Address")?;
        let amount_str = field(record, 4, "Amount")?;

        if date_str.is_empty() {
            return Err(RowError::MissingField("Posted Date"));
        }
        if amount_str.is_empty() {
            return Err(RowError::MissingField("Amount"));
        }

        let transaction_date = parse_date(date_str)?;
        let amount = parse_amount(amount_str)?;

        let kind = if amount > Decimal::ZERO {
            TransactionType::Transfer
        } else {
            TransactionType::Expense
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("reference_number".to_string(), reference_number.to_string());
        metadata.insert("address".to_string(), address.to_string());

        CanonicalTransaction::validate(TransactionDraft {
            account_id,
            transaction_date,
            post_date: None,
            description: payee.to_string(),
            bank_category: None,
            amount,
            kind,
            metadata,
        })
        .map(Some)
        .map_err(RowError::from)
    }
}
