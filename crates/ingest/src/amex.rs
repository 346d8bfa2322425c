//! American Express card CSV. Quoted fields (notably `Extended Details`) may
//! contain embedded newlines; the csv reader folds them into one logical row.

use csv::StringRecord;
use moneta_core::{AccountId, CanonicalTransaction, TransactionDraft};
use std::collections::BTreeMap;

use crate::adapter::InstitutionAdapter;
use crate::error::RowError;
use crate::rules::{classify, RowFacts, RuleField, RuleMatch, TransferRule};
use crate::util::{field, optional_field, parse_amount, parse_date};

const HEADER: &[&str] = &[
    "Date",
    "Description",
    "Amount",
    "Extended Details",
    "Appears On Your Statement As",
    "Address",
    "City/State",
    "Zip Code",
    "Country",
    "Reference",
    "Category",
];

const TRANSFER_RULES: &[TransferRule] = &[TransferRule::new(
    RuleField::Description,
    RuleMatch::Contains,
    "AUTOPAY PAYMENT",
)];

pub struct Amex;

impl InstitutionAdapter for Amex {
    fn key(&self) -> &'static str {
        "amex"
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
        let date_str = field(record, 0, "Date")?;
        let description = field(record, 1, "Description")?;
        let amount_str = field(record, 2, "Amount")?;
        if date_str.is_empty() {
            return Err(RowError::MissingField("Date"));
        }
        if amount_str.is_empty() {
            return Err(RowError::MissingField("Amount"));
        }

        let transaction_date = parse_date(date_str)?;
        // Amex reports charges positive and payments negative; the canonical
        // sign convention is the opposite.
        let amount = -parse_amount(amount_str)?;

        let mut metadata = BTreeMap::new();
        let extended_details = optional_field(record, 3);
        if !extended_details.is_empty() {
            metadata.insert("extended_details".to_string(), extended_details.to_string());
        }
        let appears_as = optional_field(record, 4);
        if !appears_as.is_empty() && appears_as != description {
            metadata.insert("appears_as".to_string(), appears_as.to_string());
        }
        for (idx, key) in [
            (5, "address"),
            (6, "city_state"),
            (7, "zip_code"),
            (8, "country"),
        ] {
            let value = optional_field(record, idx);
            if !value.is_empty() {
                metadata.insert(key.to_string(), value.to_string());
            }
        }
        // Amex prefixes references with an apostrophe to defeat spreadsheet
        // number coercion.
        let reference = optional_field(record, 9).trim_start_matches('\'');
        if !reference.is_empty() {
            metadata.insert("reference".to_string(), reference.to_string());
        }

        let category = optional_field(record, 10);
        let facts = RowFacts {
            description,
            category: (!category.is_empty()).then_some(category),
            type_field: None,
        };
        let kind = classify(TRANSFER_RULES, &facts, amount);

        CanonicalTransaction::validate(TransactionDraft {
            account_id,
            transaction_date,
            post_date: None,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ingest;
    use crate::error::IngestError;
    use moneta_core::TransactionType;
    use rust_decimal::Decimal;

    const HEADER_LINE: &str = "Date,Description,Amount,Extended Details,Appears On Your Statement As,Address,City/State,Zip Code,Country,Reference,Category";

    fn source(rows: &str) -> String {
        format!("{HEADER_LINE}\n{rows}")
    }

    #[test]
    fn charge_is_negated_to_expense() {
        let data = source(
            "03/10/2024,WHOLE FOODS MKT,54.12,,WHOLE FOODS MKT,123 MAIN ST,AUSTIN TX,78701,UNITED STATES,'320240690,Merchandise & Supplies-Groceries\n",
        );
        let parsed = ingest(&Amex, data.as_bytes(), AccountId(7)).unwrap();
        let tx = &parsed.transactions[0];
        assert_eq!(tx.amount, Decimal::new(-5412, 2));
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.metadata.get("reference").unwrap(), "320240690");
        assert_eq!(tx.metadata.get("address").unwrap(), "123 MAIN ST");
        assert_eq!(
            tx.bank_category.as_deref(),
            Some("Merchandise & Supplies-Groceries")
        );
        // appears_as equals description, so it is not duplicated.
        assert!(!tx.metadata.contains_key("appears_as"));
    }

    #[test]
    fn autopay_payment_is_a_transfer() {
        let data = source("03/15/2024,AUTOPAY PAYMENT - THANK YOU,-250.00,,,,,,,,\n");
        let parsed = ingest(&Amex, data.as_bytes(), AccountId(7)).unwrap();
        let tx = &parsed.transactions[0];
        assert_eq!(tx.amount, Decimal::new(25000, 2));
        assert_eq!(tx.kind, TransactionType::Transfer);
    }

    #[test]
    fn plain_credit_is_income() {
        let data = source("03/16/2024,REFUND MERCHANT CREDIT,-19.99,,,,,,,,\n");
        let parsed = ingest(&Amex, data.as_bytes(), AccountId(7)).unwrap();
        assert_eq!(parsed.transactions[0].kind, TransactionType::Income);
        assert_eq!(parsed.transactions[0].amount, Decimal::new(1999, 2));
    }

    #[test]
    fn embedded_newline_in_extended_details_is_one_row() {
        let data = source(
            "03/10/2024,UNITED AIRLINES,412.60,\"UNITED AIRLINES\nTICKET 0167412345678\nFROM: AUS TO: SFO\",UNITED AIRLINES,,,,,'551234,Travel-Airline\n",
        );
        let parsed = ingest(&Amex, data.as_bytes(), AccountId(7)).unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.rows_seen, 1);
        let details = parsed.transactions[0].metadata.get("extended_details").unwrap();
        assert!(details.contains("TICKET 0167412345678"));
        assert!(details.contains('\n'));
    }

    #[test]
    fn wrong_header_is_rejected() {
        let data = "Trans. Date,Post Date,Description,Amount,Category\n03/10/2024,03/11/2024,X,1.00,Misc\n";
        assert!(matches!(
            ingest(&Amex, data.as_bytes(), AccountId(7)),
            Err(IngestError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn missing_amount_aborts_the_file() {
        let data = source("03/10/2024,SOMETHING,,,,,,,,,\n");
        let err = ingest(&Amex, data.as_bytes(), AccountId(7)).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Row {
                source: RowError::MissingField("Amount"),
                ..
            }
        ));
    }
}
