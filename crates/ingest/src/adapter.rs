use csv::StringRecord;
use moneta_core::{AccountId, CanonicalTransaction};
use std::io::Read;

use crate::error::{IngestError, RowError};
use crate::rules::TransferRule;

/// One institution's CSV dialect: header contract, row parsing, and
/// transfer-detection rules. Implementors are stateless unit structs
/// registered by key in [`crate::registry`].
pub trait InstitutionAdapter: Send + Sync {
    /// Registry key, also the `institution` column of accounts.
    fn key(&self) -> &'static str;

    /// Exact, case-sensitive column list of the institution's export.
    fn expected_header(&self) -> &'static [&'static str];

    /// How many non-tabular records may precede the header row. Bank of
    /// America checking exports open with a summary section; everyone else
    /// puts the header first.
    fn preamble_limit(&self) -> usize {
        0
    }

    fn transfer_rules(&self) -> &'static [TransferRule];

    /// Parse one data row into a canonical transaction with the amount sign
    /// already normalized (negative = money leaving the account).
    ///
    /// `Ok(None)` marks a documented no-op line (e.g. BofA's "Beginning
    /// balance" row); any error aborts the rest of the file.
    fn parse_row(
        &self,
        record: &StringRecord,
        account_id: AccountId,
    ) -> Result<Option<CanonicalTransaction>, RowError>;
}

/// Result of a whole-source ingest. `rows_seen` counts every non-blank data
/// record after the header, including no-op lines, so callers can report
/// totals honestly.
#[derive(Debug)]
pub struct ParsedStatement {
    pub transactions: Vec<CanonicalTransaction>,
    pub rows_seen: usize,
}

/// Ingest a full CSV source: locate and validate the header once, then parse
/// every subsequent row in file order. All-or-nothing — the first row-level
/// failure aborts with nothing returned.
pub fn ingest<R: Read>(
    adapter: &dyn InstitutionAdapter,
    source: R,
    account_id: AccountId,
) -> Result<ParsedStatement, IngestError> {
    // has_headers(false): header location is the adapter's contract, not the
    // csv crate's. flexible(true): preamble and summary records have varying
    // widths. Quoted fields with embedded newlines are handled by the reader.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    let mut records = reader.records();

    locate_header(adapter, &mut records)?;

    let mut transactions = Vec::new();
    let mut rows_seen = 0usize;
    for result in records.by_ref() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows_seen += 1;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        match adapter.parse_row(&record, account_id) {
            Ok(Some(tx)) => transactions.push(tx),
            Ok(None) => {
                tracing::debug!(institution = adapter.key(), line, "skipping no-op row");
            }
            Err(source) => {
                return Err(IngestError::Row {
                    line,
                    raw: record.iter().collect::<Vec<_>>().join(","),
                    source,
                });
            }
        }
    }

    tracing::info!(
        institution = adapter.key(),
        rows = rows_seen,
        transactions = transactions.len(),
        "parsed statement"
    );

    Ok(ParsedStatement {
        transactions,
        rows_seen,
    })
}

/// Scan up to `preamble_limit() + 1` records for an exact header match.
/// Failing fast here keeps a misrecognized file from being partially
/// ingested.
fn locate_header<R: Read>(
    adapter: &dyn InstitutionAdapter,
    records: &mut csv::StringRecordsIter<'_, R>,
) -> Result<(), IngestError> {
    let expected = adapter.expected_header();
    let mut first_seen: Option<Vec<String>> = None;

    for _ in 0..=adapter.preamble_limit() {
        let Some(result) = records.next() else {
            break;
        };
        let record = result?;
        if first_seen.is_none() {
            first_seen = Some(record.iter().map(|f| f.to_string()).collect());
        }
        if header_matches(&record, expected) {
            return Ok(());
        }
    }

    Err(IngestError::FormatMismatch {
        institution: adapter.key(),
        expected: expected.iter().map(|s| s.to_string()).collect(),
        found: first_seen.unwrap_or_default(),
    })
}

fn header_matches(record: &StringRecord, expected: &[&str]) -> bool {
    record.len() == expected.len()
        && record
            .iter()
            .zip(expected)
            .all(|(got, want)| got.trim() == *want)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowError;
    use moneta_core::{TransactionDraft, TransactionType};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    /// Minimal two-column dialect for driver-level tests.
    struct Toy;

    impl InstitutionAdapter for Toy {
        fn key(&self) -> &'static str {
            "toy"
        }

        fn expected_header(&self) -> &'static [&'static str] {
            &["Date", "Amount"]
        }

        fn transfer_rules(&self) -> &'static [TransferRule] {
            &[]
        }

        fn parse_row(
            &self,
            record: &StringRecord,
            account_id: AccountId,
        ) -> Result<Option<CanonicalTransaction>, RowError> {
            let date = crate::util::parse_date(crate::util::field(record, 0, "Date")?)?;
            let amount = crate::util::parse_amount(crate::util::field(record, 1, "Amount")?)?;
            CanonicalTransaction::validate(TransactionDraft {
                account_id,
                transaction_date: date,
                post_date: None,
                description: "toy row".to_string(),
                bank_category: None,
                amount,
                kind: TransactionType::Expense,
                metadata: BTreeMap::new(),
            })
            .map(Some)
            .map_err(RowError::from)
        }
    }

    #[test]
    fn ingest_parses_rows_in_order() {
        let data = "Date,Amount\n01/02/2024,-1.00\n01/03/2024,-2.00\n";
        let parsed = ingest(&Toy, data.as_bytes(), AccountId(1)).unwrap();
        assert_eq!(parsed.rows_seen, 2);
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.transactions[0].amount, Decimal::new(-100, 2));
        assert_eq!(parsed.transactions[1].amount, Decimal::new(-200, 2));
    }

    #[test]
    fn header_mismatch_fails_before_any_row() {
        let data = "Wrong,Header\n01/02/2024,-1.00\n";
        let err = ingest(&Toy, data.as_bytes(), AccountId(1)).unwrap_err();
        match err {
            IngestError::FormatMismatch { found, .. } => {
                assert_eq!(found, vec!["Wrong".to_string(), "Header".to_string()]);
            }
            other => panic!("expected FormatMismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_is_a_format_mismatch() {
        let err = ingest(&Toy, "".as_bytes(), AccountId(1)).unwrap_err();
        assert!(matches!(err, IngestError::FormatMismatch { .. }));
    }

    #[test]
    fn row_error_reports_line_and_raw_content() {
        let data = "Date,Amount\n01/02/2024,-1.00\nbogus,-2.00\n";
        let err = ingest(&Toy, data.as_bytes(), AccountId(1)).unwrap_err();
        match err {
            IngestError::Row { line, raw, source } => {
                assert_eq!(line, 3);
                assert_eq!(raw, "bogus,-2.00");
                assert!(matches!(source, RowError::InvalidDate(_)));
            }
            other => panic!("expected Row error, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_not_counted() {
        let data = "Date,Amount\n01/02/2024,-1.00\n\n,\n";
        let parsed = ingest(&Toy, data.as_bytes(), AccountId(1)).unwrap();
        assert_eq!(parsed.rows_seen, 1);
    }
}
