use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::RowError;

/// The date format every supported institution exports: MM/DD/YYYY.
const DATE_FORMAT: &str = "%m/%d/%Y";

pub fn parse_date(s: &str) -> Result<NaiveDate, RowError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| RowError::InvalidDate(s.trim().to_string()))
}

/// Parse a bank-reported amount in its raw sign convention. Strips thousands
/// separators, currency symbols and spaces; accepts accounting parentheses
/// for negatives.
pub fn parse_amount(s: &str) -> Result<Decimal, RowError> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let cleaned = s.replace([',', '$', ' '], "");
    let mut dec =
        Decimal::from_str(&cleaned).map_err(|_| RowError::InvalidAmount(s.to_string()))?;
    if negative {
        dec = -dec;
    }
    Ok(dec)
}

/// Fetch a required column from a record, trimmed. A short row surfaces as a
/// missing-field error naming the column.
pub fn field<'a>(
    record: &'a StringRecord,
    idx: usize,
    name: &'static str,
) -> Result<&'a str, RowError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or(RowError::MissingField(name))
}

/// Fetch an optional trailing column, trimmed; absent columns read as empty.
pub fn optional_field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_plain() {
        assert_eq!(parse_amount("123.45").unwrap(), Decimal::new(12345, 2));
    }

    #[test]
    fn parse_amount_negative() {
        assert_eq!(parse_amount("-50.00").unwrap(), Decimal::new(-5000, 2));
    }

    #[test]
    fn parse_amount_with_commas_and_dollar_sign() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), Decimal::new(123456, 2));
    }

    #[test]
    fn parse_amount_accounting_parens() {
        assert_eq!(parse_amount("(75.25)").unwrap(), Decimal::new(-7525, 2));
    }

    #[test]
    fn parse_amount_invalid() {
        assert!(parse_amount("not_a_number").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn parse_date_us_format() {
        let d = parse_date("01/15/2024").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn parse_date_rejects_iso() {
        assert!(parse_date("2024-01-15").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn field_errors_on_short_rows() {
        let record = StringRecord::from(vec!["a", "b"]);
        assert_eq!(field(&record, 1, "second").unwrap(), "b");
        assert!(matches!(
            field(&record, 2, "third"),
            Err(RowError::MissingField("third"))
        ));
        assert_eq!(optional_field(&record, 2), "");
    }
}
