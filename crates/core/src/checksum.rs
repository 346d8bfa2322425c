use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::account::AccountId;

/// Field separator for the identity serialization. A control byte cannot
/// appear in parsed CSV fields, so distinct tuples never collide by
/// concatenation.
const SEP: u8 = 0x1f;

/// Compute the deterministic identity of a transaction from its canonical
/// field tuple.
///
/// The serialization order is fixed: account id, transaction date, post date
/// (empty when absent), description, normalized amount, then every metadata
/// pair as `key=value` in key order. Metadata carries the institution-specific
/// disambiguators (running balance, reference number, memo) that keep two
/// same-day, same-amount, same-description rows from hashing identically.
///
/// The caller is responsible for passing the description in its normalized
/// form; every parse of the same source row must feed identical bytes here or
/// re-imports stop being idempotent.
pub fn transaction_checksum(
    account_id: AccountId,
    transaction_date: NaiveDate,
    post_date: Option<NaiveDate>,
    description: &str,
    amount: Decimal,
    metadata: &BTreeMap<String, String>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_id.0.to_string().as_bytes());
    hasher.update([SEP]);
    hasher.update(transaction_date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update([SEP]);
    if let Some(d) = post_date {
        hasher.update(d.format("%Y-%m-%d").to_string().as_bytes());
    }
    hasher.update([SEP]);
    hasher.update(description.as_bytes());
    hasher.update([SEP]);
    // normalize() strips trailing zeros so "25.10" and "25.100" agree.
    hasher.update(amount.normalize().to_string().as_bytes());
    for (key, value) in metadata {
        hasher.update([SEP]);
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    to_hex(&hasher.finalize().into())
}

/// Encode a raw 32-byte digest as a lowercase hex string (64 chars).
fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
