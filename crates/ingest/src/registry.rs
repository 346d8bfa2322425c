//! Static mapping from institution key to adapter. The adapter set is closed
//! and small, so a compile-time slice of trait objects is all the registry
//! needs; extending it means adding one entry here.

use crate::adapter::InstitutionAdapter;
use crate::amex::Amex;
use crate::bofa::BankOfAmerica;
use crate::bofa_cc::BankOfAmericaCard;
use crate::chase::Chase;
use crate::discover::Discover;
use crate::error::IngestError;

static ADAPTERS: [&dyn InstitutionAdapter; 5] = [
    &Amex,
    &BankOfAmerica,
    &BankOfAmericaCard,
    &Chase,
    &Discover,
];

pub fn lookup(key: &str) -> Result<&'static dyn InstitutionAdapter, IngestError> {
    ADAPTERS
        .iter()
        .find(|adapter| adapter.key() == key)
        .copied()
        .ok_or_else(|| IngestError::UnknownInstitution(key.to_string()))
}

/// Registered institution keys, in registration order.
pub fn available() -> impl Iterator<Item = &'static str> {
    ADAPTERS.iter().map(|adapter| adapter.key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_expected_keys_resolve() {
        for key in ["amex", "bofa", "bofacc", "chase", "discover"] {
            let adapter = lookup(key).unwrap();
            assert_eq!(adapter.key(), key);
        }
    }

    #[test]
    fn unknown_key_errors() {
        assert!(matches!(
            lookup("wells_fargo"),
            Err(IngestError::UnknownInstitution(key)) if key == "wells_fargo"
        ));
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = available().collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ADAPTERS.len());
    }
}
