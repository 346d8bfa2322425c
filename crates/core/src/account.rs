use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account as resolved by the account directory. `name` is the user-facing
/// handle (e.g. `bofa_checking`); `institution` is the adapter registry key
/// that decides which CSV dialect the account's exports use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub institution: String,
    pub description: String,
}

impl Account {
    pub fn new(id: AccountId, name: &str, institution: &str, description: &str) -> Self {
        Account {
            id,
            name: name.to_string(),
            institution: institution.to_string(),
            description: description.to_string(),
        }
    }
}
