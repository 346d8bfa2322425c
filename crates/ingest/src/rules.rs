use moneta_core::TransactionType;
use rust_decimal::Decimal;

/// Which parsed field a transfer rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Description,
    Category,
    /// The institution-native type column (e.g. Chase's `Type`).
    TypeField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    /// Case-insensitive substring match.
    Contains,
    /// Case-sensitive prefix match.
    Prefix,
    /// Case-sensitive equality.
    Equals,
}

/// One predicate in an institution's transfer-detection rule set. Rules
/// within a set are disjoint OR-conditions; any match classifies the row as
/// a transfer between the user's own accounts.
#[derive(Debug, Clone, Copy)]
pub struct TransferRule {
    pub field: RuleField,
    pub matcher: RuleMatch,
    pub pattern: &'static str,
}

impl TransferRule {
    pub const fn new(field: RuleField, matcher: RuleMatch, pattern: &'static str) -> Self {
        TransferRule {
            field,
            matcher,
            pattern,
        }
    }

    fn matches(&self, facts: &RowFacts<'_>) -> bool {
        let value = match self.field {
            RuleField::Description => Some(facts.description),
            RuleField::Category => facts.category,
            RuleField::TypeField => facts.type_field,
        };
        let Some(value) = value else {
            return false;
        };
        match self.matcher {
            RuleMatch::Contains => value.to_uppercase().contains(&self.pattern.to_uppercase()),
            RuleMatch::Prefix => value.starts_with(self.pattern),
            RuleMatch::Equals => value == self.pattern,
        }
    }
}

/// The already-parsed fields transfer rules may inspect.
#[derive(Debug, Clone, Copy)]
pub struct RowFacts<'a> {
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub type_field: Option<&'a str>,
}

pub fn is_transfer(rules: &[TransferRule], facts: &RowFacts<'_>) -> bool {
    rules.iter().any(|rule| rule.matches(facts))
}

/// Classify a row: transfer when a rule fires, otherwise by the canonical
/// amount sign (positive = income, non-positive = expense). The amount must
/// already be sign-normalized.
pub fn classify(rules: &[TransferRule], facts: &RowFacts<'_>, amount: Decimal) -> TransactionType {
    if is_transfer(rules, facts) {
        TransactionType::Transfer
    } else if amount > Decimal::ZERO {
        TransactionType::Income
    } else {
        TransactionType::Expense
    }
}
