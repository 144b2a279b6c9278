use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

/// Monotonically increasing identifier assigned by the store.
/// Ids are never reused, even after an entry is deleted.
pub type TransactionId = i64;

/// Opaque key of the ledger an entry belongs to (account name, user key, ...).
pub type OwnerId = String;

/// Timestamp layout used for persisted entries (second precision, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Polarity of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money entering the ledger (credit, +)
    Income,
    /// Money leaving the ledger (debit, -)
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Income" => Some(TransactionKind::Income),
            "Expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    /// Apply this kind's sign to a positive amount.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionKind::Income => amount_cents,
            TransactionKind::Expense => -amount_cents,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single immutable ledger entry. Created once when a credit or debit is
/// accepted; never mutated afterwards. The only way an entry disappears is
/// the explicit administrative delete, which recomputes the balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner: OwnerId,
    pub kind: TransactionKind,
    /// Amount in cents (always positive; the kind carries the sign)
    pub amount_cents: Cents,
    /// Optional free-form label (e.g. "Food", "Bills")
    pub category: Option<String>,
    /// When the entry was recorded, second precision
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The amount with the kind's sign applied: positive for income,
    /// negative for expense.
    pub fn signed_amount(&self) -> Cents {
        self.kind.signed(self.amount_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            let s = kind.as_str();
            assert_eq!(TransactionKind::from_str(s), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("income"), None);
        assert_eq!(TransactionKind::from_str("Transfer"), None);
    }

    #[test]
    fn test_signed_amounts() {
        assert_eq!(TransactionKind::Income.signed(5000), 5000);
        assert_eq!(TransactionKind::Expense.signed(5000), -5000);
    }

    #[test]
    fn test_signed_amount_on_entry() {
        let entry = Transaction {
            id: 1,
            owner: "alice".into(),
            kind: TransactionKind::Expense,
            amount_cents: 1234,
            category: None,
            created_at: Utc::now(),
        };
        assert_eq!(entry.signed_amount(), -1234);
    }
}
