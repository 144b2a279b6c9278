use super::{Cents, Transaction};

/// Compute the balance an owner's history implies: the signed sum of all
/// entries (income positive, expense negative).
pub fn signed_sum(transactions: &[Transaction]) -> Cents {
    transactions.iter().map(Transaction::signed_amount).sum()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::TransactionKind;

    fn entry(id: i64, kind: TransactionKind, amount_cents: Cents) -> Transaction {
        Transaction {
            id,
            owner: "alice".into(),
            kind,
            amount_cents,
            category: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_sum_empty() {
        assert_eq!(signed_sum(&[]), 0);
    }

    #[test]
    fn test_signed_sum_mixed() {
        let history = vec![
            entry(1, TransactionKind::Income, 10000),
            entry(2, TransactionKind::Expense, 3000),
            entry(3, TransactionKind::Expense, 500),
            entry(4, TransactionKind::Income, 250),
        ];
        assert_eq!(signed_sum(&history), 6750);
    }
}
