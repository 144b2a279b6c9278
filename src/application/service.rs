use crate::domain::{self, Cents, Transaction, TransactionId, TransactionKind};
use crate::storage::LedgerStore;

use super::LedgerError;

/// Application service providing the validated ledger operations.
/// This is the primary interface for any client (CLI, API, GUI, ...).
///
/// The service holds no state of its own beyond the injected store handle;
/// every call is a single atomic transition of the owner's balance/log pair,
/// or a no-op on validation failure.
#[derive(Clone)]
pub struct LedgerService {
    store: LedgerStore,
}

/// Result of a successful credit or debit.
#[derive(Debug)]
pub struct EntryResult {
    pub transaction: Transaction,
    /// Balance immediately after the entry was recorded
    pub balance: Cents,
}

/// Income/expense totals for one owner.
pub struct Summary {
    pub total_income: Cents,
    pub total_expense: Cents,
    pub net: Cents,
}

/// Result of checking one owner's ledger consistency: the materialized
/// balance against the signed sum recomputed from the full history.
pub struct IntegrityReport {
    pub stored_balance: Cents,
    pub computed_balance: Cents,
    pub transaction_count: usize,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.stored_balance == self.computed_balance
    }
}

impl LedgerService {
    /// Create a new ledger service with the given store.
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = LedgerStore::init(&db_url).await?;
        Ok(Self::new(store))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = LedgerStore::connect(&db_url).await?;
        Ok(Self::new(store))
    }

    /// Record income for an owner.
    pub async fn credit(&self, owner: &str, amount_cents: Cents) -> Result<EntryResult, LedgerError> {
        validate_amount(amount_cents)?;

        let (transaction, balance) = self
            .store
            .append(owner, TransactionKind::Income, amount_cents, None)
            .await?;

        tracing::info!(owner, amount_cents, balance, "credit recorded");

        Ok(EntryResult {
            transaction,
            balance,
        })
    }

    /// Record an expense for an owner. Rejected with
    /// [`LedgerError::InsufficientFunds`] if it would overdraw the balance;
    /// the check happens inside the store's per-owner critical section, so
    /// concurrent debits cannot both pass against the same stale balance.
    pub async fn debit(
        &self,
        owner: &str,
        amount_cents: Cents,
        category: Option<String>,
    ) -> Result<EntryResult, LedgerError> {
        validate_amount(amount_cents)?;

        let (transaction, balance) = self
            .store
            .append(owner, TransactionKind::Expense, amount_cents, category)
            .await?;

        tracing::info!(owner, amount_cents, balance, "debit recorded");

        Ok(EntryResult {
            transaction,
            balance,
        })
    }

    /// Current balance for an owner; 0 for an owner with no activity.
    pub async fn balance(&self, owner: &str) -> Result<Cents, LedgerError> {
        Ok(self.store.current_balance(owner).await?)
    }

    /// Full history for an owner, most recent first. Pure pass-through
    /// projection of the store; no business logic.
    pub async fn history(&self, owner: &str) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.store.history(owner).await?)
    }

    /// Administratively remove one entry; the balance is recomputed from
    /// the remaining history. Returns the recomputed balance.
    pub async fn delete_transaction(
        &self,
        owner: &str,
        id: TransactionId,
    ) -> Result<Cents, LedgerError> {
        let balance = self.store.delete(owner, id).await?;

        tracing::info!(owner, id, balance, "transaction deleted");

        Ok(balance)
    }

    /// Income/expense totals and net for an owner.
    pub async fn summary(&self, owner: &str) -> Result<Summary, LedgerError> {
        let (total_income, total_expense) = self.store.totals(owner).await?;

        Ok(Summary {
            total_income,
            total_expense,
            net: total_income - total_expense,
        })
    }

    /// Check that the materialized balance matches the signed sum of the
    /// owner's history.
    pub async fn verify(&self, owner: &str) -> Result<IntegrityReport, LedgerError> {
        let stored_balance = self.store.current_balance(owner).await?;
        let history = self.store.history(owner).await?;
        let computed_balance = domain::signed_sum(&history);

        Ok(IntegrityReport {
            stored_balance,
            computed_balance,
            transaction_count: history.len(),
        })
    }
}

fn validate_amount(amount_cents: Cents) -> Result<(), LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}
