use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{
    Cents, OwnerId, TIMESTAMP_FORMAT, Transaction, TransactionId, TransactionKind,
};

use super::MIGRATION_001_INITIAL;

/// Failures surfaced by [`LedgerStore`] operations.
///
/// `WouldOverdraw` and `NotFound` are business outcomes the caller is
/// expected to handle; `Storage` wraps everything the durable medium can
/// throw. A failed operation commits nothing: the transaction row and the
/// balance update become visible together or not at all.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("debit of {requested} cents would overdraw balance of {balance} cents")]
    WouldOverdraw { balance: Cents, requested: Cents },

    #[error("no transaction with id {id} for this owner")]
    NotFound { id: TransactionId },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Durable store pairing each owner's append-only transaction log with a
/// materialized balance, kept consistent under concurrent writers.
///
/// The balance is maintained incrementally: every accepted append adjusts it
/// by the entry's signed amount inside the same SQLite transaction that
/// inserts the entry. Deletes are the one operation without an incremental
/// update; they recompute the balance from the remaining log.
///
/// Mutations for a single owner serialize behind a per-owner async lock, so
/// the read-modify-write of the balance (including the overdraft guard) is
/// atomic with respect to other writers. Different owners do not contend.
#[derive(Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
    write_locks: Arc<DashMap<OwnerId, Arc<Mutex<()>>>>,
    allow_negative: bool,
}

impl LedgerStore {
    /// Create a store on top of an existing SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_locks: Arc::new(DashMap::new()),
            allow_negative: false,
        }
    }

    /// Connect to a SQLite database at the given URL.
    /// Creates the database file if the URL says so (`mode=rwc`).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Permit balances to go negative on debit. Default is strict: an
    /// expense that would overdraw is rejected before being recorded.
    pub fn with_allow_negative(mut self, allow: bool) -> Self {
        self.allow_negative = allow;
        self
    }

    fn owner_lock(&self, owner: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(owner.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append a new entry to an owner's log and update the balance, as one
    /// atomic unit. Returns the persisted entry and the new balance.
    ///
    /// In strict mode an expense that would drive the balance negative is
    /// rejected here, inside the owner's critical section; checking any
    /// earlier would let two concurrent debits both pass against the same
    /// stale balance.
    pub async fn append(
        &self,
        owner: &str,
        kind: TransactionKind,
        amount_cents: Cents,
        category: Option<String>,
    ) -> Result<(Transaction, Cents), StoreError> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let balance = Self::balance_in_tx(&mut tx, owner).await?;
        let new_balance = balance + kind.signed(amount_cents);
        if new_balance < 0 && !self.allow_negative {
            return Err(StoreError::WouldOverdraw {
                balance,
                requested: amount_cents,
            });
        }

        let created_at_str = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        let row = sqlx::query(
            r#"
            INSERT INTO transactions (owner, kind, amount_cents, category, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(owner)
        .bind(kind.as_str())
        .bind(amount_cents)
        .bind(&category)
        .bind(&created_at_str)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert transaction")?;
        let id: TransactionId = row.get("id");

        Self::write_balance(&mut tx, owner, new_balance).await?;

        tx.commit().await.context("Failed to commit append")?;

        tracing::debug!(owner, id, kind = %kind, amount_cents, new_balance, "appended entry");

        let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
            .context("Invalid created_at timestamp")?
            .and_utc();

        Ok((
            Transaction {
                id,
                owner: owner.to_string(),
                kind,
                amount_cents,
                category,
                created_at,
            },
            new_balance,
        ))
    }

    /// Current balance for an owner; 0 if the owner has no prior activity.
    pub async fn current_balance(&self, owner: &str) -> Result<Cents, StoreError> {
        let row = sqlx::query("SELECT amount_cents FROM balances WHERE owner = ?")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch balance")?;

        Ok(row.map(|r| r.get("amount_cents")).unwrap_or(0))
    }

    /// Full history for an owner, most recent first (strictly decreasing id).
    pub async fn history(&self, owner: &str) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, kind, amount_cents, category, created_at
            FROM transactions
            WHERE owner = ?
            ORDER BY id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch history")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Remove one entry and recompute the balance from the remaining log.
    /// Returns the recomputed balance.
    pub async fn delete(&self, owner: &str, id: TransactionId) -> Result<Cents, StoreError> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND owner = ?")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .context("Failed to delete transaction")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }

        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(CASE WHEN kind = 'Income' THEN amount_cents ELSE -amount_cents END), 0) AS balance
            FROM transactions
            WHERE owner = ?
            "#,
        )
        .bind(owner)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to recompute balance")?;
        let new_balance: Cents = row.get("balance");

        Self::write_balance(&mut tx, owner, new_balance).await?;

        tx.commit().await.context("Failed to commit delete")?;

        tracing::debug!(owner, id, new_balance, "deleted entry, balance recomputed");

        Ok(new_balance)
    }

    /// Income and expense totals for an owner, both as positive sums.
    pub async fn totals(&self, owner: &str) -> Result<(Cents, Cents), StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'Income' THEN amount_cents ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'Expense' THEN amount_cents ELSE 0 END), 0) AS expense
            FROM transactions
            WHERE owner = ?
            "#,
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute totals")?;

        Ok((row.get("income"), row.get("expense")))
    }

    async fn balance_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        owner: &str,
    ) -> Result<Cents, StoreError> {
        let row = sqlx::query("SELECT amount_cents FROM balances WHERE owner = ?")
            .bind(owner)
            .fetch_optional(&mut **tx)
            .await
            .context("Failed to fetch balance")?;

        Ok(row.map(|r| r.get("amount_cents")).unwrap_or(0))
    }

    async fn write_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        owner: &str,
        amount_cents: Cents,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO balances (owner, amount_cents)
            VALUES (?, ?)
            ON CONFLICT(owner) DO UPDATE SET amount_cents = excluded.amount_cents
            "#,
        )
        .bind(owner)
        .bind(amount_cents)
        .execute(&mut **tx)
        .await
        .context("Failed to update balance")?;

        Ok(())
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction, StoreError> {
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        let kind = TransactionKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?;
        let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
            .context("Invalid created_at timestamp")?
            .and_utc();

        Ok(Transaction {
            id: row.get("id"),
            owner: row.get("owner"),
            kind,
            amount_cents: row.get("amount_cents"),
            category: row.get("category"),
            created_at,
        })
    }
}
