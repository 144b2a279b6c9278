use thiserror::Error;

use crate::domain::{Cents, TransactionId};
use crate::storage::StoreError;

/// Every failure a caller of [`LedgerService`](super::LedgerService) can see.
///
/// Each variant is a distinct outcome the presentation layer maps to its own
/// surface (exit code, HTTP status, dialog). `Storage` is the only retryable
/// one: the underlying operation is atomic, so a retry never observes a
/// half-applied change. It will, however, record a fresh transaction.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WouldOverdraw { balance, requested } => LedgerError::InsufficientFunds {
                balance,
                required: requested,
            },
            StoreError::NotFound { id } => LedgerError::TransactionNotFound(id),
            StoreError::Storage(inner) => LedgerError::Storage(inner),
        }
    }
}
