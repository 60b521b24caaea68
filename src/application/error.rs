use thiserror::Error;

use crate::domain::{Cents, ValidationError, WalletId};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Insufficient funds in wallet {wallet_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        wallet_id: WalletId,
        balance: Cents,
        required: Cents,
    },

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Coarse classification of a [`LedgerError`], for adapters choosing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientFunds,
    Store,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::WalletNotFound(_) => ErrorKind::NotFound,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Store(_) => ErrorKind::Store,
        }
    }

    /// True when the caller can fix the request; false for store failures.
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Store
    }

    /// The input field at fault, for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            LedgerError::Validation(err) => Some(err.field),
            _ => None,
        }
    }
}
