//! The module contains the error the engine can throw.
//!
//! Business rejections are deterministic and must not be retried as-is:
//!
//! - [`InvalidItem`] the catalog has no item with the requested name.
//! - [`InsufficientFunds`] a debit would take a balance below zero.
//! - [`InvalidTransferRequest`] non-positive amount or empty recipient.
//! - [`UnknownRecipient`] no account carries the recipient name.
//! - [`SelfTransfer`] sender and receiver are the same account.
//! - [`DuplicateAccount`] an account with the same name already exists.
//!
//! [`StorageUnavailable`] and [`Timeout`] are the only transient failures, see
//! [`EngineError::is_transient`].
//!
//!  [`InvalidItem`]: EngineError::InvalidItem
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`InvalidTransferRequest`]: EngineError::InvalidTransferRequest
//!  [`UnknownRecipient`]: EngineError::UnknownRecipient
//!  [`SelfTransfer`]: EngineError::SelfTransfer
//!  [`DuplicateAccount`]: EngineError::DuplicateAccount
//!  [`StorageUnavailable`]: EngineError::StorageUnavailable
//!  [`Timeout`]: EngineError::Timeout
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid item: \"{0}\" is not in the catalog")]
    InvalidItem(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid transfer request: {0}")]
    InvalidTransferRequest(String),
    #[error("Unknown recipient: \"{0}\"")]
    UnknownRecipient(String),
    #[error("Self transfer is not allowed")]
    SelfTransfer,
    #[error("\"{0}\" already present!")]
    DuplicateAccount(String),
    #[error("\"{0}\" account not found!")]
    UnknownAccount(String),
    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Unit of work exceeded {0:?}")]
    Timeout(Duration),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Timeout(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                Self::StorageUnavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidItem(a), Self::InvalidItem(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidTransferRequest(a), Self::InvalidTransferRequest(b)) => a == b,
            (Self::UnknownRecipient(a), Self::UnknownRecipient(b)) => a == b,
            (Self::SelfTransfer, Self::SelfTransfer) => true,
            (Self::DuplicateAccount(a), Self::DuplicateAccount(b)) => a == b,
            (Self::UnknownAccount(a), Self::UnknownAccount(b)) => a == b,
            (Self::InvalidAccountName(a), Self::InvalidAccountName(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::StorageUnavailable(a), Self::StorageUnavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
