//! Transactional core of the coin ledger.
//!
//! Accounts hold an integer coin balance, spend it on catalog items and send
//! it to each other. Every workflow of [`Engine`] runs inside one database
//! transaction: it either commits as a whole or leaves no trace.
//!
//! Balances never go below zero. The guard is a single conditional `UPDATE`
//! (`balance + delta >= 0`) backed by a `CHECK` constraint, so concurrent
//! debits of the same account cannot both pass a stale read.

pub use accounts::{Account, STARTING_BALANCE};
pub use catalog::{CatalogItem, STARTER_CATALOG};
pub use commands::TransferCmd;
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use purchases::PurchaseRecord;
pub use summary::{AccountSummary, TransferView};
pub use transfers::TransferRecord;

mod accounts;
mod catalog;
mod commands;
mod error;
mod ops;
mod purchases;
mod summary;
mod transfers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
