//! Read model assembled by [`Engine::summary`](crate::Engine::summary).
//!
//! Nothing here is stored: every summary is rebuilt from the accounts row and
//! the two ledgers inside a single read transaction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One side of a transfer, seen from the account the summary belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferView {
    /// Display name of the other account (receiver for sent, sender for received).
    pub counterparty: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: Uuid,
    pub name: String,
    pub balance: i64,
    /// Item name to total quantity bought.
    pub inventory: BTreeMap<String, i64>,
    /// Newest first.
    pub sent: Vec<TransferView>,
    /// Newest first.
    pub received: Vec<TransferView>,
}

impl AccountSummary {
    pub fn quantity_of(&self, item: &str) -> i64 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn total_sent(&self) -> i64 {
        self.sent.iter().map(|t| t.amount).sum()
    }

    pub fn total_received(&self) -> i64 {
        self.received.iter().map(|t| t.amount).sum()
    }
}
