//! Command structs for engine write operations.

use uuid::Uuid;

/// Move coins from an authenticated account to another account, by name.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from: Uuid,
    pub to_name: String,
    pub amount: i64,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from: Uuid, to_name: impl Into<String>, amount: i64) -> Self {
        Self {
            from,
            to_name: to_name.into(),
            amount,
        }
    }
}
