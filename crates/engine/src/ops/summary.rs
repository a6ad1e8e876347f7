use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{AccountSummary, ResultEngine};

use super::{Engine, ledgers::Direction, with_tx};

impl Engine {
    /// Balance, inventory and transfer history of an account, all read from
    /// the same transaction so they describe one point in time.
    pub async fn summary(&self, account_id: Uuid) -> ResultEngine<AccountSummary> {
        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id).await?;
            let balance = self.get_balance(&db_tx, account_id).await?;
            let inventory = self.inventory(&db_tx, account_id).await?;
            let sent = self
                .transfer_history(&db_tx, account_id, Direction::Sent)
                .await?;
            let received = self
                .transfer_history(&db_tx, account_id, Direction::Received)
                .await?;
            Ok(AccountSummary {
                account_id,
                name: account.name,
                balance,
                inventory,
                sent,
                received,
            })
        })
    }
}
