use sea_orm::TransactionTrait;
use tracing::debug;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

use super::{Engine, with_tx};

impl Engine {
    /// Buy one unit of `item_name` for `account_id`.
    ///
    /// Price lookup, debit and the purchase record share one transaction;
    /// any failure rolls all of them back.
    pub async fn purchase(&self, account_id: Uuid, item_name: &str) -> ResultEngine<()> {
        let item_name = item_name.trim();
        let outcome = with_tx!(self, |db_tx| {
            let item = self
                .price_of(&db_tx, item_name)
                .await?
                .ok_or_else(|| EngineError::InvalidItem(item_name.to_string()))?;
            self.apply_delta(&db_tx, account_id, -item.price).await?;
            let record = self.record_purchase(&db_tx, account_id, item.id, 1).await?;
            Ok((item, record))
        });

        match outcome {
            Ok((item, record)) => {
                debug!(
                    %account_id,
                    item = %item.name,
                    price = item.price,
                    purchase_id = record.id,
                    "purchase committed"
                );
                Ok(())
            }
            Err(err) => {
                debug!(%account_id, item = item_name, error = %err, "purchase rejected");
                Err(err)
            }
        }
    }
}
