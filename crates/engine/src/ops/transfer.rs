use sea_orm::TransactionTrait;
use tracing::debug;

use crate::{EngineError, ResultEngine, TransferCmd, util::normalize_name};

use super::{Engine, with_tx};

impl Engine {
    /// Move `amount` coins from `cmd.from` to the account named `cmd.to_name`.
    ///
    /// The request is validated before any storage access. Inside the
    /// transaction the sender is debited before the receiver is credited, so
    /// an uncovered transfer stops at the first write.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<()> {
        let TransferCmd {
            from,
            to_name,
            amount,
        } = cmd;
        if amount <= 0 {
            return Err(EngineError::InvalidTransferRequest(
                "amount must be > 0".to_string(),
            ));
        }
        let to_name = normalize_name(&to_name).ok_or_else(|| {
            EngineError::InvalidTransferRequest("recipient must not be empty".to_string())
        })?;

        let outcome = with_tx!(self, |db_tx| {
            let receiver = self
                .find_account_by_name(&db_tx, &to_name)
                .await?
                .ok_or_else(|| EngineError::UnknownRecipient(to_name.clone()))?;
            if receiver.id == from {
                return Err(EngineError::SelfTransfer);
            }
            self.apply_delta(&db_tx, from, -amount).await?;
            self.apply_delta(&db_tx, receiver.id, amount).await?;
            self.record_transfer(&db_tx, from, receiver.id, amount)
                .await
        });

        match outcome {
            Ok(record) => {
                debug!(
                    from = %record.from_id,
                    to = %record.to_id,
                    amount,
                    transfer_id = record.id,
                    "transfer committed"
                );
                Ok(())
            }
            Err(err) => {
                debug!(%from, to = %to_name, amount, error = %err, "transfer rejected");
                Err(err)
            }
        }
    }
}
