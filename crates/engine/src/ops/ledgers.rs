//! Purchase and transfer ledgers: append-only inserts plus the history
//! queries used by the account summary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, PurchaseRecord, ResultEngine, TransferRecord, TransferView, accounts, catalog,
    purchases, transfers,
};

use super::Engine;

/// Which side of the transfer ledger to read for an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Direction {
    Sent,
    Received,
}

impl Engine {
    pub(super) async fn record_purchase(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> ResultEngine<PurchaseRecord> {
        if quantity <= 0 {
            return Err(EngineError::InvalidAmount(
                "quantity must be > 0".to_string(),
            ));
        }
        let model = purchases::ActiveModel::append(account_id, item_id, quantity)
            .insert(db)
            .await?;
        PurchaseRecord::try_from(model)
    }

    pub(super) async fn record_transfer(
        &self,
        db: &DatabaseTransaction,
        from_id: Uuid,
        to_id: Uuid,
        amount: i64,
    ) -> ResultEngine<TransferRecord> {
        if from_id == to_id {
            return Err(EngineError::SelfTransfer);
        }
        if amount <= 0 {
            return Err(EngineError::InvalidTransferRequest(
                "amount must be > 0".to_string(),
            ));
        }
        let model = transfers::ActiveModel::append(from_id, to_id, amount)
            .insert(db)
            .await?;
        TransferRecord::try_from(model)
    }

    /// Item name to summed quantity over every purchase of the account.
    pub(super) async fn inventory(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> = purchases::Entity::find()
            .select_only()
            .column_as(catalog::Column::Name, "item")
            .column_as(
                Expr::col((purchases::Entity, purchases::Column::Quantity)).sum(),
                "quantity",
            )
            .join(JoinType::InnerJoin, purchases::Relation::Item.def())
            .filter(purchases::Column::AccountId.eq(account_id.to_string()))
            .group_by(catalog::Column::Name)
            .into_tuple()
            .all(db)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Transfers on one side of the ledger, newest first, each annotated with
    /// the display name of the other account.
    pub(super) async fn transfer_history(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        direction: Direction,
    ) -> ResultEngine<Vec<TransferView>> {
        let (own_side, counterparty) = match direction {
            Direction::Sent => (transfers::Column::FromId, transfers::Relation::Receiver),
            Direction::Received => (transfers::Column::ToId, transfers::Relation::Sender),
        };

        let rows: Vec<(String, i64, DateTime<Utc>)> = transfers::Entity::find()
            .select_only()
            .column_as(accounts::Column::Name, "counterparty")
            .column_as(transfers::Column::Amount, "amount")
            .column_as(transfers::Column::CreatedAt, "created_at")
            .join(JoinType::InnerJoin, counterparty.def())
            .filter(own_side.eq(account_id.to_string()))
            .order_by_desc(transfers::Column::Id)
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(counterparty, amount, created_at)| TransferView {
                counterparty,
                amount,
                created_at,
            })
            .collect())
    }
}
