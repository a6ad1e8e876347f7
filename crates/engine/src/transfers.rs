//! Transfer ledger: one append-only row per account-to-account coin movement.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Ledger sequence number; grows with insertion order.
    pub id: i32,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub from_id: String,
    pub to_id: String,
    pub amount: i64,
    pub created_at: DateTimeUtc,
}

/// Both ends point at `accounts`, so joins pick the side explicitly.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A row ready for insertion; the sequence id is assigned by the database.
    pub(crate) fn append(from_id: Uuid, to_id: Uuid, amount: i64) -> Self {
        Self {
            id: ActiveValue::NotSet,
            from_id: ActiveValue::Set(from_id.to_string()),
            to_id: ActiveValue::Set(to_id.to_string()),
            amount: ActiveValue::Set(amount),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl TryFrom<Model> for TransferRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            from_id: parse_uuid(&model.from_id, "sender")?,
            to_id: parse_uuid(&model.to_id, "receiver")?,
            amount: model.amount,
            created_at: model.created_at,
        })
    }
}
