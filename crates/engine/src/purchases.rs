//! Purchase ledger: one append-only row per item acquisition.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Ledger sequence number; grows with insertion order.
    pub id: i32,
    pub account_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: String,
    pub item_id: String,
    pub quantity: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::catalog::Entity",
        from = "Column::ItemId",
        to = "super::catalog::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Item,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::catalog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A row ready for insertion; the sequence id is assigned by the database.
    pub(crate) fn append(account_id: Uuid, item_id: Uuid, quantity: i32) -> Self {
        Self {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(account_id.to_string()),
            item_id: ActiveValue::Set(item_id.to_string()),
            quantity: ActiveValue::Set(quantity),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl TryFrom<Model> for PurchaseRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: parse_uuid(&model.account_id, "account")?,
            item_id: parse_uuid(&model.item_id, "catalog item")?,
            quantity: model.quantity,
            created_at: model.created_at,
        })
    }
}
