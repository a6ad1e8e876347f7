//! The module contains the `Account` struct and the `accounts` table.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Coins granted to every account on creation.
pub const STARTING_BALANCE: i64 = 1000;

/// An account.
///
/// An account is the identity of a user plus its coin balance. The name is
/// unique and never changes; the balance only moves through the engine's
/// atomic delta operation and never goes below zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A brand new account holding [`STARTING_BALANCE`] coins.
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance: STARTING_BALANCE,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    /// Credential material owned by the authentication layer. The engine never
    /// reads it.
    pub password_hash: Option<String>,
    pub balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            password_hash: ActiveValue::Set(None),
            balance: ActiveValue::Set(account.balance),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            name: model.name,
            balance: model.balance,
            created_at: model.created_at,
        })
    }
}
