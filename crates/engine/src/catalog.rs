//! Catalog items and the fixed starter price list.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Items seeded on every boot, as `(name, price)`.
pub const STARTER_CATALOG: [(&str, i64); 10] = [
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

/// Something an account can spend coins on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CatalogItem> for ActiveModel {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            name: ActiveValue::Set(item.name.clone()),
            price: ActiveValue::Set(item.price),
        }
    }
}

impl TryFrom<Model> for CatalogItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "catalog item")?,
            name: model.name,
            price: model.price,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn starter_catalog_is_well_formed() {
        let names: HashSet<&str> = STARTER_CATALOG.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), STARTER_CATALOG.len());
        assert!(STARTER_CATALOG.iter().all(|(_, price)| *price > 0));
        assert!(STARTER_CATALOG.contains(&("t-shirt", 80)));
    }
}
