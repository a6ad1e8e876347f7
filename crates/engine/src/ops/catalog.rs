use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};
use tracing::info;

use crate::{CatalogItem, ResultEngine, STARTER_CATALOG, catalog};

use super::{Engine, with_tx};

impl Engine {
    /// Insert the starter catalog, skipping names that already exist.
    ///
    /// Safe to run on every boot. Returns how many rows were actually added.
    pub async fn seed_catalog(&self) -> ResultEngine<u64> {
        let models: Vec<catalog::ActiveModel> = STARTER_CATALOG
            .iter()
            .map(|(name, price)| catalog::ActiveModel::from(&CatalogItem::new(*name, *price)))
            .collect();

        let inserted = with_tx!(self, |db_tx| {
            let inserted = catalog::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::column(catalog::Column::Name)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
            Ok(inserted)
        })?;
        info!(inserted, "catalog seeded");
        Ok(inserted)
    }

    /// Every catalog item, ordered by name.
    pub async fn catalog(&self) -> ResultEngine<Vec<CatalogItem>> {
        with_tx!(self, |db_tx| {
            catalog::Entity::find()
                .order_by_asc(catalog::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(CatalogItem::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Current price of `item_name`. `None` when the catalog has no such item.
    pub(super) async fn price_of(
        &self,
        db: &DatabaseTransaction,
        item_name: &str,
    ) -> ResultEngine<Option<CatalogItem>> {
        catalog::Entity::find()
            .filter(catalog::Column::Name.eq(item_name))
            .one(db)
            .await?
            .map(CatalogItem::try_from)
            .transpose()
    }
}
