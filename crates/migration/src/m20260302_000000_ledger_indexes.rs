//! Lookup indexes for the account summary queries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Purchases {
    Table,
    AccountId,
}

#[derive(Iden)]
enum Transfers {
    Table,
    FromId,
    ToId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-account_id")
                    .table(Purchases::Table)
                    .col(Purchases::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-from_id")
                    .table(Transfers::Table)
                    .col(Transfers::FromId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-to_id")
                    .table(Transfers::Table)
                    .col(Transfers::ToId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-transfers-to_id")
                    .table(Transfers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx-transfers-from_id")
                    .table(Transfers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx-purchases-account_id")
                    .table(Purchases::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
