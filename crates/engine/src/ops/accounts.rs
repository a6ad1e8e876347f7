//! Account store: lookup, creation and the atomic balance delta.

use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QuerySelect, SqlErr, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Account, EngineError, ResultEngine, accounts, util::normalize_account_name};

use super::{Engine, with_tx};

impl Engine {
    /// Resolve an account by display name, creating it with the starting
    /// balance on first use. Returns the account id.
    ///
    /// When a concurrent caller wins the race to create the same name, the
    /// unique index rejects our insert and the lookup is retried in a fresh
    /// transaction.
    pub async fn create_or_authenticate(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_account_name(name)?;
        let created = with_tx!(self, |db_tx| self.get_or_create(&db_tx, &name).await);
        let account = match created {
            Ok(account) => account,
            Err(EngineError::DuplicateAccount(_)) => {
                debug!(account = %name, "account created concurrently, retrying lookup");
                with_tx!(self, |db_tx| {
                    self.find_account_by_name(&db_tx, &name)
                        .await?
                        .ok_or_else(|| EngineError::UnknownAccount(name.clone()))
                })?
            }
            Err(err) => return Err(err),
        };
        Ok(account.id)
    }

    /// Point-in-time view of an account.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| self.require_account(&db_tx, account_id).await)
    }

    pub(super) async fn get_or_create(
        &self,
        db: &DatabaseTransaction,
        name: &str,
    ) -> ResultEngine<Account> {
        if let Some(account) = self.find_account_by_name(db, name).await? {
            return Ok(account);
        }

        let account = Account::new(name.to_string());
        accounts::ActiveModel::from(&account)
            .insert(db)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    EngineError::DuplicateAccount(name.to_string())
                }
                _ => EngineError::from(err),
            })?;
        info!(account_id = %account.id, account = %name, "account created");
        Ok(account)
    }

    pub(super) async fn find_account_by_name(
        &self,
        db: &DatabaseTransaction,
        name: &str,
    ) -> ResultEngine<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::Name.eq(name))
            .one(db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::UnknownAccount(account_id.to_string()))?;
        Account::try_from(model)
    }

    /// Add `delta` to the balance of `account_id` with a single conditional
    /// statement: the row only changes when the result stays non-negative.
    ///
    /// Zero affected rows means the account is missing or cannot cover the
    /// debit.
    pub(super) async fn apply_delta(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        delta: i64,
    ) -> ResultEngine<()> {
        if delta == 0 {
            return Err(EngineError::InvalidAmount(
                "delta must not be zero".to_string(),
            ));
        }
        let floor = delta.checked_neg().ok_or_else(|| {
            EngineError::InvalidAmount(format!("delta {delta} is out of range"))
        })?;

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .filter(accounts::Column::Balance.gte(floor))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            if self.account_exists(db, account_id).await? {
                return Err(EngineError::InsufficientFunds(format!(
                    "account {account_id} cannot cover {floor} coins"
                )));
            }
            return Err(EngineError::UnknownAccount(account_id.to_string()));
        }
        Ok(())
    }

    pub(super) async fn get_balance(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<i64> {
        accounts::Entity::find_by_id(account_id.to_string())
            .select_only()
            .column(accounts::Column::Balance)
            .into_tuple::<i64>()
            .one(db)
            .await?
            .ok_or_else(|| EngineError::UnknownAccount(account_id.to_string()))
    }

    async fn account_exists(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<bool> {
        let found = accounts::Entity::find_by_id(account_id.to_string())
            .select_only()
            .column(accounts::Column::Id)
            .into_tuple::<String>()
            .one(db)
            .await?;
        Ok(found.is_some())
    }
}
