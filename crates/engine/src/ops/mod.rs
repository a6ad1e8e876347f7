use std::{future::Future, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod accounts;
mod catalog;
mod ledgers;
mod purchase;
mod summary;
mod transfer;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The whole unit of work, including waiting for a pooled connection, is
/// bounded by the engine's `unit_timeout`. When the bound fires the future is
/// dropped and the open transaction rolls back on drop.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        $self
            .bounded(async {
                let $tx = $self.database.begin().await?;
                let result: $crate::ResultEngine<_> = $body;
                match result {
                    Ok(value) => {
                        $tx.commit().await?;
                        Ok(value)
                    }
                    Err(err) => Err(err),
                }
            })
            .await
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Holds no state besides the injected connection pool, so it can be cloned
/// freely and shared across tasks.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    unit_timeout: Option<Duration>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn bounded<T, F>(&self, work: F) -> ResultEngine<T>
    where
        F: Future<Output = ResultEngine<T>>,
    {
        match self.unit_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| EngineError::Timeout(limit))?,
            None => work.await,
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    unit_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Upper bound for a single unit of work. Unbounded when not set.
    pub fn unit_timeout(mut self, limit: Duration) -> EngineBuilder {
        self.unit_timeout = Some(limit);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if matches!(self.database, DatabaseConnection::Disconnected) {
            return Err(EngineError::StorageUnavailable(
                "no database connection configured".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            unit_timeout: self.unit_timeout,
        })
    }
}
