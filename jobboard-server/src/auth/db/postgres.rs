/// PostgreSQL-backed auth store

use async_trait::async_trait;
use database_layer::{DatabasePool, DatabaseResult, TransactionManager};
use sqlx::{Postgres, Transaction};

use super::{AuthStore, AuthTransaction};

#[derive(Clone)]
pub struct PgAuthStore {
    pool: DatabasePool,
    transactions: TransactionManager,
}

impl PgAuthStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            transactions: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    pub fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.transactions = self.transactions.with_lock_timeout_ms(lock_timeout_ms);
        self
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn begin(&self) -> DatabaseResult<Box<dyn AuthTransaction>> {
        let tx = self.transactions.begin().await?;
        Ok(Box::new(PgAuthTransaction { tx }))
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}

/// Open PostgreSQL transaction. Rolled back by sqlx when dropped.
pub struct PgAuthTransaction {
    pub(super) tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AuthTransaction for PgAuthTransaction {
    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
