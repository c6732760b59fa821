// Transaction management
use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{Postgres, Transaction};
use tracing::debug;

/// Default per-statement lock wait inside auth transactions
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Begins short transactions with a bounded lock wait.
///
/// The returned transaction rolls back when dropped without `commit`, so a
/// cancelled request never leaves partial writes behind.
#[derive(Clone)]
pub struct TransactionManager {
    pool: DatabasePool,
    lock_timeout_ms: u64,
}

impl TransactionManager {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.lock_timeout_ms = lock_timeout_ms;
        self
    }

    /// Begin a new transaction
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        debug!("Beginning transaction");

        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to begin transaction: {}", e)))?;

        // SET LOCAL does not accept bind parameters; the value is a plain integer
        let sql = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms);
        sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to set lock timeout: {}", e)))?;

        Ok(tx)
    }
}
