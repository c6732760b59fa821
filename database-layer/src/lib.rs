//! Database layer for the job board backend
//!
//! Thin wrapper over a `sqlx` PostgreSQL pool:
//! - connection pooling with health checks
//! - short transactions that roll back when dropped
//! - embedded schema migrations for the tables the auth core owns
//!
//! ```rust,no_run
//! use database_layer::{DatabasePool, TransactionManager};
//!
//! # async fn run() -> database_layer::DatabaseResult<()> {
//! let pool = DatabasePool::new("postgresql://localhost/jobboard", 10).await?;
//! pool.migrate().await?;
//!
//! let tx = TransactionManager::new(pool.clone()).begin().await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod transaction;

pub use connection::*;
pub use error::*;
pub use transaction::*;
