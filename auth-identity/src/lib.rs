//! Identity model and credential hashing for the job board backend
//!
//! This crate holds the Credential Store's domain types and the one-way
//! hashing used for both passwords and refresh tokens:
//! - `User`, `Role` and the public projection returned to clients
//! - case-insensitive email normalisation
//! - Argon2id hashing with tunable cost, run off the async executor
//!
//! # Example
//!
//! ```rust
//! use auth_identity::{HashingConfig, SecretHasher};
//!
//! # async fn run() -> auth_identity::Result<()> {
//! let hasher = SecretHasher::new(&HashingConfig::minimal())?;
//! let hash = hasher.hash("Secret123!").await?;
//!
//! assert!(hasher.verify("Secret123!", &hash).await?);
//! assert!(!hasher.verify("wrong", &hash).await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hashing;
pub mod models;

pub use config::*;
pub use error::*;
pub use hashing::*;
pub use models::*;
