/// Storage seam for the authentication core
///
/// Every session operation runs inside one `AuthTransaction`, which is both
/// the credential store and the refresh token ledger. Dropping a transaction
/// without calling `commit` rolls it back.
///
/// Lock order: when a transaction touches a user row and that user's ledger
/// rows, the user row is locked first.

pub mod memory;
pub mod postgres;
pub mod refresh_token_repository;
pub mod user_repository;

pub use memory::MemoryAuthStore;
pub use postgres::PgAuthStore;

pub use database_layer::{DatabaseError, DatabaseResult};

use async_trait::async_trait;
use auth_identity::{NewUser, ProfileUpdate, Role, User};
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use uuid::Uuid;

/// Row lock taken by a read inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    None,
    /// Blocks concurrent writers, allows other readers (`FOR SHARE`)
    Share,
    /// Exclusive (`FOR UPDATE`)
    Update,
}

impl RowLock {
    pub(crate) fn sql_suffix(self) -> &'static str {
        match self {
            RowLock::None => "",
            RowLock::Share => " FOR SHARE",
            RowLock::Update => " FOR UPDATE",
        }
    }
}

/// One issued refresh token. `id` is the token's `jti`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub user_agent: Option<String>,
    pub ip: Option<IpAddr>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// A record may authenticate a refresh only while this holds.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}

/// Ledger insert
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub user_agent: Option<String>,
    pub ip: Option<IpAddr>,
    pub expires_at: DateTime<Utc>,
}

/// Credential store operations
#[async_trait]
pub trait UserRepository: Send {
    /// `email` must already be case-folded.
    async fn find_by_email(&mut self, email: &str, lock: RowLock) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&mut self, id: Uuid, lock: RowLock) -> DatabaseResult<Option<User>>;

    /// Fails with `DatabaseError::Conflict` when the email is taken.
    async fn create(&mut self, new_user: NewUser) -> DatabaseResult<User>;

    /// Returns `None` when the user does not exist.
    async fn update_role(&mut self, id: Uuid, role: Role) -> DatabaseResult<Option<User>>;

    async fn update_profile(
        &mut self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> DatabaseResult<Option<User>>;
}

/// Refresh token ledger operations
#[async_trait]
pub trait RefreshTokenLedger: Send {
    /// Fails with `DatabaseError::Conflict` if the jti already exists.
    async fn insert_token(&mut self, token: NewRefreshToken) -> DatabaseResult<RefreshTokenRecord>;

    async fn find_token(
        &mut self,
        jti: Uuid,
        lock: RowLock,
    ) -> DatabaseResult<Option<RefreshTokenRecord>>;

    /// Sets `revoked_at` if unset. Returns whether this call revoked it.
    async fn revoke_token(&mut self, jti: Uuid) -> DatabaseResult<bool>;

    /// Revokes every unrevoked token of the user, returning how many.
    async fn revoke_all_for_user(&mut self, user_id: Uuid) -> DatabaseResult<u64>;

    /// Unrevoked, unexpired tokens of the user.
    async fn count_active_for_user(&mut self, user_id: Uuid) -> DatabaseResult<u64>;
}

/// A unit of work over users and the ledger
#[async_trait]
pub trait AuthTransaction: UserRepository + RefreshTokenLedger {
    async fn commit(self: Box<Self>) -> DatabaseResult<()>;
}

/// Factory for auth transactions
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn begin(&self) -> DatabaseResult<Box<dyn AuthTransaction>>;

    /// Liveness probe for health checks
    async fn is_healthy(&self) -> bool;
}
