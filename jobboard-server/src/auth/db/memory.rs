/// In-memory auth store for tests and `--in-memory` development mode
///
/// Transactions are fully serialized: `begin` takes the store mutex and holds
/// it until the transaction commits or is dropped. Writes go to a staged copy
/// that replaces the shared state only on commit. Row locks are therefore
/// implied and the `RowLock` arguments are ignored.

use async_trait::async_trait;
use auth_identity::{NewUser, ProfileUpdate, Role, User};
use chrono::Utc;
use database_layer::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    AuthStore, AuthTransaction, NewRefreshToken, RefreshTokenLedger, RefreshTokenRecord, RowLock,
    UserRepository,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    tokens: HashMap<Uuid, RefreshTokenRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn begin(&self) -> DatabaseResult<Box<dyn AuthTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryTransaction {
    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.staged.users.get_mut(&id)
    }
}

#[async_trait]
impl UserRepository for MemoryTransaction {
    async fn find_by_email(&mut self, email: &str, _lock: RowLock) -> DatabaseResult<Option<User>> {
        Ok(self
            .staged
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&mut self, id: Uuid, _lock: RowLock) -> DatabaseResult<Option<User>> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn create(&mut self, new_user: NewUser) -> DatabaseResult<User> {
        let taken = self
            .staged
            .users
            .values()
            .any(|user| user.email.eq_ignore_ascii_case(&new_user.email));
        if taken {
            return Err(DatabaseError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            avatar_url: None,
            headline: None,
            location: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_role(&mut self, id: Uuid, role: Role) -> DatabaseResult<Option<User>> {
        Ok(self.user_mut(id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_profile(
        &mut self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> DatabaseResult<Option<User>> {
        Ok(self.user_mut(id).map(|user| {
            update.apply_to(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl RefreshTokenLedger for MemoryTransaction {
    async fn insert_token(&mut self, token: NewRefreshToken) -> DatabaseResult<RefreshTokenRecord> {
        if self.staged.tokens.contains_key(&token.id) {
            return Err(DatabaseError::Conflict("refresh_tokens_pkey".to_string()));
        }
        if self
            .staged
            .tokens
            .values()
            .any(|existing| existing.token_hash == token.token_hash)
        {
            return Err(DatabaseError::Conflict("refresh_tokens_token_hash_key".to_string()));
        }
        if !self.staged.users.contains_key(&token.user_id) {
            return Err(DatabaseError::QueryFailed(format!(
                "refresh token references unknown user {}",
                token.user_id
            )));
        }

        let record = RefreshTokenRecord {
            id: token.id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            user_agent: token.user_agent,
            ip: token.ip,
            created_at: Utc::now(),
            expires_at: token.expires_at,
            revoked_at: None,
        };
        self.staged.tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_token(
        &mut self,
        jti: Uuid,
        _lock: RowLock,
    ) -> DatabaseResult<Option<RefreshTokenRecord>> {
        Ok(self.staged.tokens.get(&jti).cloned())
    }

    async fn revoke_token(&mut self, jti: Uuid) -> DatabaseResult<bool> {
        match self.staged.tokens.get_mut(&jti) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&mut self, user_id: Uuid) -> DatabaseResult<u64> {
        let now = Utc::now();
        let mut revoked = 0;
        for record in self.staged.tokens.values_mut() {
            if record.user_id == user_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn count_active_for_user(&mut self, user_id: Uuid) -> DatabaseResult<u64> {
        let now = Utc::now();
        let count = self
            .staged
            .tokens
            .values()
            .filter(|record| record.user_id == user_id && record.is_active_at(now))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl AuthTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
