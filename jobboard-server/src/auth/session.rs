/// Session manager
///
/// Orchestrates registration, login, refresh rotation and logout over the
/// credential store, the token codec and the refresh token ledger. Each
/// operation that writes runs in a single `AuthTransaction`; any early
/// return drops the transaction and rolls it back.

use auth_identity::{
    normalize_email, NewUser, ProfileUpdate, PublicUser, Role, SecretHasher, User,
};
use chrono::Utc;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::db::{AuthStore, AuthTransaction, NewRefreshToken, RowLock};
use crate::auth::error::AuthError;
use crate::auth::middleware::Identity;
use crate::auth::tokens::{SignedToken, TokenCodec};

/// Password compared against when the email is unknown, so that a miss
/// costs one hash verification like a wrong password does
const DUMMY_PASSWORD: &str = "jobboard-timing-equalisation";

/// Audit metadata stored on each ledger record
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub user_agent: Option<String>,
    pub ip: Option<IpAddr>,
}

/// Tokens issued by register, login and refresh
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub user: PublicUser,
    pub access: SignedToken,
    pub refresh: SignedToken,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Profile change requested by the user themselves
#[derive(Debug, Clone, Default)]
pub struct ProfileChange {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    codec: Arc<TokenCodec>,
    passwords: SecretHasher,
    dummy_hash: OnceCell<String>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>, codec: Arc<TokenCodec>, passwords: SecretHasher) -> Self {
        Self {
            store,
            codec,
            passwords,
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create an account and sign it in.
    ///
    /// Only an authenticated admin may create another admin.
    ///
    /// # Errors
    ///
    /// `Forbidden` for a non-admin asking for `admin`, `EmailTaken` when the
    /// case-folded email exists.
    pub async fn register(
        &self,
        registration: Registration,
        caller: Option<Identity>,
        meta: &ClientMeta,
    ) -> Result<SessionTokens, AuthError> {
        let role = registration.role.unwrap_or_default();
        let caller_is_admin = caller.is_some_and(|identity| identity.role.is_admin());
        if role.is_admin() && !caller_is_admin {
            warn!(caller = ?caller.map(|c| c.id), "Rejected self-registration as admin");
            return Err(AuthError::Forbidden("Only admins can create admin accounts."));
        }

        let email = normalize_email(&registration.email);
        let password_hash = self.passwords.hash(&registration.password).await?;

        let mut tx = self.store.begin().await?;
        if tx.find_by_email(&email, RowLock::None).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = tx
            .create(NewUser {
                name: registration.name.trim().to_string(),
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| if e.is_conflict() { AuthError::EmailTaken } else { e.into() })?;

        let tokens = self.issue_session(tx.as_mut(), &user, meta).await?;
        tx.commit().await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(tokens)
    }

    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown email or a wrong password alike.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        meta: &ClientMeta,
    ) -> Result<SessionTokens, AuthError> {
        let email = normalize_email(email);
        let mut tx = self.store.begin().await?;

        let Some(user) = tx.find_by_email(&email, RowLock::Update).await? else {
            // Unknown email pays the same hashing cost as a wrong password
            let dummy = self.dummy_hash().await?;
            let _ = self.passwords.verify(password, dummy).await?;
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_session(tx.as_mut(), &user, meta).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User logged in");
        Ok(tokens)
    }

    /// Rotate a refresh token: the presented token is revoked and a new pair
    /// is issued. Of several concurrent calls with one token, at most one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// `MissingRefreshToken` or `RefreshRejected` for every client-side cause.
    pub async fn refresh(
        &self,
        raw_token: Option<&str>,
        meta: &ClientMeta,
    ) -> Result<SessionTokens, AuthError> {
        let raw_token = raw_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let claims = self.codec.verify_refresh(raw_token).map_err(|e| {
            debug!(error = %e, "Refresh token failed verification");
            AuthError::RefreshRejected("codec")
        })?;

        let mut tx = self.store.begin().await?;

        // User row before ledger row
        let user = tx
            .find_by_id(claims.sub, RowLock::Share)
            .await?
            .ok_or(AuthError::RefreshRejected("user missing"))?;

        let record = tx
            .find_token(claims.jti, RowLock::Update)
            .await?
            .ok_or(AuthError::RefreshRejected("unknown jti"))?;

        if record.is_revoked() {
            warn!(user_id = %claims.sub, jti = %claims.jti, "Replay of revoked refresh token");
            return Err(AuthError::RefreshRejected("revoked"));
        }
        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::RefreshRejected("expired"));
        }
        if record.user_id != claims.sub {
            warn!(jti = %claims.jti, "Refresh token subject does not own its ledger record");
            return Err(AuthError::RefreshRejected("subject mismatch"));
        }
        if !self.codec.matches_hash(raw_token, &record.token_hash).await? {
            warn!(jti = %claims.jti, "Refresh token does not match stored hash");
            return Err(AuthError::RefreshRejected("hash mismatch"));
        }

        tx.revoke_token(record.id).await?;
        let tokens = self.issue_session(tx.as_mut(), &user, meta).await?;
        tx.commit().await?;

        debug!(user_id = %user.id, rotated_jti = %record.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// End the session behind `raw_token`, if any.
    ///
    /// Never fails: an absent, invalid or expired token, and even a storage
    /// error, leave nothing to revoke from the client's point of view.
    pub async fn logout(&self, raw_token: Option<&str>) {
        let Some(raw_token) = raw_token.filter(|token| !token.is_empty()) else {
            return;
        };

        let claims = match self.codec.verify_refresh(raw_token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Ignoring unverifiable refresh token on logout");
                return;
            }
        };

        match self.revoke(claims.jti).await {
            Ok(true) => info!(user_id = %claims.sub, jti = %claims.jti, "User logged out"),
            Ok(false) => debug!(jti = %claims.jti, "Logout for already revoked session"),
            Err(e) => warn!(error = %e, jti = %claims.jti, "Failed to revoke refresh token on logout"),
        }
    }

    /// Change a user's role and end all of their sessions.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown user.
    pub async fn change_role(&self, user_id: Uuid, role: Role) -> Result<User, AuthError> {
        let mut tx = self.store.begin().await?;

        tx.find_by_id(user_id, RowLock::Update)
            .await?
            .ok_or(AuthError::NotFound("User"))?;

        let user = tx
            .update_role(user_id, role)
            .await?
            .ok_or(AuthError::NotFound("User"))?;
        let revoked = tx.revoke_all_for_user(user_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, role = %role, revoked_sessions = revoked, "User role changed");
        Ok(user)
    }

    /// # Errors
    ///
    /// `NotFound` when the user no longer exists.
    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_by_id(user_id, RowLock::None)
            .await?
            .ok_or(AuthError::NotFound("User"))?;
        Ok(PublicUser::from(&user))
    }

    /// Apply a profile change. Setting a new password requires the current one.
    ///
    /// # Errors
    ///
    /// `Validation` when only one of the two passwords is given or the current
    /// one is wrong, `NotFound` when the user no longer exists.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        change: ProfileChange,
    ) -> Result<PublicUser, AuthError> {
        if change.new_password.is_some() != change.current_password.is_some() {
            return Err(AuthError::Validation(
                "currentPassword and newPassword must be provided together.".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let user = tx
            .find_by_id(user_id, RowLock::Update)
            .await?
            .ok_or(AuthError::NotFound("User"))?;

        let password_hash = match (&change.current_password, &change.new_password) {
            (Some(current), Some(new)) => {
                if !self.passwords.verify(current, &user.password_hash).await? {
                    return Err(AuthError::Validation("Current password is incorrect.".to_string()));
                }
                Some(self.passwords.hash(new).await?)
            }
            _ => None,
        };

        let update = ProfileUpdate {
            name: change.name.map(|name| name.trim().to_string()),
            headline: change.headline,
            location: change.location,
            avatar_url: change.avatar_url,
            password_hash,
        };
        if update.is_empty() {
            return Ok(PublicUser::from(&user));
        }

        let updated = tx
            .update_profile(user_id, &update)
            .await?
            .ok_or(AuthError::NotFound("User"))?;
        tx.commit().await?;

        info!(user_id = %user_id, password_changed = update.password_hash.is_some(), "Profile updated");
        Ok(PublicUser::from(&updated))
    }

    async fn revoke(&self, jti: Uuid) -> Result<bool, AuthError> {
        let mut tx = self.store.begin().await?;
        let revoked = tx.revoke_token(jti).await?;
        tx.commit().await?;
        Ok(revoked)
    }

    /// Sign a fresh access/refresh pair and record the refresh token.
    async fn issue_session(
        &self,
        tx: &mut dyn AuthTransaction,
        user: &User,
        meta: &ClientMeta,
    ) -> Result<SessionTokens, AuthError> {
        let jti = Uuid::new_v4();
        let access = self.codec.issue_access(user.id, user.role)?;
        let refresh = self.codec.issue_refresh(user.id, user.role, jti)?;
        let token_hash = self.codec.hash(&refresh.token).await?;

        tx.insert_token(NewRefreshToken {
            id: jti,
            user_id: user.id,
            token_hash,
            user_agent: meta.user_agent.clone(),
            ip: meta.ip,
            expires_at: refresh.expires_at,
        })
        .await?;

        Ok(SessionTokens {
            user: PublicUser::from(user),
            access,
            refresh,
        })
    }

    async fn dummy_hash(&self) -> Result<&str, AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.passwords.hash(DUMMY_PASSWORD))
            .await?;
        Ok(hash.as_str())
    }
}
