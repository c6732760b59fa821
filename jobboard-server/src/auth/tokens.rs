/// Token codec
///
/// Stateless HS256 signing and verification of access and refresh tokens,
/// plus the one-way hash stored in the refresh token ledger.

use auth_identity::{IdentityError, Role, SecretHasher};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::config::TokenConfig;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, wrong issuer or wrong token type
    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Failed to hash token: {0}")]
    Hashing(#[from] IdentityError),
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Claims carried by a refresh token. `jti` is the ledger primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub role: Role,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// A signed token and the instant it stops being accepted
#[derive(Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub struct TokenCodec {
    access_keys: KeyPair,
    refresh_keys: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    validation: Validation,
    hasher: SecretHasher,
}

impl TokenCodec {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the secrets are empty or shared.
    pub fn new(config: &TokenConfig, hasher: SecretHasher) -> Result<Self, ConfigError> {
        config.validate()?;

        let access_ttl = duration_from_secs(config.access_ttl_secs)?;
        let refresh_ttl = duration_from_secs(config.refresh_ttl_secs)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            access_keys: KeyPair::from_secret(config.access_secret.expose_secret().as_bytes()),
            refresh_keys: KeyPair::from_secret(config.refresh_secret.expose_secret().as_bytes()),
            access_ttl,
            refresh_ttl,
            issuer: config.issuer.clone(),
            validation,
            hasher,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_access(&self, user_id: Uuid, role: Role) -> Result<SignedToken, TokenError> {
        let now = Utc::now();
        let expires_at = expiry(now, self.access_ttl)?;
        let claims = AccessClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = sign(&claims, &self.access_keys)?;
        Ok(SignedToken { token, expires_at })
    }

    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_refresh(
        &self,
        user_id: Uuid,
        role: Role,
        jti: Uuid,
    ) -> Result<SignedToken, TokenError> {
        let now = Utc::now();
        let expires_at = expiry(now, self.refresh_ttl)?;
        let claims = RefreshClaims {
            sub: user_id,
            role,
            jti,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = sign(&claims, &self.refresh_keys)?;
        Ok(SignedToken { token, expires_at })
    }

    /// # Errors
    ///
    /// `Expired` for a well-signed token past `exp`, `Invalid` otherwise.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.access_keys, &self.validation)
    }

    /// # Errors
    ///
    /// `Expired` for a well-signed token past `exp`, `Invalid` otherwise.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_keys, &self.validation)
    }

    /// Salted one-way hash of a raw token for the ledger.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Hashing` if the hasher fails.
    pub async fn hash(&self, raw_token: &str) -> Result<String, TokenError> {
        Ok(self.hasher.hash(raw_token).await?)
    }

    /// # Errors
    ///
    /// Returns `TokenError::Hashing` if the stored hash is unreadable.
    pub async fn matches_hash(&self, raw_token: &str, stored_hash: &str) -> Result<bool, TokenError> {
        Ok(self.hasher.verify(raw_token, stored_hash).await?)
    }
}

fn duration_from_secs(secs: u64) -> Result<Duration, ConfigError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid(format!("token TTL out of range: {secs}")))
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Signing(format!("expiry out of range for TTL {}s", ttl.num_seconds())))
}

fn sign<T: Serialize>(claims: &T, keys: &KeyPair) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

fn verify<T: DeserializeOwned>(
    token: &str,
    keys: &KeyPair,
    validation: &Validation,
) -> Result<T, TokenError> {
    decode::<T>(token, &keys.decoding, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}
