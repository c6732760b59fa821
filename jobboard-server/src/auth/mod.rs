/// Authentication core
///
/// - Token codec: HS256 access and refresh tokens with separate secrets
/// - Refresh token ledger: hashed, single-use records keyed by `jti`
/// - Session manager: register, login, rotation, logout, role changes
/// - Authorization gate: identity resolution, role and ownership checks
///
/// Access tokens are stateless and live 15 minutes by default; they cannot
/// be revoked before expiry. Refresh tokens live 30 days and are rotated on
/// every use.

pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod middleware;
pub mod ownership;
pub mod session;
pub mod tokens;

pub use self::config::{CookieConfig, SameSitePolicy, TokenConfig};
pub use cookies::CookiePolicy;
pub use error::AuthError;
pub use middleware::{
    current_identity, optional_auth, require_admin, require_auth, require_role, Identity,
};
pub use ownership::{
    ensure_owner_or_admin, require_application_owner, require_company_owner, require_job_owner,
    OwnershipResolver, PgOwnershipResolver, ResourceKind, ResourceRef, SharedOwnershipResolver,
};
pub use session::{ClientMeta, SessionManager, SessionTokens};
pub use tokens::{AccessClaims, RefreshClaims, TokenCodec, TokenError};
