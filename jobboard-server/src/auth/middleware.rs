/// Authorization gate for Axum
///
/// Resolves the caller's identity from the access token (cookie first, then
/// `Authorization: Bearer`) and enforces role policy before handlers run.

use async_trait::async_trait;
use auth_identity::Role;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        request::Parts,
        Extensions, HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::convert::Infallible;
use std::net::IpAddr;
use uuid::Uuid;

use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::error::AuthError;
use crate::auth::session::ClientMeta;
use crate::error::ApiError;
use crate::server::AppState;

/// Authenticated caller, attached to request extensions by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Identity attached by `require_auth` or `optional_auth`, if any
pub fn current_identity(extensions: &Extensions) -> Option<Identity> {
    extensions.get::<Identity>().copied()
}

/// Reject the request unless it carries a valid access token
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(request.headers()).ok_or(AuthError::MissingToken)?;

    let claims = state.sessions.codec().verify_access(&token).map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AuthError::InvalidToken
    })?;

    let identity = Identity {
        id: claims.sub,
        role: claims.role,
    };
    request.extensions_mut().insert(identity);

    tracing::debug!(user_id = %identity.id, role = %identity.role, "Request authenticated");
    Ok(next.run(request).await)
}

/// Attach an identity when a valid access token is present.
///
/// A missing token and an invalid one are treated the same way: the request
/// continues anonymously.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = extract_access_token(request.headers())
        .and_then(|token| state.sessions.codec().verify_access(&token).ok());

    if let Some(claims) = claims {
        request.extensions_mut().insert(Identity {
            id: claims.sub,
            role: claims.role,
        });
    }

    next.run(request).await
}

/// Reject callers whose role is not in `allowed`. Must run after
/// `require_auth`.
pub async fn require_role(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = current_identity(request.extensions()).ok_or(AuthError::MissingToken)?;

    if !allowed.contains(&identity.role) {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            required_roles = ?allowed,
            "Role check failed"
        );
        return Err(AuthError::Forbidden("Insufficient permissions.").into());
    }

    Ok(next.run(request).await)
}

/// `require_role(&[Role::Admin])` as a plain middleware function
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require_role(&[Role::Admin], request, next).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(&parts.extensions).ok_or_else(|| AuthError::MissingToken.into())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta {
            user_agent: extract_user_agent(&parts.headers),
            ip: extract_client_ip(&parts.headers),
        })
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Access token from the `access_token` cookie, else from a bearer header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
}

/// Token of an `Authorization` value whose scheme is `Bearer` in any case
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`
fn extract_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim);

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
    };

    forwarded.or_else(real_ip).and_then(|ip| ip.parse().ok())
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
