use auth_identity::{PublicUser, Role};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{
    cookies::extract_refresh_token,
    session::{ClientMeta, Registration},
    Identity,
};
use crate::error::ApiError;
use crate::handlers::ValidatedJson;
use crate::server::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 100))]
    pub password: String,

    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// `{ "user": PublicUser }`
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

/// POST /auth/register. Signs the new account in unless an admin is
/// creating it on someone else's behalf, in which case the admin's own
/// cookies are left alone.
pub async fn register(
    State(state): State<AppState>,
    caller: Option<Identity>,
    meta: ClientMeta,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = Registration {
        name: body.name,
        email: body.email,
        password: body.password,
        role: body.role,
    };
    let created_by_admin = caller.as_ref().is_some_and(Identity::is_admin);
    let tokens = state.sessions.register(registration, caller, &meta).await?;

    let jar = if created_by_admin {
        jar
    } else {
        state.cookies.set_session(jar, &tokens)
    };
    Ok((StatusCode::CREATED, jar, Json(UserEnvelope { user: tokens.user })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state.sessions.login(&body.email, &body.password, &meta).await?;

    let jar = state.cookies.set_session(jar, &tokens);
    Ok((StatusCode::OK, jar, Json(UserEnvelope { user: tokens.user })))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    meta: ClientMeta,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let raw = extract_refresh_token(&jar, &headers);
    let tokens = state.sessions.refresh(raw.as_deref(), &meta).await?;

    let jar = state.cookies.set_session(jar, &tokens);
    Ok((StatusCode::OK, jar, Json(UserEnvelope { user: tokens.user })))
}

/// POST /auth/logout. Always answers 204 and clears both cookies.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let raw = extract_refresh_token(&jar, &headers);
    state.sessions.logout(raw.as_deref()).await;

    (StatusCode::NO_CONTENT, state.cookies.clear_session(jar))
}
