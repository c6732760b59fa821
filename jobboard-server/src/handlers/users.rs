use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{session::ProfileChange, Identity};
use crate::error::ApiError;
use crate::handlers::{auth::UserEnvelope, ValidatedJson};
use crate::server::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 200))]
    pub headline: Option<String>,

    #[validate(length(max = 120))]
    pub location: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    pub current_password: Option<String>,

    #[validate(length(min = 6, max = 100))]
    pub new_password: Option<String>,
}

/// GET /me
pub async fn get_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state.sessions.current_user(identity.id).await?;
    Ok(Json(UserEnvelope { user }))
}

/// PATCH /me
pub async fn update_me(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let change = ProfileChange {
        name: body.name,
        headline: body.headline,
        location: body.location,
        avatar_url: body.avatar_url,
        current_password: body.current_password,
        new_password: body.new_password,
    };

    let user = state.sessions.update_profile(identity.id, change).await?;
    Ok(Json(UserEnvelope { user }))
}
