use auth_identity::Role;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::ValidatedJson;
use crate::server::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct RoleChanged {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct RoleChangedEnvelope {
    pub user: RoleChanged,
}

/// PATCH /admin/users/:id/role
///
/// Every refresh token of the user is revoked in the same transaction, so
/// the new role takes effect on their next sign-in or, at the latest, when
/// their current access token expires.
pub async fn change_user_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<ChangeRoleRequest>,
) -> Result<Json<RoleChangedEnvelope>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::validation("A valid user id is required."))?;

    let user = state.sessions.change_role(id, body.role).await?;
    Ok(Json(RoleChangedEnvelope {
        user: RoleChanged {
            id: user.id,
            role: user.role,
        },
    }))
}
