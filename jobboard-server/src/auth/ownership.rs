/// Resource ownership gates
///
/// Business routes that mutate a company, a job or an application mount one
/// of these after `require_auth`. Admins pass without a lookup.
///
/// Ownership chains:
/// - company: `companies.owner_id`
/// - job: owner of the job's company
/// - application: owner of the company that posted the job

use async_trait::async_trait;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use database_layer::{DatabasePool, DatabaseResult};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::middleware::{current_identity, Identity};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Company,
    Job,
    Application,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Company => "Company",
            ResourceKind::Job => "Job",
            ResourceKind::Application => "Application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: Uuid,
}

/// Resolves the user that owns a resource
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// `None` when the resource does not exist or has no owner.
    async fn owner_of(&self, resource: ResourceRef) -> DatabaseResult<Option<Uuid>>;
}

pub type SharedOwnershipResolver = Arc<dyn OwnershipResolver>;

/// Allow admins and the owner of `resource`.
///
/// # Errors
///
/// `NotFound` when the resource has no owner, `Forbidden` for anyone else,
/// `Database` when the lookup fails.
pub async fn ensure_owner_or_admin(
    identity: &Identity,
    resolver: &dyn OwnershipResolver,
    resource: ResourceRef,
) -> Result<(), AuthError> {
    if identity.is_admin() {
        return Ok(());
    }

    let owner = resolver
        .owner_of(resource)
        .await?
        .ok_or(AuthError::NotFound(resource.kind.label()))?;

    if owner != identity.id {
        tracing::warn!(
            user_id = %identity.id,
            resource = resource.kind.label(),
            resource_id = %resource.id,
            "Ownership check failed"
        );
        return Err(AuthError::Forbidden("You do not own this resource."));
    }

    Ok(())
}

pub async fn require_company_owner(
    State(resolver): State<SharedOwnershipResolver>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(ResourceKind::Company, resolver.as_ref(), &params, request, next).await
}

pub async fn require_job_owner(
    State(resolver): State<SharedOwnershipResolver>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(ResourceKind::Job, resolver.as_ref(), &params, request, next).await
}

pub async fn require_application_owner(
    State(resolver): State<SharedOwnershipResolver>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(ResourceKind::Application, resolver.as_ref(), &params, request, next).await
}

async fn gate(
    kind: ResourceKind,
    resolver: &dyn OwnershipResolver,
    params: &HashMap<String, String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = current_identity(request.extensions()).ok_or(AuthError::MissingToken)?;

    let id = params
        .get("id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| AuthError::Validation(format!("A valid {} id is required.", kind.label())))?;

    ensure_owner_or_admin(&identity, resolver, ResourceRef { kind, id }).await?;
    Ok(next.run(request).await)
}

/// Ownership lookups against the job board tables
#[derive(Clone)]
pub struct PgOwnershipResolver {
    pool: DatabasePool,
}

impl PgOwnershipResolver {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OwnershipResolver for PgOwnershipResolver {
    async fn owner_of(&self, resource: ResourceRef) -> DatabaseResult<Option<Uuid>> {
        let sql = match resource.kind {
            ResourceKind::Company => "SELECT owner_id FROM companies WHERE id = $1",
            ResourceKind::Job => {
                "SELECT c.owner_id FROM jobs j \
                 JOIN companies c ON c.id = j.company_id \
                 WHERE j.id = $1"
            }
            ResourceKind::Application => {
                "SELECT c.owner_id FROM applications a \
                 JOIN jobs j ON j.id = a.job_id \
                 JOIN companies c ON c.id = j.company_id \
                 WHERE a.id = $1"
            }
        };

        let owner: Option<Option<Uuid>> = sqlx::query_scalar(sql)
            .bind(resource.id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(owner.flatten())
    }
}
