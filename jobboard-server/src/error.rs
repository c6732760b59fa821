use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{ErrorBody, ErrorKind};
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::middleware::current_request_id;

/// HTTP-facing error: one taxonomy kind plus a client-safe message.
///
/// Rendered as `{ "error": { "code", "message", "requestId" } }`.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} not found."))
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, ErrorKind::Internal.default_message())
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let kind = err.kind();
        if kind.is_server_error() {
            tracing::error!(error = %err, "Internal error in auth core");
        } else {
            tracing::debug!(error = %err, code = %kind, "Request rejected");
        }
        Self::new(kind, err.client_message())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        Self::validation(format!("Invalid fields: {}.", fields.join(", ")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorBody::new(self.kind, self.message);
        if let Some(request_id) = current_request_id() {
            body = body.with_request_id(request_id);
        }

        (status, Json(body)).into_response()
    }
}
