use auth_identity::IdentityError;
use database_layer::DatabaseError;
use error_common::ErrorKind;
use thiserror::Error;

use crate::auth::tokens::TokenError;

/// Failures of the session manager and authorization gate.
///
/// Every variant maps to exactly one `ErrorKind`. The `Display` text is for
/// logs; clients only ever see `client_message`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing access token")]
    MissingToken,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Missing refresh token")]
    MissingRefreshToken,

    #[error("Refresh rejected: {0}")]
    RefreshRejected(&'static str),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::MissingRefreshToken
            | AuthError::RefreshRejected(_) => ErrorKind::Unauthorized,
            AuthError::Forbidden(_) => ErrorKind::Forbidden,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::Validation(_) => ErrorKind::ValidationError,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Identity(_) | AuthError::Token(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Text safe to return to the client
    pub fn client_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
            AuthError::MissingToken => "Authentication required.".to_string(),
            AuthError::InvalidToken => "Invalid or expired token.".to_string(),
            AuthError::MissingRefreshToken => "Refresh token missing.".to_string(),
            AuthError::RefreshRejected(_) => "Invalid refresh token.".to_string(),
            AuthError::Forbidden(reason) => (*reason).to_string(),
            AuthError::EmailTaken => "Email already registered.".to_string(),
            AuthError::Validation(message) => message.clone(),
            AuthError::NotFound(what) => format!("{what} not found."),
            AuthError::Database(_) | AuthError::Identity(_) | AuthError::Token(_) => {
                ErrorKind::Internal.default_message().to_string()
            }
        }
    }
}
