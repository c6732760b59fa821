use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes;

/// Closed error taxonomy shared by every component of the auth core.
///
/// Matched exhaustively at the HTTP boundary; adding a variant forces every
/// producer of responses to decide how to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Wrong email or password. Never reveals which one.
    InvalidCredentials,
    /// Missing, invalid or expired access/refresh token, or a ledger row
    /// that no longer authenticates.
    Unauthorized,
    /// Authenticated but not allowed (role or ownership).
    Forbidden,
    /// Email already registered.
    Conflict,
    /// Malformed input.
    ValidationError,
    /// Referenced resource does not exist.
    NotFound,
    /// Anything unexpected. Details stay in the server log.
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidCredentials | ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::ValidationError => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => codes::INVALID_CREDENTIALS,
            ErrorKind::Unauthorized => codes::UNAUTHORIZED,
            ErrorKind::Forbidden => codes::FORBIDDEN,
            ErrorKind::Conflict => codes::CONFLICT,
            ErrorKind::ValidationError => codes::VALIDATION_ERROR,
            ErrorKind::NotFound => codes::NOT_FOUND,
            ErrorKind::Internal => codes::INTERNAL,
        }
    }

    /// Message used when the producer has nothing more specific to say
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "Invalid email or password.",
            ErrorKind::Unauthorized => "Authentication required.",
            ErrorKind::Forbidden => "You are not allowed to perform this action.",
            ErrorKind::Conflict => "Resource already exists.",
            ErrorKind::ValidationError => "Invalid request.",
            ErrorKind::NotFound => "Resource not found.",
            ErrorKind::Internal => "Internal server error",
        }
    }

    /// Server-side failures are logged at error level, client faults at debug
    pub fn is_server_error(self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
