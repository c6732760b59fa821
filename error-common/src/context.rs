use serde::{Deserialize, Serialize};

use crate::types::ErrorKind;

/// Uniform error response: `{ "error": { "code", "message", "requestId" } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: kind.code().to_string(),
                message: message.into(),
                request_id: None,
            },
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.error.request_id = Some(request_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::new(ErrorKind::Forbidden, "nope").with_request_id("req-1");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["message"], "nope");
        assert_eq!(json["error"]["requestId"], "req-1");
    }

    #[test]
    fn test_missing_request_id_serializes_as_null() {
        let json = serde_json::to_value(ErrorBody::new(ErrorKind::Internal, "x")).unwrap();
        assert!(json["error"]["requestId"].is_null());
    }
}
