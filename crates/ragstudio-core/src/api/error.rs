use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::CredentialError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Login was rejected by the backend
    #[error("Authentication failed - check your username and password")]
    Authentication,

    /// Operation needs a stored credential and none is present
    #[error("Not logged in")]
    MissingCredential,

    /// Backend answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Api { status: StatusCode, message: String },

    /// No response was received at all
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Success response did not match the declared type
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Credential store error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for raw bodies quoted in decode errors
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Backend failure body: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build the error for a failure response.
    ///
    /// Uses the `detail` string when the body carries one, otherwise
    /// `fallback`. Validation errors with a list-valued `detail` are joined
    /// from their `msg` fields.
    pub fn from_response(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| detail_message(&b.detail))
            .unwrap_or_else(|| fallback.to_string());
        ApiError::Api { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Authentication | ApiError::MissingCredential)
            || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

fn detail_message(detail: &serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "Something went wrong";

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Api { message, .. } => message,
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_detail_string_is_used() {
        let err = ApiError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"detail":"Pipeline not found"}"#,
            FALLBACK,
        );
        assert!(err.is_not_found());
        assert_eq!(message(err), "Pipeline not found");
    }

    #[test]
    fn test_fallback_for_unparsable_body() {
        for body in ["", "<html>502</html>", "{}", r#"{"detail":""}"#, r#"{"detail":42}"#] {
            let err = ApiError::from_response(StatusCode::BAD_GATEWAY, body, FALLBACK);
            assert_eq!(message(err), FALLBACK, "body: {:?}", body);
        }
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail":[{"loc":["body","name"],"msg":"field required"},{"msg":"too short"}]}"#;
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body, FALLBACK);
        assert_eq!(message(err), "field required; too short");
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, "", FALLBACK);
        assert!(err.is_unauthorized());
        assert!(ApiError::MissingCredential.is_unauthorized());
        assert!(!ApiError::Decode("x".into()).is_unauthorized());
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
        assert!(ApiError::truncate_body("short") == "short");
    }
}
