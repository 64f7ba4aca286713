//! Response envelope and error mapping shared by all handlers

pub mod validated_json;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::shared::errors::DomainError;

/// Field name -> list of messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Standard API response envelope
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}` plus
/// `errors` when individual fields were rejected.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    /// Failure with per-field messages. `error` carries the messages alone;
    /// the field names live in `errors`.
    pub fn field_errors(errors: FieldErrors) -> Self {
        let message = if errors.is_empty() {
            "Validation failed".to_string()
        } else {
            errors.values().flatten().cloned().collect::<Vec<_>>().join("; ")
        };
        Self {
            success: false,
            data: None,
            error: Some(message),
            errors: Some(errors),
        }
    }
}

/// Failure returned by a handler
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// Request fields rejected before reaching the service
    Fields(FieldErrors),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Fields(_) => StatusCode::BAD_REQUEST,
            Self::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Self::Domain(DomainError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Domain(DomainError::Consistency(_) | DomainError::Storage(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Fields(errors) => ApiResponse::<()>::field_errors(errors),
            Self::Domain(DomainError::Validation { field, message }) => {
                let mut errors = FieldErrors::new();
                errors.insert(field.to_string(), vec![message]);
                ApiResponse::field_errors(errors)
            }
            Self::Domain(DomainError::Conflict(message)) => ApiResponse::error(message),
            Self::Domain(e @ DomainError::NotFound { .. }) => ApiResponse::error(e.to_string()),
            Self::Domain(e) => {
                error!("Internal error: {}", e);
                ApiResponse::error("Internal server error")
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::validation("updated_at", "bad"), StatusCode::BAD_REQUEST),
            (DomainError::dispenser_not_found("abc"), StatusCode::NOT_FOUND),
            (DomainError::Consistency("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
        assert_eq!(
            ApiError::Fields(FieldErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn field_errors_serialize_with_joined_message() {
        let mut errors = FieldErrors::new();
        errors.insert("flow_volume".into(), vec!["This field is required.".into()]);
        let json = serde_json::to_value(ApiResponse::<()>::field_errors(errors)).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "This field is required.");
        assert_eq!(json["errors"]["flow_volume"][0], "This field is required.");
    }

    #[tokio::test]
    async fn domain_validation_error_keeps_bare_message() {
        let err = ApiError::from(DomainError::validation(
            "updated_at",
            "updated_at value must be greater than opened_at",
        ));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "updated_at value must be greater than opened_at");
        assert_eq!(
            json["errors"]["updated_at"][0],
            "updated_at value must be greater than opened_at"
        );
    }

    #[test]
    fn success_omits_error_fields() {
        let json = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 1}));
    }
}
