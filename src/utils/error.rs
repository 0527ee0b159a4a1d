use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::aiforged::ClientError;

pub const GENERIC_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request.";

/// Outcome of a handler that did not succeed.
///
/// Validation failures never reach the remote platform. Everything the remote
/// client raises without a handler-specific mapping ends up as `Unexpected`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// The remote platform refused the operation (non-success status).
    #[error("{0}")]
    Rejected(String),
    /// The remote call completed but its outcome is unusable.
    #[error("{0}")]
    RemoteFailure(String),
    #[error("{GENERIC_ERROR_MESSAGE} Details: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        ApiError::Unexpected(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotFound(_) | ApiError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RemoteFailure(_) | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_client_errors_become_unexpected() {
        let err: ApiError = ClientError::Status {
            operation: "Document/GetDocument",
            status: 503,
            body: "maintenance window".into(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = err.to_string();
        assert!(message.starts_with(GENERIC_ERROR_MESSAGE));
        assert!(message.contains("maintenance window"));
    }

    #[test]
    fn test_client_side_kinds_map_to_bad_request() {
        for err in [
            ApiError::validation("Invalid document ID."),
            ApiError::NotFound("Document with ID 7 not found.".into()),
            ApiError::Rejected("Error uploading file a.pdf".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            ApiError::RemoteFailure("No documents returned.".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_error_body_is_json_envelope() {
        let response = ApiError::validation("Invalid document ID.").error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid document ID.");
    }
}
