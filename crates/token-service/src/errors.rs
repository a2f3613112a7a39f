//! Token service error types.
//!
//! Errors render as `{"errorMessage": "..."}`, the body shape the presenter
//! client reads. Signing failures are logged server-side and reported with a
//! generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl TokenServiceError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TokenServiceError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_message: String,
}

impl IntoResponse for TokenServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            TokenServiceError::BadRequest(reason) => reason,
            TokenServiceError::Signing(err) => {
                tracing::error!(target: "token_service.handlers", error = %err, "Failed to sign room token");
                "Failed to issue token".to_string()
            }
        };

        (status, Json(ErrorBody { error_message })).into_response()
    }
}

impl From<common::jwt::JwtError> for TokenServiceError {
    fn from(err: common::jwt::JwtError) -> Self {
        TokenServiceError::Signing(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_response() {
        let response =
            TokenServiceError::BadRequest("roomName and participantName are required".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(
            body["errorMessage"],
            "roomName and participantName are required"
        );
    }

    #[tokio::test]
    async fn test_signing_error_is_generic() {
        let response = TokenServiceError::Signing("key too short".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["errorMessage"], "Failed to issue token");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TokenServiceError::BadRequest("missing".to_string()).to_string(),
            "Bad request: missing"
        );
    }
}
