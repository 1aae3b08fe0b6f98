use crate::config::ADMIN_TOKEN_ENV;
use crate::imaging::CompressError;
use crate::media::MediaError;
use crate::records::RecordError;
use crate::store::StoreError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Invalid(#[from] RecordError),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid admin token")]
    Unauthorized,

    #[error("Admin API is disabled; set {ADMIN_TOKEN_ENV} to enable it")]
    AdminDisabled,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Compression(#[from] CompressError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AdminDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Compression(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(_) | ApiError::Media(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            ApiError::Invalid(RecordError::Invalid { field, message }) => {
                json!({ "error": self.to_string(), "field": field, "message": message })
            }
            ApiError::Compression(e) => json!({ "error": self.to_string(), "file": e.file() }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocId;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::from(RecordError::invalid("name", "empty")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AdminDisabled.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::from(StoreError::NotFound {
                collection: "blog",
                id: DocId::from("x")
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StoreError::Version {
                collection: "blog",
                found: 9
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(CompressError::Decode {
                file: "a.jpg".into(),
                reason: "bad header".into()
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn validation_body_names_field() {
        let response = ApiError::from(RecordError::invalid("email", "is not valid")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["field"], "email");
        assert_eq!(body["error"], "email: is not valid");
    }
}
