//! JSON error responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use filegate_core::catalog::CatalogError;
use filegate_shared::AppError;

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub error: &'static str,
    /// Human-readable detail.
    pub message: String,
}

/// Handler error rendered as [`ErrorBody`] with the matching status.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Reject the request as malformed.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AppError::Validation(msg.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(AppError::from(err))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self(AppError::PayloadTooLarge(err.body_text()))
        } else {
            Self::validation(err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if err.is_client_error() {
            err.message().to_string()
        } else {
            error!(code = err.error_code(), error = %err, "Request failed");
            server_message(&err).to_string()
        };

        let body = ErrorBody {
            success: false,
            error: err.error_code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Detail-free text for server-side failures.
fn server_message(err: &AppError) -> &'static str {
    match err {
        AppError::ExternalService(_) => "Storage operation failed",
        AppError::ServiceUnavailable(_) => "Storage is temporarily unavailable",
        _ => "An internal error occurred",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(AppError::NotFound("gone".into()), StatusCode::NOT_FOUND, "NOT_FOUND", "gone")]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "bad")]
    #[case(AppError::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", "big")]
    #[case(AppError::Conflict("dup".into()), StatusCode::CONFLICT, "CONFLICT", "dup")]
    #[case(
        AppError::ExternalService("s3 said no".into()),
        StatusCode::BAD_GATEWAY,
        "EXTERNAL_SERVICE_ERROR",
        "Storage operation failed"
    )]
    #[case(
        AppError::Database("pool timed out".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
        "DATABASE_ERROR",
        "An internal error occurred"
    )]
    #[tokio::test]
    async fn test_error_rendering(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
        #[case] message: &str,
    ) {
        let (actual_status, body) = render(err).await;
        assert_eq!(actual_status, status);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], code);
        assert_eq!(body["message"], message);
    }
}
