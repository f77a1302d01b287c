//! Error surface of the transport layer.
//!
//! Services return `nairex_types::Error`; this wrapper maps the kind to an
//! HTTP status and serializes the `{type, message, internal?}` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use nairex_types::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maps_kind_to_status_and_envelope() {
        let response =
            ApiError::from(Error::failed_dependency("Insufficient Balance")).into_response();
        assert_eq!(response.status(), StatusCode::FAILED_DEPENDENCY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "FAILED_DEPENDENCY");
        assert_eq!(value["message"], "Insufficient Balance");
    }
}
