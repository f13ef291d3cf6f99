//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`DeliveryError`] so that route handlers
//! can return `Result<T, AppError>` directly.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::delivery::DeliveryError;

/// Wrapper so we can implement `IntoResponse` for the delivery error.
#[derive(Debug)]
pub struct AppError {
    inner: DeliveryError,
}

impl AppError {
    pub fn new(inner: DeliveryError) -> Self {
        Self { inner }
    }
}

impl From<DeliveryError> for AppError {
    fn from(e: DeliveryError) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in delivery handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
        });

        let mut response = (status, axum::Json(body)).into_response();

        if let DeliveryError::InvalidRange { size, .. } = &self.inner {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }

        response
    }
}
