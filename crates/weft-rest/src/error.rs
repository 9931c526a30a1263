//! Handler error mapped onto the wire.
//!
//! Every backend failure surfaces as a 500 with a `{"message": ...}`
//! body carrying the error chain text, which is what the single-page
//! client displays.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use weft_gateway::GatewayError;
use weft_provisioner::EnrollError;

#[derive(Debug)]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(message = %self.message, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": self.message })),
        )
            .into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<EnrollError> for ApiError {
    fn from(err: EnrollError) -> Self {
        Self::new(err.to_string())
    }
}
