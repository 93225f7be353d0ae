//! Endpoint error → JSON `{error}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use studio_core::wire::ErrorBody;
use studio_core::RelayError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing required field.
    #[error("{0}")]
    BadRequest(&'static str),

    /// Body present but not usable as JSON; carries the extractor's status.
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    /// Configuration, upstream and transport failures alike; the message carries the detail.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Relay(e) = &self {
            tracing::error!(error = %e, upstream_status = ?e.upstream_status(), "relay call failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
