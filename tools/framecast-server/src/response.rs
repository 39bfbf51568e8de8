//! Error bodies and status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use framecast_common::error::FramecastError;

/// JSON error payload: `{error, message?, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A failed export, rendered for an untrusted caller.
#[derive(Debug)]
pub struct ApiError {
    error: FramecastError,
    expose_details: bool,
}

impl ApiError {
    /// `expose_details` should be false in production.
    pub fn new(error: FramecastError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.error)
    }

    pub fn body(&self) -> ErrorBody {
        let (headline, public_message) = match &self.error {
            FramecastError::Validation { message } => ("Invalid export request", Some(message.clone())),
            FramecastError::PageNotReady { message } => ("Page not ready", Some(message.clone())),
            FramecastError::CaptureEngine { message, .. } => {
                ("Video export failed", Some(message.clone()))
            }
            FramecastError::CaptureTimeout { .. } => {
                ("Video export timed out", Some(self.error.to_string()))
            }
            FramecastError::ServiceBusy { message } => ("Service busy", Some(message.clone())),
            _ => ("Internal server error", None),
        };

        let message = public_message.or_else(|| {
            self.expose_details
                .then(|| self.error.to_string())
        });

        ErrorBody {
            error: headline.to_string(),
            message,
            details: if self.expose_details {
                self.error.details()
            } else {
                None
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.error, "Export request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self.error, "Export request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

/// HTTP status for each error kind.
pub fn status_for(error: &FramecastError) -> StatusCode {
    match error {
        FramecastError::Validation { .. } => StatusCode::BAD_REQUEST,
        FramecastError::ServiceBusy { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
