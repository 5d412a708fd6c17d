//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use laneboard_core::CoreError;
use laneboard_store::StoreError;
use serde::Serialize;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    long_message: String,
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    long_message: String,
}

impl ApiError {
    /// A `400 Bad Request` with a short and a detailed message.
    pub fn bad_request(message: impl Into<String>, long_message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            long_message: long_message.into(),
        }
    }

    /// A `500 Internal Server Error`.
    pub fn internal(long_message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal error".to_string(),
            long_message: long_message.into(),
        }
    }

    pub(crate) fn invalid_id(raw: &str) -> Self {
        Self::bad_request("Invalid id", format!("'{raw}' is not a valid client id"))
    }

    /// HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = match &err {
            CoreError::NotFound(_) => "Client not found",
            CoreError::InvalidLane(_) => "Invalid status",
            CoreError::InvalidPriority(_) => "Invalid priority",
            CoreError::RankOverflow(_) => "Lane is full",
            CoreError::Storage(_) => return Self::internal(err.to_string()),
        };
        Self::bad_request(message, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CoreError::NotFound(id).into(),
            StoreError::Core(err) => err.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.long_message, "Request failed");
        } else {
            tracing::debug!(error = %self.long_message, "Rejected request");
        }

        let body = Json(ErrorBody {
            message: self.message,
            long_message: self.long_message,
        });

        (self.status, body).into_response()
    }
}
