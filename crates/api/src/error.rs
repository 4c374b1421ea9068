//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use coffer_core::attachment::AttachmentError;
use coffer_core::owner::OwnerError;
use coffer_shared::{AppError, ErrorResponse};
use tracing::{error, warn};

/// A failed request: the application error plus remediation hints.
///
/// Rendered as `{message, recommendedActions, errorCode}` with the status
/// from [`AppError::status_code`].
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    recommended_actions: Vec<String>,
}

impl ApiError {
    /// Wrap an application error with hints.
    #[must_use]
    pub fn new(error: AppError, recommended_actions: Vec<String>) -> Self {
        Self {
            error,
            recommended_actions,
        }
    }

    /// A 400 for malformed input caught before reaching the core.
    #[must_use]
    pub fn bad_request(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(AppError::Validation(message.into()), vec![action.into()])
    }

    /// The wrapped error.
    #[must_use]
    pub fn error(&self) -> &AppError {
        &self.error
    }
}

impl From<OwnerError> for ApiError {
    fn from(err: OwnerError) -> Self {
        let actions = err.recommended_actions();
        Self::new(err.into(), actions)
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        let actions = err.recommended_actions();
        Self::new(err.into(), actions)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(
                error = %self.error,
                code = self.error.error_code(),
                retryable = self.error.is_retryable(),
                "request failed"
            );
        } else {
            warn!(error = %self.error, code = self.error.error_code(), "request rejected");
        }

        let body = ErrorResponse::new(&self.error, self.recommended_actions);
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_error_keeps_actions() {
        let api = ApiError::from(AttachmentError::EmptyDescription);
        assert_eq!(api.error().status_code(), 400);
        assert_eq!(api.recommended_actions.len(), 1);
    }

    #[test]
    fn test_status_is_carried() {
        let response = ApiError::from(OwnerError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError::bad_request("missing file", "Pass ?file=").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
