// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of core errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_core::ParleyError;
use serde::Serialize;

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// An error returned from a handler.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    /// A request parameter was missing or unusable.
    BadRequest(String),
    Core(ParleyError),
}

impl From<ParleyError> for ApiError {
    fn from(e: ParleyError) -> Self {
        Self::Core(e)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Core(ParleyError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            Self::Core(ParleyError::RateLimited) => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests, please try again later".to_string(),
            ),
            Self::Core(ParleyError::NotFound { entity, .. }) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            Self::Core(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        let cases = [
            (
                ApiError::from(ParleyError::Validation("message must not be empty".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(ParleyError::RateLimited), StatusCode::TOO_MANY_REQUESTS),
            (
                ApiError::from(ParleyError::conversation_not_found(9)),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status_and_message().0, expected);
        }
    }

    #[test]
    fn validation_message_is_passed_through() {
        let (_, message) =
            ApiError::from(ParleyError::Validation("rating must be between 1 and 5".into()))
                .status_and_message();
        assert_eq!(message, "rating must be between 1 and 5");
    }

    #[test]
    fn server_errors_hide_details() {
        let error = ApiError::from(ParleyError::Internal("disk on fire at /var/lib".into()));
        let (status, message) = error.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("/var/lib"));

        let error = ApiError::from(ParleyError::Provider {
            message: "API key not valid".into(),
            source: None,
        });
        assert!(!error.status_and_message().1.contains("API key"));
    }
}
