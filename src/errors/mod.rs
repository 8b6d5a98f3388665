//! Error types for the request gating and generation layers.
//!
//! `GenerationError` describes what went wrong talking to the image
//! provider; `ApiError` is what a handler hands back to the browser.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failures of the outbound generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("{0}")]
    Transport(String),
    /// The provider answered with an error status.
    #[error("{message}")]
    Provider { status: u16, message: String },
    /// The provider answered 2xx but the body could not be understood.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
    /// No response part carried inline image data.
    #[error("No image generated")]
    NoImage,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Errors rendered as `{ "error": message }` JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Provider(String),
    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after: Duration },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Configuration(_) | ApiError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            ApiError::Provider("Generation failed".to_string())
        } else {
            ApiError::Provider(message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));

        match self {
            ApiError::RateLimited { retry_after } => {
                let mut response = (status, body).into_response();
                // Round up so clients never retry inside the window
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Configuration("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Provider("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::RateLimited { retry_after: Duration::from_secs(1) }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn empty_provider_message_becomes_generation_failed() {
        let err: ApiError = GenerationError::Provider {
            status: 500,
            message: String::new(),
        }
        .into();
        assert_eq!(err.to_string(), "Generation failed");
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = ApiError::RateLimited {
            retry_after: Duration::from_millis(12_300),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
    }
}
