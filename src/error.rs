//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info};

use crate::constants::{
    CONFIGURATION_ERROR_MESSAGE, GENERIC_UPSTREAM_ERROR_MESSAGE, MAX_REQUEST_BODY_BYTES,
};
use crate::provider::ErrorResponse;

/// Failures of the relay endpoint, rendered as `{"error": ...}` bodies.
#[derive(Debug)]
pub enum ProxyError {
    /// The request body or model name was unusable
    BadRequest(String),
    /// The request body went over the size limit
    PayloadTooLarge,
    /// No provider credential is configured
    Configuration,
    /// The provider rejected the request with a structured error
    Upstream {
        /// Provider message
        message: String,
        /// Provider status code
        status: StatusCode,
        /// Canonical status name, eg `RESOURCE_EXHAUSTED`; only logged
        reason: Option<String>,
    },
    /// Anything else; the details are logged, never returned
    InternalServerError(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ProxyError {
    fn from(err: axum::http::Error) -> Self {
        ProxyError::InternalServerError(err.to_string())
    }
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ProxyError::BadRequest(message) => {
                info!("Bad generation request: {}", message);
                error_response(StatusCode::BAD_REQUEST, &message)
            }
            ProxyError::PayloadTooLarge => {
                info!("Generation request body over {} bytes", MAX_REQUEST_BODY_BYTES);
                error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &format!("Request body exceeds {MAX_REQUEST_BODY_BYTES} bytes"),
                )
            }
            ProxyError::Configuration => {
                error!("Generation request refused: no provider credential configured");
                error_response(StatusCode::SERVICE_UNAVAILABLE, CONFIGURATION_ERROR_MESSAGE)
            }
            ProxyError::Upstream {
                message,
                status,
                reason,
            } => {
                match &reason {
                    Some(reason) => error!(
                        "Error proxying to provider API ({}, {}): {}",
                        status, reason, message
                    ),
                    None => error!("Error proxying to provider API ({}): {}", status, message),
                }
                error_response(status, &message)
            }
            ProxyError::InternalServerError(message) => {
                error!("Error proxying to provider API: {}", message);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_UPSTREAM_ERROR_MESSAGE,
                )
            }
        }
    }
}

/// Why a single generation call failed. None of these are retried.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GenerationError {
    /// The proxy has no provider credential
    Configuration,
    /// The provider (or the proxy) rejected the request
    Upstream {
        /// Message from the error body
        message: String,
        /// HTTP status of the response
        status: u16,
    },
    /// A successful response did not carry an image
    NoImageReturned(String),
    /// The proxy could not be reached
    Network(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "{CONFIGURATION_ERROR_MESSAGE}"),
            Self::Upstream { message, .. } => write!(f, "{message}"),
            Self::NoImageReturned(reason) => write!(f, "{reason}"),
            Self::Network(reason) => write!(f, "Network error: {reason}"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// What a failed call was trying to produce.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GenerationKind {
    /// A variation of the base image
    Variation,
    /// A new base image from text
    BaseImage,
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variation => write!(f, "variation"),
            Self::BaseImage => write!(f, "base image"),
        }
    }
}

/// A [`GenerationError`] tagged with the prompt that caused it, so aggregated
/// messages identify their prompt on their own.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PromptError {
    /// What the call was producing
    pub kind: GenerationKind,
    /// The prompt text as sent
    pub prompt: String,
    /// Underlying failure
    pub source: GenerationError,
}

impl PromptError {
    /// Tags `source` with a variation prompt.
    pub fn variation(prompt: &str, source: GenerationError) -> Self {
        Self {
            kind: GenerationKind::Variation,
            prompt: prompt.to_string(),
            source,
        }
    }

    /// Tags `source` with a base-image prompt.
    pub fn base_image(prompt: &str, source: GenerationError) -> Self {
        Self {
            kind: GenerationKind::BaseImage,
            prompt: prompt.to_string(),
            source,
        }
    }
}

impl std::fmt::Display for PromptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to generate {} for prompt \"{}\": {}",
            self.kind, self.prompt, self.source
        )
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
