//! Shared constants/defaults for the proxy and its clients
//!

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default base URL of the provider API.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Header carrying the provider credential on upstream calls.
pub const X_GOOG_API_KEY: &str = "x-goog-api-key";

/// Path of the relay endpoint.
pub const GENERATE_PATH: &str = "/api/generate";

/// Largest request body the relay accepts (inline images travel in it).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Model used for both variations and base images unless overridden.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-1.5-flash-latest";

/// Response format hint sent with every image request.
pub const IMAGE_RESPONSE_MIME_TYPE: &str = "image/png";

/// Body message returned when the proxy has no credential. Clients match on it.
pub const CONFIGURATION_ERROR_MESSAGE: &str = "API key is not configured on the server.";

/// Generic message for upstream failures without a structured error.
pub const GENERIC_UPSTREAM_ERROR_MESSAGE: &str = "Internal Server Error";

/// Validation message when a run is requested without image or prompt.
pub const MISSING_INPUT_MESSAGE: &str = "Please upload an image and provide at least one prompt.";
