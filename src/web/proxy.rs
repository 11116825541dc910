use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::Response;
use tracing::debug;

use super::AppState;
use crate::constants::{GENERIC_UPSTREAM_ERROR_MESSAGE, X_GOOG_API_KEY};
use crate::error::ProxyError;
use crate::provider::{ForwardedRequest, ProviderErrorBody, UpstreamRequest};

pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<ForwardedRequest>, JsonRejection>,
) -> Result<Response, ProxyError> {
    let Json(request) = payload.map_err(|err| match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ProxyError::PayloadTooLarge,
        _ => ProxyError::BadRequest(err.body_text()),
    })?;
    relay(&state, &request).await
}

/// Forwards `request` to the provider with the credential attached.
///
/// `contents` and `config` go upstream as received. Successful provider
/// responses are passed through byte for byte.
pub(crate) async fn relay(
    state: &AppState,
    request: &ForwardedRequest,
) -> Result<Response, ProxyError> {
    let api_key = state.api_key.as_deref().ok_or(ProxyError::Configuration)?;

    validate_model(&request.model)?;
    let contents = request
        .typed_contents()
        .map_err(|err| ProxyError::BadRequest(format!("invalid contents: {err}")))?;
    if contents.parts().next().is_none() {
        return Err(ProxyError::BadRequest(
            "contents must contain at least one part".to_string(),
        ));
    }

    let url = state.upstream_url(&request.model);
    debug!("Relaying generation request for model {}", request.model);
    let upstream = state
        .client
        .post(url)
        .header(X_GOOG_API_KEY, api_key)
        .json(&UpstreamRequest {
            contents: &request.contents,
            generation_config: &request.config,
        })
        .send()
        .await?;

    let status = upstream.status();
    let body = upstream.bytes().await?;

    if status.is_success() {
        return Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(ProxyError::from);
    }

    Err(upstream_failure(status, &body))
}

/// Maps a failed provider response onto the relay's error shape.
fn upstream_failure(status: StatusCode, body: &[u8]) -> ProxyError {
    let detail = serde_json::from_slice::<ProviderErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error);

    match detail {
        Some(detail) => ProxyError::Upstream {
            message: detail
                .message
                .unwrap_or_else(|| GENERIC_UPSTREAM_ERROR_MESSAGE.to_string()),
            status: detail
                .code
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            reason: detail.status,
        },
        None => ProxyError::InternalServerError(format!(
            "provider responded {} without a structured error",
            status
        )),
    }
}

/// Model names end up in the upstream path, so only plain identifiers pass.
fn validate_model(model: &str) -> Result<(), ProxyError> {
    if model.is_empty() {
        return Err(ProxyError::BadRequest("model must not be empty".to_string()));
    }
    let valid = model
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ProxyError::BadRequest(format!("invalid model name: {model}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_are_plain_identifiers() {
        assert!(validate_model("gemini-1.5-flash-latest").is_ok());
        assert!(validate_model("gemini_2.0").is_ok());
        assert!(matches!(validate_model(""), Err(ProxyError::BadRequest(_))));
        assert!(matches!(
            validate_model("../secrets"),
            Err(ProxyError::BadRequest(_))
        ));
        assert!(matches!(
            validate_model("gemini?key=x"),
            Err(ProxyError::BadRequest(_))
        ));
    }

    #[test]
    fn structured_provider_errors_keep_code_and_message() {
        let err = upstream_failure(
            StatusCode::BAD_REQUEST,
            br#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#,
        );
        assert!(matches!(
            err,
            ProxyError::Upstream { ref message, status, ref reason }
                if message == "Quota exceeded"
                    && status == StatusCode::TOO_MANY_REQUESTS
                    && reason.as_deref() == Some("RESOURCE_EXHAUSTED")
        ));
    }

    #[test]
    fn missing_code_falls_back_to_500() {
        let err = upstream_failure(
            StatusCode::BAD_REQUEST,
            br#"{"error": {"message": "Something broke"}}"#,
        );
        assert!(matches!(
            err,
            ProxyError::Upstream { status, ref reason, .. }
                if status == StatusCode::INTERNAL_SERVER_ERROR && reason.is_none()
        ));
    }

    #[test]
    fn unstructured_errors_become_internal() {
        let err = upstream_failure(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert!(matches!(err, ProxyError::InternalServerError(_)));
    }
}
