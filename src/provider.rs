//! Wire shapes of the provider's `generateContent` API and of the relay in
//! front of it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base64 payload plus the MIME type it decodes to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    /// MIME type of the decoded payload, eg `image/png`.
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    /// Standard base64 payload.
    pub data: String,
}

/// One part of a multimodal content entry.
///
/// Variants are tried in order, so a part carrying inline data is always an
/// [`Part::InlineData`] even if it also has a `text` field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Inline binary data, images in practice.
    InlineData {
        /// The payload.
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
}

impl Part {
    /// Builds an inline-data part.
    pub fn inline(mime_type: &str, data: &str) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            },
        }
    }

    /// Builds a text part.
    pub fn text(text: &str) -> Self {
        Part::Text {
            text: text.to_string(),
        }
    }

    /// Returns the inline data when this is an inline-data part.
    pub fn as_inline_data(&self) -> Option<&InlineData> {
        match self {
            Part::InlineData { inline_data } => Some(inline_data),
            Part::Text { .. } => None,
        }
    }

    /// Returns the text when this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

/// A content entry: an optional role and its parts.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; the provider defaults to `user` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A role-less content entry holding `parts`.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { role: None, parts }
    }
}

/// The `contents` field of a request. Callers may send a single entry or a
/// list; it is forwarded in the shape it arrived in.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    /// A list of entries, the provider's canonical form.
    Many(Vec<Content>),
    /// A single entry.
    One(Content),
}

impl Contents {
    /// Iterates over every part of every entry.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        let entries: &[Content] = match self {
            Contents::Many(entries) => entries,
            Contents::One(entry) => std::slice::from_ref(entry),
        };
        entries.iter().flat_map(|entry| entry.parts.iter())
    }
}

/// Generation settings. Fields other than the response MIME type are kept
/// as-is so the relay forwards them untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Requested output MIME type, eg `image/png`.
    #[serde(
        rename = "responseMimeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_mime_type: Option<String>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerationConfig {
    /// A config asking for output of the given MIME type.
    pub fn with_response_mime_type(mime_type: &str) -> Self {
        Self {
            response_mime_type: Some(mime_type.to_string()),
            extra: Map::new(),
        }
    }
}

/// Body of `POST /api/generate` as the client builds it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    /// Provider model identifier.
    pub model: String,
    /// Multimodal input.
    pub contents: Contents,
    /// Generation settings, forwarded as `generationConfig`.
    #[serde(default)]
    pub config: GenerationConfig,
}

/// Body of `POST /api/generate` as the relay receives it.
///
/// `contents` and `config` are kept as raw JSON and forwarded untouched;
/// [`ForwardedRequest::typed_contents`] is only used to validate them.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ForwardedRequest {
    /// Provider model identifier.
    pub model: String,
    /// Multimodal input, exactly as sent by the client.
    pub contents: Value,
    /// Generation settings, exactly as sent by the client.
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl ForwardedRequest {
    /// Reads `contents` through the typed model without consuming it.
    pub fn typed_contents(&self) -> Result<Contents, serde_json::Error> {
        Contents::deserialize(&self.contents)
    }
}

/// Body sent to the provider's `generateContent` endpoint.
#[derive(Debug, Serialize)]
pub struct UpstreamRequest<'a> {
    /// Multimodal input.
    pub contents: &'a Value,
    /// Generation settings.
    #[serde(rename = "generationConfig")]
    pub generation_config: &'a Map<String, Value>,
}

/// Successful `generateContent` response, reduced to what clients read.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    /// Candidate completions, best first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One candidate completion.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Candidate {
    /// Generated content; missing when the candidate was blocked.
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, or `None` when there are no candidates.
    pub fn first_candidate_parts(&self) -> Option<&[Part]> {
        let candidate = self.candidates.first()?;
        Some(
            candidate
                .content
                .as_ref()
                .map(|content| content.parts.as_slice())
                .unwrap_or_default(),
        )
    }
}

/// First inline-data part in `parts`.
pub fn first_inline_data(parts: &[Part]) -> Option<&InlineData> {
    parts.iter().find_map(Part::as_inline_data)
}

/// First text part in `parts`.
pub fn first_text(parts: &[Part]) -> Option<&str> {
    parts.iter().find_map(Part::as_text)
}

/// Error body returned by the provider.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderErrorBody {
    /// Structured error, when the provider sent one.
    #[serde(default)]
    pub error: Option<ProviderErrorDetail>,
}

/// Structured provider error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderErrorDetail {
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// HTTP status code the provider associates with the error.
    #[serde(default)]
    pub code: Option<u16>,
    /// Canonical status name, eg `INVALID_ARGUMENT`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned by the relay.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message; never contains credentials.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parts_deserialize_into_tagged_variants() {
        let parts: Vec<Part> = serde_json::from_value(json!([
            {"text": "a caption"},
            {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
            {"inline_data": {"mime_type": "image/jpeg", "data": "BBBB"}},
        ]))
        .expect("parse parts");

        assert_eq!(parts[0], Part::text("a caption"));
        assert_eq!(parts[1], Part::inline("image/png", "AAAA"));
        assert_eq!(parts[2], Part::inline("image/jpeg", "BBBB"));
    }

    #[test]
    fn first_matching_parts_are_selected() {
        let parts = vec![
            Part::text("first"),
            Part::inline("image/png", "one"),
            Part::text("second"),
            Part::inline("image/webp", "two"),
        ];
        assert_eq!(first_text(&parts), Some("first"));
        assert_eq!(
            first_inline_data(&parts).map(|data| data.data.as_str()),
            Some("one")
        );
        assert!(first_inline_data(&[Part::text("only text")]).is_none());
    }

    #[test]
    fn contents_keep_their_shape() {
        let single = json!({"parts": [{"text": "hi"}]});
        let contents: Contents = serde_json::from_value(single.clone()).expect("parse single");
        assert!(matches!(contents, Contents::One(_)));
        assert_eq!(serde_json::to_value(&contents).expect("serialize"), single);

        let many = json!([{"role": "user", "parts": [{"text": "hi"}]}]);
        let contents: Contents = serde_json::from_value(many.clone()).expect("parse many");
        assert!(matches!(contents, Contents::Many(_)));
        assert_eq!(serde_json::to_value(&contents).expect("serialize"), many);
    }

    #[test]
    fn malformed_parts_are_rejected() {
        let result: Result<Contents, _> =
            serde_json::from_value(json!({"parts": [{"inlineData": {"data": "AAAA"}}]}));
        assert!(result.is_err());
    }

    #[test]
    fn generation_config_preserves_unknown_fields() {
        let raw = json!({"responseMimeType": "image/png", "temperature": 0.4});
        let config: GenerationConfig = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(config.response_mime_type.as_deref(), Some("image/png"));
        assert_eq!(serde_json::to_value(&config).expect("serialize"), raw);
    }

    #[test]
    fn relay_request_config_defaults_to_empty() {
        let request: RelayRequest = serde_json::from_value(json!({
            "model": "gemini-1.5-flash-latest",
            "contents": {"parts": [{"text": "hello"}]}
        }))
        .expect("parse request");
        assert_eq!(request.config, GenerationConfig::default());
        assert_eq!(request.contents.parts().count(), 1);
    }

    #[test]
    fn forwarded_requests_keep_unknown_part_fields() {
        let contents = json!([{"role": "user", "parts": [
            {"text": "hi", "thought": true},
            {"inlineData": {"mimeType": "image/png", "data": "AAAA", "displayName": "base.png"}}
        ]}]);
        let request: ForwardedRequest = serde_json::from_value(json!({
            "model": "gemini-1.5-flash-latest",
            "contents": contents.clone(),
        }))
        .expect("parse request");

        assert!(request.config.is_empty());
        assert_eq!(request.typed_contents().expect("typed").parts().count(), 2);
        let upstream = UpstreamRequest {
            contents: &request.contents,
            generation_config: &request.config,
        };
        assert_eq!(
            serde_json::to_value(&upstream).expect("serialize"),
            json!({"contents": contents, "generationConfig": {}})
        );

        let bogus: ForwardedRequest = serde_json::from_value(json!({
            "model": "m",
            "contents": {"parts": [{"bogus": 1}]}
        }))
        .expect("raw contents are not checked on parse");
        assert!(bogus.typed_contents().is_err());
    }

    #[test]
    fn response_without_candidates_has_no_parts() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({})).expect("parse empty");
        assert!(response.first_candidate_parts().is_none());

        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]}))
                .expect("parse blocked");
        assert_eq!(response.first_candidate_parts(), Some(&[][..]));
    }

    #[test]
    fn provider_error_body_is_optional() {
        let body: ProviderErrorBody = serde_json::from_value(json!({
            "error": {"code": 400, "message": "bad image", "status": "INVALID_ARGUMENT"}
        }))
        .expect("parse error body");
        let detail = body.error.expect("detail");
        assert_eq!(detail.code, Some(400));
        assert_eq!(detail.message.as_deref(), Some("bad image"));
        assert_eq!(detail.status.as_deref(), Some("INVALID_ARGUMENT"));

        let body: ProviderErrorBody = serde_json::from_value(json!({})).expect("parse empty");
        assert!(body.error.is_none());
    }
}
