//! Client for the relay: builds provider payloads and decodes image replies.

use std::future::Future;

use tracing::debug;
use url::Url;

use crate::asset::{ImageAsset, data_uri};
use crate::constants::{
    CONFIGURATION_ERROR_MESSAGE, DEFAULT_IMAGE_MODEL, GENERATE_PATH, IMAGE_RESPONSE_MIME_TYPE,
};
use crate::error::{GenerationError, PromptError};
use crate::provider::{
    Content, Contents, ErrorResponse, GenerateContentResponse, GenerationConfig, InlineData, Part,
    RelayRequest, first_inline_data, first_text,
};

/// A generated variation: a displayable image and the model's commentary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variation {
    /// `data:` URI of the generated image
    pub image_uri: String,
    /// Commentary from the model, empty when it sent none
    pub text: String,
}

/// Something that turns prompts into images.
pub trait ImageGenerator {
    /// Varies `image` according to `prompt`.
    fn generate_variation(
        &self,
        image: &ImageAsset,
        prompt: &str,
    ) -> impl Future<Output = Result<Variation, PromptError>> + Send;

    /// Creates a new base image from `prompt` alone.
    fn generate_base_image(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<ImageAsset, PromptError>> + Send;
}

/// [`ImageGenerator`] backed by the relay's `/api/generate` endpoint.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    http: reqwest::Client,
    endpoint: Url,
    variation_model: String,
    base_image_model: String,
}

impl GenerationClient {
    /// Client for the relay running at `server`.
    pub fn new(server: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: server.join(GENERATE_PATH)?,
            variation_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_image_model: DEFAULT_IMAGE_MODEL.to_string(),
        })
    }

    /// Overrides the models used for variations and base images.
    pub fn with_models(mut self, variation_model: &str, base_image_model: &str) -> Self {
        self.variation_model = variation_model.to_string();
        self.base_image_model = base_image_model.to_string();
        self
    }

    /// The relay endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call(&self, request: &RelayRequest) -> Result<GenerateContentResponse, GenerationError> {
        debug!("POST {} (model {})", self.endpoint, request.model);
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| GenerationError::Network(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GenerationError::Network(err.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            GenerationError::NoImageReturned(format!("Unreadable response from the API: {err}"))
        })
    }

    async fn request_image(
        &self,
        model: &str,
        parts: Vec<Part>,
    ) -> Result<(InlineData, String), GenerationError> {
        let request = RelayRequest {
            model: model.to_string(),
            contents: Contents::Many(vec![Content::from_parts(parts)]),
            config: GenerationConfig::with_response_mime_type(IMAGE_RESPONSE_MIME_TYPE),
        };
        let response = self.call(&request).await?;
        extract_image(&response)
    }
}

impl ImageGenerator for GenerationClient {
    async fn generate_variation(
        &self,
        image: &ImageAsset,
        prompt: &str,
    ) -> Result<Variation, PromptError> {
        let parts = vec![
            Part::inline(image.mime_type(), image.base64()),
            Part::text(prompt),
        ];
        let (image, text) = self
            .request_image(&self.variation_model, parts)
            .await
            .map_err(|err| PromptError::variation(prompt, err))?;

        Ok(Variation {
            image_uri: data_uri(&image.mime_type, &image.data),
            text,
        })
    }

    async fn generate_base_image(&self, prompt: &str) -> Result<ImageAsset, PromptError> {
        let (image, _text) = self
            .request_image(&self.base_image_model, vec![Part::text(prompt)])
            .await
            .map_err(|err| PromptError::base_image(prompt, err))?;

        ImageAsset::from_base64(&image.data, &image.mime_type).map_err(|err| {
            PromptError::base_image(
                prompt,
                GenerationError::NoImageReturned(format!("API returned an unusable image: {err}")),
            )
        })
    }
}

/// Turns a non-2xx relay response into the error taxonomy.
fn classify_failure(status: u16, body: &[u8]) -> GenerationError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .map(|parsed| parsed.error);

    match message {
        Some(message) if status == 503 && message == CONFIGURATION_ERROR_MESSAGE => {
            GenerationError::Configuration
        }
        Some(message) => GenerationError::Upstream { message, status },
        None => GenerationError::Upstream {
            message: format!("Server responded with status {status}"),
            status,
        },
    }
}

/// First image part (required) and first text part (optional) of the first
/// candidate.
fn extract_image(response: &GenerateContentResponse) -> Result<(InlineData, String), GenerationError> {
    let parts = response.first_candidate_parts().ok_or_else(|| {
        GenerationError::NoImageReturned("No candidates returned from the API.".to_string())
    })?;
    let image = first_inline_data(parts)
        .ok_or_else(|| GenerationError::NoImageReturned("API did not return an image.".to_string()))?;
    let text = first_text(parts).unwrap_or_default();

    Ok((image.clone(), text.to_string()))
}
