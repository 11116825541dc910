//! Application state: base image, prompt list, latest results and status.
//!
//! All changes go through [`AppController`] methods, which enforce the
//! transition rules:
//!
//! - a new base image discards results and resets the run to idle;
//! - prompt edits never touch results or status;
//! - a run clears the previous results before anything is dispatched.

use tracing::{debug, info};
use uuid::Uuid;

use crate::asset::ImageAsset;
use crate::client::ImageGenerator;
use crate::constants::MISSING_INPUT_MESSAGE;
use crate::error::PromptError;
use crate::orchestrator::{GenerationResult, RunStatus, run_generation};

/// One variation prompt in the editable list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PromptEntry {
    id: Uuid,
    value: String,
}

impl PromptEntry {
    /// A prompt with a fresh identifier.
    pub fn new(value: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            value: value.to_string(),
        }
    }

    /// Stable identifier, unique within a list.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Text as entered.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when the text is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Rejected controller actions.
#[derive(Debug)]
pub enum ControllerError {
    /// A run needs a base image and at least one non-blank prompt
    MissingInput,
    /// The prompt list may not become empty
    LastPrompt,
    /// No prompt has this identifier
    UnknownPrompt(Uuid),
    /// Generating a new base image failed
    BaseImage(PromptError),
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput => write!(f, "{MISSING_INPUT_MESSAGE}"),
            Self::LastPrompt => write!(f, "At least one prompt is required"),
            Self::UnknownPrompt(id) => write!(f, "No prompt with id {id}"),
            Self::BaseImage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ControllerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BaseImage(err) => Some(err),
            _ => None,
        }
    }
}

/// Owns the session state and drives generation runs.
#[derive(Debug)]
pub struct AppController<G> {
    generator: G,
    base_image: Option<ImageAsset>,
    prompts: Vec<PromptEntry>,
    results: Vec<GenerationResult>,
    status: RunStatus,
    error: Option<String>,
    base_image_error: Option<String>,
}

impl<G: ImageGenerator> AppController<G> {
    /// Fresh session: no image, one empty prompt, idle.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            base_image: None,
            prompts: vec![PromptEntry::new("")],
            results: Vec::new(),
            status: RunStatus::Idle,
            error: None,
            base_image_error: None,
        }
    }

    /// The current base image.
    pub fn base_image(&self) -> Option<&ImageAsset> {
        self.base_image.as_ref()
    }

    /// Prompts in display order.
    pub fn prompts(&self) -> &[PromptEntry] {
        &self.prompts
    }

    /// Variations from the latest run, in prompt order.
    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    /// Status of the latest run.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Validation message or the latest run's failures, one per line.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Failure of the latest base-image generation.
    pub fn base_image_error(&self) -> Option<&str> {
        self.base_image_error.as_deref()
    }

    /// Whether a run would be dispatched right now.
    pub fn can_generate(&self) -> bool {
        self.base_image.is_some()
            && self.prompts.iter().any(|prompt| !prompt.is_blank())
            && self.status != RunStatus::InProgress
    }

    /// Replaces (or clears) the base image. Prior results no longer apply,
    /// so they are dropped and the run goes back to idle.
    pub fn set_base_image(&mut self, image: Option<ImageAsset>) {
        self.base_image = image;
        self.results.clear();
        self.status = RunStatus::Idle;
        self.error = None;
    }

    /// Appends an empty prompt and returns its identifier.
    pub fn add_prompt(&mut self) -> Uuid {
        let prompt = PromptEntry::new("");
        let id = prompt.id;
        self.prompts.push(prompt);
        id
    }

    /// Removes a prompt; the last remaining one cannot be removed.
    pub fn remove_prompt(&mut self, id: Uuid) -> Result<(), ControllerError> {
        let index = self.position(id)?;
        if self.prompts.len() == 1 {
            return Err(ControllerError::LastPrompt);
        }
        self.prompts.remove(index);
        Ok(())
    }

    /// Replaces a prompt's text.
    pub fn update_prompt(&mut self, id: Uuid, value: &str) -> Result<(), ControllerError> {
        let index = self.position(id)?;
        self.prompts[index].value = value.to_string();
        Ok(())
    }

    fn position(&self, id: Uuid) -> Result<usize, ControllerError> {
        self.prompts
            .iter()
            .position(|prompt| prompt.id == id)
            .ok_or(ControllerError::UnknownPrompt(id))
    }

    /// Runs one variation per non-blank prompt and records the outcome.
    ///
    /// Without a base image or a non-blank prompt this only sets the
    /// validation message. Taking `&mut self` keeps a second run from
    /// starting on the same controller while one is in flight.
    pub async fn generate(&mut self) -> Result<RunStatus, ControllerError> {
        if self.base_image.is_none() || self.prompts.iter().all(PromptEntry::is_blank) {
            debug!("Generation requested without image or prompt");
            self.error = Some(MISSING_INPUT_MESSAGE.to_string());
            return Err(ControllerError::MissingInput);
        }

        self.status = RunStatus::InProgress;
        self.error = None;
        self.results.clear();

        let outcome =
            run_generation(&self.generator, self.base_image.as_ref(), &self.prompts).await;
        let Some(outcome) = outcome else {
            self.status = RunStatus::Idle;
            return Ok(self.status);
        };

        self.status = outcome.status();
        self.error = outcome.error_text();
        self.results = outcome.results;
        info!("Run completed with status {:?}", self.status);
        Ok(self.status)
    }

    /// Generates a new base image from `prompt` and installs it. Blank
    /// prompts are ignored.
    pub async fn generate_base_image(&mut self, prompt: &str) -> Result<(), ControllerError> {
        if prompt.trim().is_empty() {
            return Ok(());
        }

        self.base_image_error = None;
        match self.generator.generate_base_image(prompt).await {
            Ok(image) => {
                self.set_base_image(Some(image));
                Ok(())
            }
            Err(err) => {
                self.base_image_error = Some(err.to_string());
                Err(ControllerError::BaseImage(err))
            }
        }
    }
}
