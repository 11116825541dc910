//! Fan-out of one base image over many prompts.
//!
//! Every prompt gets its own request, all requests are in flight at once, and
//! the run waits for all of them to settle. A failed prompt never discards the
//! variations its siblings produced.

use futures::future::join_all;
use tracing::{info, warn};

use crate::asset::ImageAsset;
use crate::client::ImageGenerator;
use crate::state::PromptEntry;

/// A successful variation, tagged with the prompt that produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenerationResult {
    /// `data:` URI of the generated image
    pub image_uri: String,
    /// Commentary from the model, possibly empty
    pub text: String,
    /// The prompt text exactly as entered
    pub source_prompt: String,
}

/// Lifecycle of a generation run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RunStatus {
    /// Nothing has run since the base image was set
    #[default]
    Idle,
    /// Requests are in flight
    InProgress,
    /// At least one variation was produced, possibly alongside errors
    CompletedWithResults,
    /// Every prompt failed
    CompletedWithError,
}

/// Everything a settled run produced.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunOutcome {
    /// Variations, in prompt order
    pub results: Vec<GenerationResult>,
    /// One message per failed prompt, each naming its prompt
    pub errors: Vec<String>,
}

impl RunOutcome {
    /// Partial success is still success; only a run with errors and no
    /// results is an error.
    pub fn status(&self) -> RunStatus {
        if self.results.is_empty() && !self.errors.is_empty() {
            RunStatus::CompletedWithError
        } else {
            RunStatus::CompletedWithResults
        }
    }

    /// The error messages joined one per line, if there were any.
    pub fn error_text(&self) -> Option<String> {
        (!self.errors.is_empty()).then(|| self.errors.join("\n"))
    }
}

/// Prompts whose trimmed text is non-empty, in order, untrimmed.
pub fn filter_prompts(prompts: &[PromptEntry]) -> Vec<&str> {
    prompts
        .iter()
        .filter(|prompt| !prompt.is_blank())
        .map(PromptEntry::value)
        .collect()
}

/// Runs a generation for `prompts` against `base_image`.
///
/// Returns `None` without calling anything when there is no base image or
/// every prompt is blank.
pub async fn run_generation<G: ImageGenerator>(
    generator: &G,
    base_image: Option<&ImageAsset>,
    prompts: &[PromptEntry],
) -> Option<RunOutcome> {
    let base_image = base_image?;
    if prompts.iter().all(PromptEntry::is_blank) {
        return None;
    }

    let filtered = filter_prompts(prompts);
    Some(generate_variations(generator, base_image, &filtered).await)
}

/// Issues one variation request per prompt, concurrently, and collects every
/// outcome. Outcomes are matched to prompts by position, so identical prompt
/// texts stay distinct.
pub async fn generate_variations<G: ImageGenerator>(
    generator: &G,
    base_image: &ImageAsset,
    prompts: &[&str],
) -> RunOutcome {
    if prompts.is_empty() {
        return RunOutcome::default();
    }

    info!("Generating {} variation(s)", prompts.len());
    let settled = join_all(
        prompts
            .iter()
            .map(|prompt| generator.generate_variation(base_image, prompt)),
    )
    .await;

    let mut outcome = RunOutcome::default();
    for (prompt, result) in prompts.iter().zip(settled) {
        match result {
            Ok(variation) => outcome.results.push(GenerationResult {
                image_uri: variation.image_uri,
                text: variation.text,
                source_prompt: (*prompt).to_string(),
            }),
            Err(err) => {
                warn!("{}", err);
                outcome.errors.push(err.to_string());
            }
        }
    }

    info!(
        "Generation finished: {} succeeded, {} failed",
        outcome.results.len(),
        outcome.errors.len()
    );
    outcome
}
