use anyhow::{Context, Result, anyhow};
use clap::Parser;
use illustrator::asset::ImageAsset;
use illustrator::client::GenerationClient;
use illustrator::config::setup_logging;
use illustrator::constants::DEFAULT_IMAGE_MODEL;
use illustrator::orchestrator::RunStatus;
use illustrator::state::AppController;
use std::fs;
use std::path::PathBuf;
use url::Url;

/// Generate variations of an illustration through a running illustrator proxy.
///
/// Minimal UX:
///   illustrate --image cat.png --prompt "as a pencil sketch" --prompt "in watercolor"
#[derive(Parser, Debug)]
#[command(name = "illustrate")]
#[command(about = "Vary a base illustration with one request per prompt")]
struct Args {
    /// Base URL of the illustrator proxy
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "ILLUSTRATOR_SERVER")]
    server: Url,

    /// Base illustration to vary
    #[arg(long, conflicts_with = "generate_base")]
    image: Option<PathBuf>,

    /// Generate the base illustration from this text instead of a file
    #[arg(long)]
    generate_base: Option<String>,

    /// Variation prompt; repeat for more variations
    #[arg(long = "prompt", short = 'p')]
    prompts: Vec<String>,

    /// Model used for variations
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    variation_model: String,

    /// Model used to generate a base illustration
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    base_model: String,

    /// Output directory for the generated files
    #[arg(long, default_value = "./variations")]
    out_dir: PathBuf,

    /// Enable debug logging
    #[arg(long, env = "ILLUSTRATOR_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).context("Failed to initialize logging")?;

    let client = GenerationClient::new(&args.server)
        .context("Invalid server URL")?
        .with_models(&args.variation_model, &args.base_model);
    let mut controller = AppController::new(client);

    match (&args.image, &args.generate_base) {
        (Some(path), _) => {
            let image = ImageAsset::from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            controller.set_base_image(Some(image));
        }
        (None, Some(prompt)) => {
            controller.generate_base_image(prompt).await?;
        }
        (None, None) => {}
    }

    let first = controller.prompts()[0].id();
    for (index, prompt) in args.prompts.iter().enumerate() {
        let id = if index == 0 {
            first
        } else {
            controller.add_prompt()
        };
        controller.update_prompt(id, prompt)?;
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    if let (Some(image), Some(_)) = (controller.base_image(), &args.generate_base) {
        let path = args
            .out_dir
            .join(format!("base.{}", image.file_extension()));
        fs::write(&path, image.bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Saved base illustration: {}", path.display());
    }

    let status = controller.generate().await?;

    for (index, result) in controller.results().iter().enumerate() {
        let image = ImageAsset::from_data_uri(&result.image_uri)
            .with_context(|| format!("Unusable image for prompt \"{}\"", result.source_prompt))?;
        let path = args
            .out_dir
            .join(format!("variation_{}.{}", index + 1, image.file_extension()));
        fs::write(&path, image.bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!("\"{}\" -> {}", result.source_prompt, path.display());
        if !result.text.is_empty() {
            println!("    {}", result.text);
        }
    }

    if let Some(error) = controller.error() {
        eprintln!("An error occurred:\n{error}");
    }

    match status {
        RunStatus::CompletedWithError => Err(anyhow!("Every prompt failed")),
        _ => Ok(()),
    }
}
