//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "ILLUSTRATOR_DEBUG")]
    /// Enable debug logging. Env: ILLUSTRATOR_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "8080", env = "PORT")]
    /// http listener, defaults to `8080`.
    /// Env: PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "0.0.0.0",
        env = "ILLUSTRATOR_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `0.0.0.0`.
    /// Env: ILLUSTRATOR_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(
        long,
        default_value = crate::constants::DEFAULT_PROVIDER_BASE_URL,
        env = "ILLUSTRATOR_PROVIDER_BASE_URL"
    )]
    /// Base URL of the generation provider.
    /// Env: ILLUSTRATOR_PROVIDER_BASE_URL
    pub provider_base_url: url::Url,

    #[clap(long, env = crate::constants::API_KEY_ENV, hide_env_values = true)]
    /// Provider credential. Requests fail with a configuration error while unset.
    /// Env: GEMINI_API_KEY
    pub gemini_api_key: Option<String>,

    #[clap(long, short, env = "ILLUSTRATOR_STATIC_DIR")]
    /// Directory of a built front end to serve, eg `./dist`.
    /// Env: ILLUSTRATOR_STATIC_DIR
    pub static_dir: Option<PathBuf>,
}
