use clap::Parser;
use illustrator::config::setup_logging;
use illustrator::web::AppState;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = illustrator::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let state = AppState::new(cli.gemini_api_key, cli.provider_base_url);

    if let Err(err) = illustrator::web::setup_server(
        &cli.listen_address,
        cli.port,
        state,
        cli.static_dir.as_deref(),
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
