use soonly::startup;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting Soonly");

    // Load configuration
    let config = startup::load_config()?;

    // Run the overlay
    startup::start_overlay(config).await
}
