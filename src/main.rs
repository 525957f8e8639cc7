use coming_soon::config::get_configuration;
use coming_soon::startup::Application;
use coming_soon::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = get_subscriber(
        String::from("coming_soon"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber)?;

    let config = get_configuration()?;
    let application = Application::build(config.clone()).await?;

    tracing::info!("Coming Soon server listening on {}", config.get_address());
    tracing::info!(
        "Health check: http://{}/health, subscribers: http://{}/api/coming-soon/subscribers",
        config.get_address(),
        config.get_address()
    );

    application.run_until_stop().await?;

    Ok(())
}
