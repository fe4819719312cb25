use notatex_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize the application (telemetry, database, storage, routes)
    let (_state, router) = notatex_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    notatex_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
