use dotenv::dotenv;
use shop_orders::api::{self, AppState};
use shop_orders::config::Config;
use shop_orders::error::AppResult;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Main entry point for the shop order service.
///
/// This function:
/// 1. Loads environment variables from .env file
/// 2. Builds the store and notifier and seeds the catalog
/// 3. Starts the HTTP server on the configured address
#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize the logging subscriber
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .pretty()
        .init();

    info!("Starting shop order service");
    let config = Config::from_env()?;
    let state = AppState::from_config(&config).await?;
    let app = api::create_router(state);

    let addr = config.addr()?;
    info!("Server listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(())
}
