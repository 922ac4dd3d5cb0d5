use tracing::info;
use tracing_subscriber::EnvFilter;

use maps_scraper::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr =
        std::env::var("MAPS_SCRAPER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let app = web::router();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
