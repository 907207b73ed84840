mod config;
mod handler;
mod service;

use axum::{
    routing::{get, post},
    Router,
};
use config::ApiConfig;
use connectors::coinmarketcap::CoinMarketCapConnector;
use service::ListingService;
use std::net::SocketAddr;
use std::sync::Arc;
use store::TableCache;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting coinpeek API");

    // Load configuration from environment
    let config = ApiConfig::from_env();

    // Create the listings connector, honoring a URL override
    let connector = match &config.listings_url {
        Some(url) => CoinMarketCapConnector::with_url(url.as_str()),
        None => CoinMarketCapConnector::new(),
    };

    // Create the listing service over the per-currency cache
    let service = Arc::new(ListingService::new(
        Arc::new(connector),
        Arc::new(TableCache::new()),
    ));

    // Create CORS middleware
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Create Axum router with API routes
    let app = Router::new()
        .route("/api/v1/listings", get(handler::get_listings))
        .route("/api/v1/listings/csv", get(handler::get_listings_csv))
        .route("/api/v1/listings/changes", get(handler::get_percent_changes))
        .route("/api/v1/listings/chart", get(handler::get_chart_series))
        .route("/api/v1/listings/refresh", post(handler::refresh_listings))
        .route("/api/v1/symbols", get(handler::get_symbols))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
