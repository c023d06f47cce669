mod api_docs;
mod config;
mod controllers;
mod models;
mod routes;
mod services;
mod shared_state;

use std::net::SocketAddr;
use std::path::Path;

use axum::{Router, response::Html, routing::get};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::simulation_routes::api_routes;
use crate::shared_state::SharedState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 1. Load configuration
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load {config_path}: {e}");
            return;
        }
    };
    info!(
        datasets = config.datasets.len(),
        "configuration loaded from {config_path}"
    );

    // 2. Shared state: config + content-addressed dataset cache
    let state = SharedState::new(config.clone());

    // 3. Warm the cache so malformed datasets surface at startup, not on the
    //    first request. A failure here is logged and the dataset left to 422.
    for dataset in &config.datasets {
        match state.cache.load(Path::new(&dataset.path)) {
            Ok(series) => info!(
                dataset = %dataset.id,
                records = series.len(),
                "dataset preloaded"
            ),
            Err(e) => warn!(dataset = %dataset.id, error = %e, "dataset failed to preload"),
        }
    }

    // 4. HTTP server: JSON API, OpenAPI explorer, static landing page
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route(
            "/scalar",
            get(|| async { Html(Scalar::new(ApiDoc::openapi()).to_html()) }),
        )
        .fallback_service(ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("API server listening on http://{addr}");
    info!("Scalar UI: http://{addr}/scalar");

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        error!("server error: {e}");
    }
}
