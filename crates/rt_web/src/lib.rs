use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod handlers;
pub mod render;
pub mod state;

pub use state::AppState;

/// Name of the exported CSV file.
pub const CSV_FILENAME: &str = "regulatory_news.csv";

pub async fn create_app(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(handlers::index))
        .route("/track", post(handlers::track))
        .route("/download", post(handlers::download))
        .route("/api/track", post(handlers::api_track))
        .route("/health", get(handlers::health))
        .layer(layers)
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves the app until the process stops.
pub async fn serve(state: AppState, addr: &str) -> rt_core::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState, CSV_FILENAME};
    pub use rt_core::{Error, Result};
}
