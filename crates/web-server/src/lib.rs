use analytics::SessionProvider;
use axum::{
    Router,
    routing::{get, post, put},
};
use database::DbRepository;
use scheduler::ReportScheduler;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod identity;

pub use identity::{Identity, IdentityResolver};

/// The shared application state that all handlers can access.
pub struct AppState {
    pub repo: DbRepository,
    pub identities: Arc<dyn IdentityResolver>,
    pub sessions: Arc<dyn SessionProvider>,
    pub reports: Arc<ReportScheduler>,
    pub super_admin: String,
    pub identity_header: String,
}

/// Builds the application routes over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/me", get(handlers::get_me))
        .route("/api/cycles", get(handlers::list_cycles).post(handlers::create_cycle))
        .route("/api/profiles/:profile_id", put(handlers::update_profile))
        .route("/api/ranking", get(handlers::get_ranking))
        .route("/api/reports/me", post(handlers::send_my_report))
        .route("/api/reports/all", post(handlers::send_full_report))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the API until the process is stopped.
pub async fn run_server(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
