pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    let app_state = state::AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Init + config
        .route("/api/init", post(routes::init::init_project))
        .route("/api/config", get(routes::config::get_config))
        // Goal
        .route(
            "/api/goal",
            get(routes::goal::get_goal).put(routes::goal::put_goal),
        )
        .route("/api/goal/suggestions", get(routes::goal::get_suggestions))
        // Routines
        .route(
            "/api/routines",
            get(routes::routines::list_routines).post(routes::routines::create_routine),
        )
        .route(
            "/api/routines/{id}",
            axum::routing::put(routes::routines::update_routine)
                .delete(routes::routines::delete_routine),
        )
        .route(
            "/api/routines/{id}/status",
            post(routes::routines::mark_status),
        )
        .route("/api/routines/{id}/stats", get(routes::routines::get_stats))
        .route("/api/routines/{id}/trend", get(routes::routines::get_trend))
        .route("/api/routines/{id}/daily", get(routes::routines::get_daily))
        .route("/api/routines/{id}/week", get(routes::routines::get_week))
        .route(
            "/api/routines/{id}/failures",
            get(routes::routines::get_failures),
        )
        .route(
            "/api/routines/{id}/reflections",
            get(routes::routines::get_reflection).post(routes::routines::create_reflection),
        )
        // Daily status
        .route(
            "/api/status",
            get(routes::status::get_status).post(routes::status::mark_status),
        )
        // Statistics
        .route("/api/stats", get(routes::stats::get_stats))
        .route("/api/stats/trend", get(routes::stats::get_trend))
        .route("/api/stats/daily", get(routes::stats::get_daily))
        .route("/api/stats/week", get(routes::stats::get_week))
        .route("/api/stats/failures", get(routes::stats::get_failures))
        .route("/api/calendar", get(routes::calendar::get_calendar))
        // Reflections
        .route(
            "/api/reflections",
            get(routes::reflections::get_reflection).post(routes::reflections::create_reflection),
        )
        .route("/api/classify", post(routes::reflections::classify))
        .route("/api/failure-reasons", get(routes::reflections::list_reasons))
        .route(
            "/api/weekly",
            get(routes::weekly::get_weekly).post(routes::weekly::submit_weekly),
        )
        .route("/api/adjustments", get(routes::weekly::get_adjustments))
        // Coach
        .route(
            "/api/chat",
            get(routes::coach::get_chat).post(routes::coach::post_chat),
        )
        .route(
            "/api/key",
            get(routes::coach::get_key)
                .put(routes::coach::put_key)
                .delete(routes::coach::delete_key),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the routine API server on a pre-bound listener.
///
/// Accepts a `TcpListener` that was already bound so the caller can read the
/// actual port before starting (useful when `port = 0` and the OS picks a
/// free port).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root);

    tracing::info!("routine API listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/goal");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
