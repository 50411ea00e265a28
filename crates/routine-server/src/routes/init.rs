use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/init: create `.routine/` if it does not exist yet.
pub async fn init_project(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let created = tokio::task::spawn_blocking(move || routine_core::config::init_project(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::json!({ "created": created })))
}
