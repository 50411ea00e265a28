use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: effective configuration plus validation warnings.
pub async fn get_config(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(|_, config| {
            Ok(serde_json::json!({
                "config": config,
                "warnings": config.validate(),
            }))
        })
        .await?;
    Ok(Json(result))
}
