use axum::extract::{Query, State};
use axum::Json;
use routine_core::types::DayStatus;
use routine_core::{responses, tracker};
use serde::Deserialize;

use super::Scope;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MarkBody {
    pub status: DayStatus,
}

/// GET /api/status: the recorded status for the scoped day, or null.
pub async fn get_status(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(move |store, _| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let today = scope.today()?;
            Ok(serde_json::json!({
                "routine_id": goal.id,
                "date": today,
                "status": tracker::status_on(&*store, goal.id, today),
            }))
        })
        .await?;
    Ok(Json(result))
}

/// POST /api/status: mark the scoped day completed or skipped.
///
/// Marking an already-marked day overwrites the status; the goal's streak
/// and total counters advance anyway.
pub async fn mark_status(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
    Json(body): Json<MarkBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(move |store, config| {
            let mut goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let today = scope.today()?;
            tracker::record_status(
                store,
                &mut goal,
                today,
                body.status,
                &config.stats,
                chrono::Utc::now(),
            )?;

            let mut rng = rand::thread_rng();
            let message = responses::status_message(body.status, &mut rng);
            let (toast_title, toast_body) =
                responses::toast(body.status, scope.routine.map(|_| goal.title.as_str()));
            Ok(serde_json::json!({
                "routine_id": goal.id,
                "date": today,
                "status": body.status,
                "streak": goal.streak,
                "total_days": goal.total_days,
                "success_rate": goal.success_rate,
                "message": message,
                "toast": { "title": toast_title, "body": toast_body },
            }))
        })
        .await?;
    Ok(Json(result))
}
