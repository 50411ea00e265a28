use axum::extract::{Query, State};
use axum::Json;
use routine_core::advisor::{self, Adjustment};
use routine_core::reflection::{self, WeeklyInput, WeeklyReflection};

use super::Scope;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/weekly: this week's statistics and reflection, if written.
pub async fn get_weekly(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let today = scope.today()?;
            let (weekly, _) = reflection::weekly_inputs(&*store, &goal, today, &config.stats);
            let (year, week) = reflection::week_key(today);
            Ok(serde_json::json!({
                "year": year,
                "week": week,
                "weekly_stats": weekly,
                "reflection": reflection::load_weekly(&*store, today)?,
            }))
        })
        .await?;
    Ok(Json(result))
}

/// POST /api/weekly: write this week's reflection. 409 when one exists.
pub async fn submit_weekly(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
    Json(input): Json<WeeklyInput>,
) -> Result<Json<WeeklyReflection>, AppError> {
    let record = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let today = scope.today()?;
            reflection::ensure_not_reflected(&*store, today)?;
            Ok(reflection::submit_weekly(
                store,
                &goal,
                today,
                input,
                &config.stats,
                chrono::Utc::now(),
            )?)
        })
        .await?;
    Ok(Json(record))
}

/// GET /api/adjustments: suggestions for the current week.
pub async fn get_adjustments(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<Vec<Adjustment>>, AppError> {
    let adjustments = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let (weekly, failures) =
                reflection::weekly_inputs(&*store, &goal, scope.today()?, &config.stats);
            Ok(advisor::suggest_adjustments(&goal, &weekly, &failures))
        })
        .await?;
    Ok(Json(adjustments))
}
