use axum::extract::{Query, State};
use axum::Json;
use routine_core::failure::{self, FailureStats};
use routine_core::reflection::reflection_lookup;
use routine_core::stats::{self, DayPoint, WeekProgress, WeekSummary};
use routine_core::tracker::status_lookup;

use super::Scope;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/stats: streaks and success rate over the statistics window.
pub async fn get_stats(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let s = stats::compute_streaks_and_rate(
                status_lookup(&*store, goal.id),
                scope.today()?,
                config.stats.window_days,
                config.stats.recent_window,
            );
            Ok(serde_json::json!({
                "routine_id": goal.id,
                "stats": s,
                "motivation": stats::motivation_message(s.success_rate),
            }))
        })
        .await?;
    Ok(Json(result))
}

/// GET /api/stats/trend: weekly success rates, oldest first.
pub async fn get_trend(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<Vec<WeekSummary>>, AppError> {
    let weeks = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            Ok(stats::compute_weekly_trend(
                status_lookup(&*store, goal.id),
                scope.today()?,
                config.stats.trend_weeks,
            ))
        })
        .await?;
    Ok(Json(weeks))
}

/// GET /api/stats/daily: one point per day for charting.
pub async fn get_daily(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<Vec<DayPoint>>, AppError> {
    let points = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            Ok(stats::compute_daily_series(
                status_lookup(&*store, goal.id),
                scope.today()?,
                config.stats.series_days,
            ))
        })
        .await?;
    Ok(Json(points))
}

/// GET /api/stats/week: the last seven days, oldest first.
pub async fn get_week(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<WeekProgress>, AppError> {
    let progress = app
        .with_store(move |store, _| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            Ok(stats::week_progress(status_lookup(&*store, goal.id), scope.today()?))
        })
        .await?;
    Ok(Json(progress))
}

/// GET /api/stats/failures: skipped-day reasons by category.
pub async fn get_failures(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<FailureStats>, AppError> {
    let stats = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            Ok(failure::aggregate_failure_stats(
                reflection_lookup(&*store, goal.id),
                scope.today()?,
                config.stats.window_days,
            ))
        })
        .await?;
    Ok(Json(stats))
}
