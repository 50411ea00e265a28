use axum::extract::{Path, Query, State};
use axum::Json;
use routine_core::failure::FailureStats;
use routine_core::goal::{self, Goal, GoalDraft};
use routine_core::reflection::DailyReflection;
use routine_core::stats::{DayPoint, WeekProgress, WeekSummary};

use super::reflections::{self, ReflectBody};
use super::status::{self, MarkBody};
use super::stats;
use super::{DateQuery, Scope};
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/routines: every routine in the multi-routine list.
pub async fn list_routines(State(app): State<AppState>) -> Result<Json<Vec<Goal>>, AppError> {
    let routines = app
        .with_store(|store, _| Ok(goal::list_routines(&*store)?))
        .await?;
    Ok(Json(routines))
}

/// POST /api/routines: add a routine with a fresh id and color.
pub async fn create_routine(
    State(app): State<AppState>,
    Json(draft): Json<GoalDraft>,
) -> Result<Json<Goal>, AppError> {
    let routine = app
        .with_store(move |store, _| {
            let mut rng = rand::thread_rng();
            Ok(goal::add_routine(store, draft, chrono::Utc::now(), &mut rng)?)
        })
        .await?;
    Ok(Json(routine))
}

/// PUT /api/routines/{id}: edit a routine's fields, keeping its counters.
pub async fn update_routine(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Json(draft): Json<GoalDraft>,
) -> Result<Json<Goal>, AppError> {
    let routine = app
        .with_store(move |store, _| {
            let mut routine = goal::list_routines(&*store)?
                .into_iter()
                .find(|r| r.id == id)
                .ok_or(routine_core::RoutineError::RoutineNotFound(id))?;
            routine.apply_edit(draft, chrono::Utc::now())?;
            goal::update_routine(store, &routine)?;
            Ok(routine)
        })
        .await?;
    Ok(Json(routine))
}

/// DELETE /api/routines/{id}
pub async fn delete_routine(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = app
        .with_store(move |store, _| Ok(goal::remove_routine(store, id)?))
        .await?;
    if !removed {
        return Err(routine_core::RoutineError::RoutineNotFound(id).into());
    }
    Ok(Json(serde_json::json!({ "removed": id })))
}

// ---------------------------------------------------------------------------
// Per-routine paths
//
// `/api/routines/{id}/...` is the same as the unscoped endpoint with
// `?routine={id}`.
// ---------------------------------------------------------------------------

/// POST /api/routines/{id}/status
pub async fn mark_status(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
    body: Json<MarkBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    status::mark_status(state, Query(Scope::for_routine(id, q)), body).await
}

/// GET /api/routines/{id}/stats
pub async fn get_stats(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    stats::get_stats(state, Query(Scope::for_routine(id, q))).await
}

/// GET /api/routines/{id}/trend
pub async fn get_trend(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<WeekSummary>>, AppError> {
    stats::get_trend(state, Query(Scope::for_routine(id, q))).await
}

/// GET /api/routines/{id}/daily
pub async fn get_daily(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<DayPoint>>, AppError> {
    stats::get_daily(state, Query(Scope::for_routine(id, q))).await
}

/// GET /api/routines/{id}/week
pub async fn get_week(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
) -> Result<Json<WeekProgress>, AppError> {
    stats::get_week(state, Query(Scope::for_routine(id, q))).await
}

/// GET /api/routines/{id}/failures
pub async fn get_failures(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
) -> Result<Json<FailureStats>, AppError> {
    stats::get_failures(state, Query(Scope::for_routine(id, q))).await
}

/// GET /api/routines/{id}/reflections
pub async fn get_reflection(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
) -> Result<Json<DailyReflection>, AppError> {
    reflections::get_reflection(state, Query(Scope::for_routine(id, q))).await
}

/// POST /api/routines/{id}/reflections
pub async fn create_reflection(
    state: State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<DateQuery>,
    body: Json<ReflectBody>,
) -> Result<Json<DailyReflection>, AppError> {
    reflections::create_reflection(state, Query(Scope::for_routine(id, q)), body).await
}
