use axum::extract::State;
use axum::Json;
use routine_core::goal::{self, Goal, GoalDraft, GOAL_SUGGESTIONS, PRESET_CRITERIA};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/goal: the single goal.
pub async fn get_goal(State(app): State<AppState>) -> Result<Json<Goal>, AppError> {
    let goal = app
        .with_store(|store, _| Ok(goal::resolve(&*store, None)?))
        .await?;
    Ok(Json(goal))
}

/// PUT /api/goal: create the goal, or replace its editable fields.
pub async fn put_goal(
    State(app): State<AppState>,
    Json(draft): Json<GoalDraft>,
) -> Result<Json<Goal>, AppError> {
    let goal = app
        .with_store(move |store, _| Ok(goal::set_goal(store, draft, chrono::Utc::now())?))
        .await?;
    Ok(Json(goal))
}

/// GET /api/goal/suggestions: starter goals and preset success criteria.
pub async fn get_suggestions() -> Json<serde_json::Value> {
    let goals: Vec<_> = GOAL_SUGGESTIONS
        .iter()
        .map(|s| {
            serde_json::json!({
                "title": s.title,
                "description": s.description,
                "duration": s.duration,
            })
        })
        .collect();
    let criteria: Vec<_> = PRESET_CRITERIA
        .iter()
        .map(|p| serde_json::json!({ "text": p.text, "category": p.category }))
        .collect();
    Json(serde_json::json!({ "goals": goals, "criteria": criteria }))
}
