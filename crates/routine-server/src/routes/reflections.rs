use axum::extract::{Query, State};
use axum::Json;
use routine_core::coach;
use routine_core::failure::{self, FailureReason, FAILURE_REASONS};
use routine_core::reflection::{self, DailyReflection};
use serde::Deserialize;

use super::Scope;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReflectBody {
    pub text: String,
    /// Reason ids picked by the user; detected from `text` when empty.
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// GET /api/reflections: the scoped day's reflection.
pub async fn get_reflection(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<DailyReflection>, AppError> {
    let record = app
        .with_store(move |store, _| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            Ok(reflection::load_daily(&*store, goal.id, scope.today()?))
        })
        .await?;
    match record {
        Some(r) => Ok(Json(r)),
        None => Err(AppError::not_found("no reflection for that day")),
    }
}

/// POST /api/reflections: save the scoped day's reflection with coach
/// feedback, falling back to templated feedback when the coach fails.
///
/// The store lock is released while the coach request is in flight.
pub async fn create_reflection(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
    Json(body): Json<ReflectBody>,
) -> Result<Json<DailyReflection>, AppError> {
    let (pending, call) = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            let pending = reflection::prepare_daily(
                &*store,
                &goal,
                scope.today()?,
                &body.text,
                body.reasons,
            )?;
            let threshold = config.coach.key_failure_threshold;
            let call = coach::begin_call(&*store, threshold)
                .map(|api_key| (api_key, config.coach.clone()));
            Ok((pending, call))
        })
        .await?;

    let record = match call {
        Ok((api_key, coach_config)) => {
            let prompt = pending.prompt.clone();
            let result = app
                .without_store(move || {
                    coach_config
                        .client()
                        .send_and_parse(&prompt, &api_key, &coach_config.reflection)
                })
                .await?;
            app.with_store(move |store, config| {
                let reply =
                    coach::finish_call(store, config.coach.key_failure_threshold, result);
                Ok(reflection::finish_daily(store, pending, reply, chrono::Utc::now())?)
            })
            .await?
        }
        Err(e) => {
            app.with_store(move |store, _| {
                Ok(reflection::finish_daily(store, pending, Err(e), chrono::Utc::now())?)
            })
            .await?
        }
    };
    Ok(Json(record))
}

#[derive(Deserialize)]
pub struct ClassifyBody {
    pub text: String,
}

/// POST /api/classify: failure reason ids detected in free text.
pub async fn classify(Json(body): Json<ClassifyBody>) -> Json<Vec<String>> {
    Json(failure::classify(&body.text))
}

/// GET /api/failure-reasons: the fixed reason catalogue.
pub async fn list_reasons() -> Json<&'static [FailureReason]> {
    Json(FAILURE_REASONS)
}
