use axum::extract::{Query, State};
use axum::Json;
use routine_core::coach::{self, KeyFailureTracker};
use routine_core::config::CoachConfig;
use routine_core::responses;
use routine_core::store::{keys, KeyValueStore};
use serde::Deserialize;

use super::Scope;
use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ChatBody {
    pub message: String,
}

/// GET /api/chat: welcome message and quick replies for the chat panel.
pub async fn get_chat(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(move |store, _| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            Ok(serde_json::json!({
                "welcome": responses::welcome_message(&goal.title),
                "quick_messages": responses::QUICK_MESSAGES,
                "has_key": coach::stored_api_key(&*store).is_some(),
            }))
        })
        .await?;
    Ok(Json(result))
}

/// POST /api/chat: reply from the coach, or an offline reply when no key
/// is stored. Coach errors with a stored key are returned as errors.
pub async fn post_chat(
    State(app): State<AppState>,
    Query(scope): Query<Scope>,
    Json(body): Json<ChatBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let call = app
        .with_store(move |store, config| {
            let goal = routine_core::goal::resolve(&*store, scope.routine)?;
            if coach::stored_api_key(&*store).is_none() {
                let reply = responses::offline_reply(&message, &mut rand::thread_rng());
                return Ok(ChatCall::Offline(reply.to_string()));
            }
            let api_key = coach::begin_call(&*store, config.coach.key_failure_threshold)?;
            Ok(ChatCall::Coach {
                api_key,
                prompt: coach::build_chat_prompt(&goal.title, &message),
                config: config.coach.clone(),
            })
        })
        .await?;

    let (api_key, prompt, coach_config) = match call {
        ChatCall::Offline(reply) => {
            return Ok(Json(serde_json::json!({ "reply": reply, "source": "offline" })));
        }
        ChatCall::Coach { api_key, prompt, config } => (api_key, prompt, config),
    };

    let result = app
        .without_store(move || {
            coach_config
                .client()
                .send_and_parse(&prompt, &api_key, &coach_config.chat)
        })
        .await?;
    let reply = app
        .with_store(move |store, config| {
            Ok(coach::finish_call(store, config.coach.key_failure_threshold, result)?)
        })
        .await?;
    Ok(Json(serde_json::json!({ "reply": reply, "source": "coach" })))
}

enum ChatCall {
    Offline(String),
    Coach {
        api_key: String,
        prompt: String,
        config: CoachConfig,
    },
}

// ---------------------------------------------------------------------------
// API key
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct KeyBody {
    pub key: String,
    /// Skip the test request against the API.
    #[serde(default)]
    pub skip_verify: bool,
}

/// GET /api/key: whether a key is stored. Never returns the key itself.
pub async fn get_key(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let result = app
        .with_store(|store, config| {
            let threshold = config.coach.key_failure_threshold;
            let tracker = KeyFailureTracker::load(&*store, threshold);
            Ok(serde_json::json!({
                "stored": coach::stored_api_key(&*store).is_some(),
                "consecutive_failures": tracker.consecutive(),
                "threshold": threshold,
            }))
        })
        .await?;
    Ok(Json(result))
}

/// PUT /api/key: check and store a key, clearing the failure count.
///
/// The test request runs before the store lock is taken.
pub async fn put_key(
    State(app): State<AppState>,
    Json(body): Json<KeyBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = body.key.trim().to_string();
    coach::check_key_format(&key)?;
    if !body.skip_verify {
        let coach_config = app.with_store(|_, config| Ok(config.coach.clone())).await?;
        let candidate = key.clone();
        app.without_store(move || coach_config.client().validate_api_key(&candidate))
            .await??;
    }
    app.with_store(move |store, _| {
        store.set(keys::API_KEY, &key)?;
        KeyFailureTracker::clear(store)?;
        tracing::info!("coach API key updated");
        Ok(())
    })
    .await?;
    Ok(Json(serde_json::json!({ "stored": true })))
}

/// DELETE /api/key
pub async fn delete_key(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    app.with_store(|store, _| {
        store.remove(keys::API_KEY)?;
        KeyFailureTracker::clear(store)?;
        Ok(())
    })
    .await?;
    Ok(Json(serde_json::json!({ "stored": false })))
}
