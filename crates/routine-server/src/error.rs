use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use routine_core::{CoachError, RoutineError};

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 404 through
/// the `anyhow::Error` chain without touching the `RoutineError` enum.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(RoutineError::Validation(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

fn coach_status(e: &CoachError) -> StatusCode {
    match e {
        CoachError::Validation(_) => StatusCode::BAD_REQUEST,
        CoachError::InvalidCredential
        | CoachError::ExpiredCredential
        | CoachError::ReplaceCredential => StatusCode::UNAUTHORIZED,
        CoachError::NetworkFailure(_)
        | CoachError::EmptyResponse
        | CoachError::UnknownProviderError(_) => StatusCode::BAD_GATEWAY,
    }
}

fn routine_status(e: &RoutineError) -> StatusCode {
    match e {
        RoutineError::NotInitialized | RoutineError::Validation(_) => StatusCode::BAD_REQUEST,
        RoutineError::RoutineNotFound(_) | RoutineError::GoalNotSet => StatusCode::NOT_FOUND,
        RoutineError::AlreadyReflected { .. } => StatusCode::CONFLICT,
        RoutineError::InvalidStatus(_)
        | RoutineError::InvalidFrequency(_)
        | RoutineError::InvalidDifficulty(_)
        | RoutineError::InvalidMood(_)
        | RoutineError::InvalidDate(_)
        | RoutineError::InvalidMonth(_) => StatusCode::BAD_REQUEST,
        RoutineError::MissingApiKey => StatusCode::UNAUTHORIZED,
        RoutineError::Coach(c) => coach_status(c),
        RoutineError::Io(_) | RoutineError::Yaml(_) | RoutineError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<RoutineError>() {
            routine_status(e)
        } else if let Some(e) = self.0.downcast_ref::<CoachError>() {
            coach_status(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
