use crate::coach::CoachError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutineError {
    #[error("not initialized: run 'routine init'")]
    NotInitialized,

    #[error("routine not found: {0}")]
    RoutineNotFound(u64),

    #[error("no goal set: run 'routine goal set' first")]
    GoalNotSet,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("weekly reflection already written for {year} week {week}")]
    AlreadyReflected { year: i32, week: u32 },

    #[error("invalid status '{0}': expected completed or skipped")]
    InvalidStatus(String),

    #[error("invalid frequency '{0}': expected daily, weekdays, alternate or weekly")]
    InvalidFrequency(String),

    #[error("invalid difficulty '{0}': expected easy, medium or hard")]
    InvalidDifficulty(String),

    #[error("invalid mood '{0}'")]
    InvalidMood(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("no API key stored: run 'routine key set <KEY>'")]
    MissingApiKey,

    #[error(transparent)]
    Coach(#[from] CoachError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RoutineError>;
