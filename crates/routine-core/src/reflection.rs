//! Daily and weekly reflections.
//!
//! A daily reflection is attached to a routine's recorded day and carries
//! coach feedback; when the coach call fails the templated fallback from
//! [`crate::advisor`] is stored instead. A weekly reflection is one per ISO
//! week and bundles the week's statistics, adjustment suggestions and a
//! templated insight.

use crate::advisor::{self, Adjustment};
use crate::coach::{self, HistoricalContext};
use crate::config::StatsConfig;
use crate::error::{Result, RoutineError};
use crate::failure::{self, FailureStats, UserContext};
use crate::goal::Goal;
use crate::stats::{self, WeeklyStats};
use crate::store::{self, keys, KeyValueStore};
use crate::tracker;
use crate::types::{DayStatus, Mood};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReflection {
    pub reflection: String,
    #[serde(default)]
    pub ai_response: String,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    pub completion_type: DayStatus,
    pub timestamp: DateTime<Utc>,
}

/// Read a stored daily reflection. Corrupt records are logged and skipped.
pub fn load_daily<S: KeyValueStore + ?Sized>(
    store: &S,
    routine_id: u64,
    date: NaiveDate,
) -> Option<DailyReflection> {
    match store::get_json(store, &keys::reflection(routine_id, date)) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(routine_id, %date, error = %e, "ignoring unreadable reflection");
            None
        }
    }
}

pub fn save_daily<S: KeyValueStore + ?Sized>(
    store: &mut S,
    routine_id: u64,
    date: NaiveDate,
    record: &DailyReflection,
) -> Result<()> {
    store::set_json(store, &keys::reflection(routine_id, date), record)
}

/// Reasons to store with a reflection: none for completed days, the user's
/// own selection when given, otherwise whatever the classifier finds.
pub fn resolve_reasons(completion: DayStatus, text: &str, explicit: Vec<String>) -> Vec<String> {
    match completion {
        DayStatus::Completed => Vec::new(),
        DayStatus::Skipped if explicit.is_empty() => failure::classify(text),
        DayStatus::Skipped => explicit,
    }
}

/// A daily reflection that passed validation and is waiting for the coach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReflection {
    pub routine_id: u64,
    pub date: NaiveDate,
    pub text: String,
    pub completion: DayStatus,
    pub failure_reasons: Vec<String>,
    pub context: UserContext,
    /// Reflection prompt for the coach.
    pub prompt: String,
}

impl PendingReflection {
    /// The record to store, with the coach's reply or templated feedback
    /// when the coach failed.
    pub fn into_record(self, reply: Result<String>, now: DateTime<Utc>) -> DailyReflection {
        let ai_response = match reply {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(routine_id = self.routine_id, error = %e, "coach unavailable, using template feedback");
                advisor::default_contextual_feedback(self.completion, &self.context)
            }
        };
        DailyReflection {
            reflection: self.text,
            ai_response,
            failure_reasons: self.failure_reasons,
            completion_type: self.completion,
            timestamp: now,
        }
    }
}

/// Validate a reflection for `goal` on `date` and build its coach prompt.
/// Reads the store only.
pub fn prepare_daily<S: KeyValueStore + ?Sized>(
    store: &S,
    goal: &Goal,
    date: NaiveDate,
    text: &str,
    explicit_reasons: Vec<String>,
) -> Result<PendingReflection> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RoutineError::Validation("reflection text is empty".into()));
    }
    let completion = tracker::status_on(store, goal.id, date).ok_or_else(|| {
        RoutineError::Validation(format!(
            "no status recorded for {date}; mark the day done or skipped first"
        ))
    })?;

    let failure_reasons = resolve_reasons(completion, text, explicit_reasons);
    let context = failure::user_context(store, goal.id, date);
    let prompt = coach::build_prompt(
        &goal.title,
        text,
        Some(HistoricalContext {
            context: &context,
            completion,
            failure_reasons: &failure_reasons,
        }),
    );
    Ok(PendingReflection {
        routine_id: goal.id,
        date,
        text: text.to_string(),
        completion,
        failure_reasons,
        context,
        prompt,
    })
}

/// Store the reflection for a prepared entry once the coach has answered.
pub fn finish_daily<S: KeyValueStore + ?Sized>(
    store: &mut S,
    pending: PendingReflection,
    reply: Result<String>,
    now: DateTime<Utc>,
) -> Result<DailyReflection> {
    let (routine_id, date) = (pending.routine_id, pending.date);
    let record = pending.into_record(reply, now);
    save_daily(store, routine_id, date, &record)?;
    Ok(record)
}

/// Write today's reflection for `goal` on `date`.
///
/// The day must already be marked. `generate` receives the reflection prompt
/// and is called once; any error falls back to templated feedback.
pub fn reflect_daily<S, F>(
    store: &mut S,
    goal: &Goal,
    date: NaiveDate,
    text: &str,
    explicit_reasons: Vec<String>,
    now: DateTime<Utc>,
    generate: F,
) -> Result<DailyReflection>
where
    S: KeyValueStore + ?Sized,
    F: FnOnce(&mut S, &str) -> Result<String>,
{
    let pending = prepare_daily(&*store, goal, date, text, explicit_reasons)?;
    let reply = generate(store, &pending.prompt);
    finish_daily(store, pending, reply, now)
}

/// Build a lookup over a routine's stored daily reflections.
pub fn reflection_lookup<S: KeyValueStore + ?Sized>(
    store: &S,
    routine_id: u64,
) -> impl Fn(NaiveDate) -> Option<DailyReflection> + '_ {
    move |date| load_daily(store, routine_id, date)
}

// ---------------------------------------------------------------------------
// Weekly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReflection {
    pub reflection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub challenges: String,
    pub ai_insight: String,
    #[serde(default)]
    pub suggested_adjustments: Vec<Adjustment>,
    pub weekly_stats: WeeklyStats,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyInput {
    pub reflection: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub challenges: String,
}

/// `(calendar year, ISO week number)` of `today`. Around New Year the two
/// can disagree (e.g. Dec 30 in ISO week 1); the pair is used as-is.
pub fn week_key(today: NaiveDate) -> (i32, u32) {
    (today.year(), today.iso_week().week())
}

pub fn load_weekly<S: KeyValueStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<Option<WeeklyReflection>> {
    let (year, week) = week_key(today);
    store::get_json(store, &keys::weekly_reflection(year, week))
}

/// Reject a second weekly reflection for the same week.
pub fn ensure_not_reflected<S: KeyValueStore + ?Sized>(store: &S, today: NaiveDate) -> Result<()> {
    let (year, week) = week_key(today);
    if store.get(&keys::weekly_reflection(year, week)).is_some() {
        return Err(RoutineError::AlreadyReflected { year, week });
    }
    Ok(())
}

/// Assemble a weekly reflection from precomputed inputs. Pure.
pub fn compose_weekly(
    goal: &Goal,
    weekly_stats: WeeklyStats,
    failure_stats: &FailureStats,
    input: WeeklyInput,
    now: DateTime<Utc>,
) -> WeeklyReflection {
    let suggested_adjustments = advisor::suggest_adjustments(goal, &weekly_stats, failure_stats);
    let ai_insight = advisor::generate_narrative_insight(
        &weekly_stats,
        failure_stats,
        input.mood,
        &input.reflection,
        &input.challenges,
    );
    WeeklyReflection {
        reflection: input.reflection,
        mood: input.mood,
        challenges: input.challenges,
        ai_insight,
        suggested_adjustments,
        weekly_stats,
        date: now,
    }
}

/// The statistics a weekly reflection would use for `goal` as of `today`.
pub fn weekly_inputs<S: KeyValueStore + ?Sized>(
    store: &S,
    goal: &Goal,
    today: NaiveDate,
    cfg: &StatsConfig,
) -> (WeeklyStats, FailureStats) {
    let weekly = stats::current_week_stats(tracker::status_lookup(store, goal.id), today);
    let failures = failure::aggregate_failure_stats(
        reflection_lookup(store, goal.id),
        today,
        cfg.window_days,
    );
    (weekly, failures)
}

/// Compute, store and return this week's reflection. Does not check for an
/// existing one; callers use [`ensure_not_reflected`] first.
pub fn submit_weekly<S: KeyValueStore + ?Sized>(
    store: &mut S,
    goal: &Goal,
    today: NaiveDate,
    input: WeeklyInput,
    cfg: &StatsConfig,
    now: DateTime<Utc>,
) -> Result<WeeklyReflection> {
    if input.reflection.trim().is_empty() {
        return Err(RoutineError::Validation("reflection text is empty".into()));
    }
    let (weekly, failures) = weekly_inputs(store, goal, today, cfg);
    let record = compose_weekly(goal, weekly, &failures, input, now);
    let (year, week) = week_key(today);
    store::set_json(store, &keys::weekly_reflection(year, week), &record)?;
    tracing::debug!(year, week, rate = record.weekly_stats.success_rate, "weekly reflection saved");
    Ok(record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
