//! Goals and routines.
//!
//! A single-goal user keeps one [`Goal`] under `userGoal`; a multi-routine
//! user keeps a list under `userRoutines`. Both share the same shape, and
//! everything downstream (status records, reflections, statistics) keys off
//! the numeric `id`.

use crate::error::{Result, RoutineError};
use crate::paths;
use crate::store::{self, keys, KeyValueStore};
use crate::types::{DayStatus, Difficulty, Frequency};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Static configuration
// ---------------------------------------------------------------------------

/// Longest routine a draft may ask for: one day.
pub const MAX_DURATION: u32 = 24 * 60;

pub struct PresetCriterion {
    pub text: &'static str,
    pub category: &'static str,
}

pub const PRESET_CRITERIA: &[PresetCriterion] = &[
    PresetCriterion { text: "정해진 시간에 시작하기", category: "timing" },
    PresetCriterion { text: "최소 80% 집중도 유지하기", category: "quality" },
    PresetCriterion { text: "전체 시간 완주하기", category: "completion" },
    PresetCriterion { text: "준비물 미리 챙기기", category: "preparation" },
    PresetCriterion { text: "진행 상황 기록하기", category: "tracking" },
];

pub struct GoalSuggestion {
    pub title: &'static str,
    pub description: &'static str,
    pub duration: u32,
}

pub const GOAL_SUGGESTIONS: &[GoalSuggestion] = &[
    GoalSuggestion { title: "매일 30분 운동하기", description: "건강한 몸을 위해 꾸준히 운동해요", duration: 30 },
    GoalSuggestion { title: "독서 습관 만들기", description: "매일 책을 읽으며 지식을 쌓아요", duration: 20 },
    GoalSuggestion { title: "명상과 마음챙김", description: "마음의 평안을 위한 시간을 가져요", duration: 15 },
    GoalSuggestion { title: "새로운 언어 학습", description: "조금씩 꾸준히 새로운 언어를 배워요", duration: 25 },
];

pub const ROUTINE_COLORS: &[&str] = &[
    "blue", "green", "purple", "pink", "indigo", "red", "orange", "teal",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    pub id: u64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// User-editable fields of a goal, as submitted from the setup form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub success_criteria: Vec<SuccessCriterion>,
}

fn default_duration() -> u32 {
    30
}

fn default_time() -> String {
    "08:00".to_string()
}

impl Default for GoalDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            frequency: Frequency::default(),
            duration: default_duration(),
            time: default_time(),
            difficulty: Difficulty::default(),
            success_criteria: Vec::new(),
        }
    }
}

impl GoalDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Start a draft from one of the suggested starter goals.
    pub fn from_suggestion(s: &GoalSuggestion) -> Self {
        Self {
            title: s.title.to_string(),
            description: s.description.to_string(),
            duration: s.duration,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(RoutineError::Validation("title must not be empty".into()));
        }
        if self.duration == 0 {
            return Err(RoutineError::Validation(
                "duration must be a positive number of minutes".into(),
            ));
        }
        if self.duration > MAX_DURATION {
            return Err(RoutineError::Validation(format!(
                "duration must be at most {MAX_DURATION} minutes"
            )));
        }
        paths::validate_time(&self.time)
    }

    /// Add a custom criterion. Returns false for blank or duplicate text.
    pub fn add_criterion(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.has_criterion(text) {
            return false;
        }
        let id = self.next_criterion_id();
        self.success_criteria.push(SuccessCriterion {
            id,
            text: text.to_string(),
            category: None,
            is_custom: true,
        });
        true
    }

    /// Add a preset criterion. Returns false if its text is already present.
    pub fn add_preset(&mut self, preset: &PresetCriterion) -> bool {
        if self.has_criterion(preset.text) {
            return false;
        }
        let id = self.next_criterion_id();
        self.success_criteria.push(SuccessCriterion {
            id,
            text: preset.text.to_string(),
            category: Some(preset.category.to_string()),
            is_custom: false,
        });
        true
    }

    pub fn remove_criterion(&mut self, id: u64) -> bool {
        let before = self.success_criteria.len();
        self.success_criteria.retain(|c| c.id != id);
        self.success_criteria.len() != before
    }

    fn has_criterion(&self, text: &str) -> bool {
        self.success_criteria.iter().any(|c| c.text == text)
    }

    fn next_criterion_id(&self) -> u64 {
        unique_id(
            Utc::now().timestamp_millis() as u64,
            self.success_criteria.iter().map(|c| c.id),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub frequency: Frequency,
    pub duration: u32,
    pub time: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub success_criteria: Vec<SuccessCriterion>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub total_days: u32,
    #[serde(default)]
    pub success_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Build a new goal from a validated draft.
    pub fn create(draft: GoalDraft, id: u64, now: DateTime<Utc>) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            frequency: draft.frequency,
            duration: draft.duration,
            time: draft.time,
            difficulty: draft.difficulty,
            success_criteria: draft.success_criteria,
            streak: 0,
            total_days: 0,
            success_rate: 0,
            color: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the editable fields, keeping id, counters and creation time.
    pub fn apply_edit(&mut self, draft: GoalDraft, now: DateTime<Utc>) -> Result<()> {
        draft.validate()?;
        self.title = draft.title.trim().to_string();
        self.description = draft.description;
        self.frequency = draft.frequency;
        self.duration = draft.duration;
        self.time = draft.time;
        self.difficulty = draft.difficulty;
        self.success_criteria = draft.success_criteria;
        self.updated_at = now;
        Ok(())
    }

    pub fn to_draft(&self) -> GoalDraft {
        GoalDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            frequency: self.frequency,
            duration: self.duration,
            time: self.time.clone(),
            difficulty: self.difficulty,
            success_criteria: self.success_criteria.clone(),
        }
    }

    /// Apply a completion or skip to the running counters.
    pub fn apply_status(&mut self, status: DayStatus, now: DateTime<Utc>) {
        match status {
            DayStatus::Completed => {
                self.streak += 1;
                self.total_days += 1;
            }
            DayStatus::Skipped => self.streak = 0,
        }
        self.updated_at = now;
    }
}

/// Millisecond-timestamp id, bumped past any existing id it collides with.
pub fn unique_id(now_ms: u64, existing: impl IntoIterator<Item = u64>) -> u64 {
    let max = existing.into_iter().max();
    match max {
        Some(m) if m >= now_ms => m + 1,
        _ => now_ms,
    }
}

// ---------------------------------------------------------------------------
// Single-goal persistence
// ---------------------------------------------------------------------------

pub fn load_goal<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Goal>> {
    store::get_json(store, keys::GOAL)
}

pub fn save_goal<S: KeyValueStore + ?Sized>(store: &mut S, goal: &Goal) -> Result<()> {
    store::set_json(store, keys::GOAL, goal)
}

/// Create the single goal, or edit it in place when one already exists.
pub fn set_goal<S: KeyValueStore + ?Sized>(
    store: &mut S,
    draft: GoalDraft,
    now: DateTime<Utc>,
) -> Result<Goal> {
    let goal = match load_goal(store)? {
        Some(mut existing) => {
            existing.apply_edit(draft, now)?;
            existing
        }
        None => Goal::create(draft, now.timestamp_millis() as u64, now)?,
    };
    save_goal(store, &goal)?;
    Ok(goal)
}

// ---------------------------------------------------------------------------
// Multi-routine persistence
// ---------------------------------------------------------------------------

pub fn list_routines<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Goal>> {
    Ok(store::get_json(store, keys::ROUTINES)?.unwrap_or_default())
}

fn save_routines<S: KeyValueStore + ?Sized>(store: &mut S, routines: &[Goal]) -> Result<()> {
    store::set_json(store, keys::ROUTINES, routines)
}

pub fn add_routine<S, R>(
    store: &mut S,
    draft: GoalDraft,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Goal>
where
    S: KeyValueStore + ?Sized,
    R: Rng + ?Sized,
{
    let mut routines = list_routines(store)?;
    let id = unique_id(
        now.timestamp_millis() as u64,
        routines.iter().map(|r| r.id),
    );
    let mut routine = Goal::create(draft, id, now)?;
    routine.color = Some(ROUTINE_COLORS[rng.gen_range(0..ROUTINE_COLORS.len())].to_string());
    routines.push(routine.clone());
    save_routines(store, &routines)?;
    tracing::debug!(id, title = %routine.title, "routine added");
    Ok(routine)
}

/// Replace the stored routine with the same id.
pub fn update_routine<S: KeyValueStore + ?Sized>(store: &mut S, routine: &Goal) -> Result<()> {
    let mut routines = list_routines(store)?;
    let Some(slot) = routines.iter_mut().find(|r| r.id == routine.id) else {
        return Err(RoutineError::RoutineNotFound(routine.id));
    };
    *slot = routine.clone();
    save_routines(store, &routines)
}

/// Remove a routine. Returns false if no routine had that id.
pub fn remove_routine<S: KeyValueStore + ?Sized>(store: &mut S, id: u64) -> Result<bool> {
    let mut routines = list_routines(store)?;
    let before = routines.len();
    routines.retain(|r| r.id != id);
    if routines.len() == before {
        return Ok(false);
    }
    save_routines(store, &routines)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Find the goal a command targets: the single goal when `id` is `None`,
/// otherwise the goal or routine with that id.
pub fn resolve<S: KeyValueStore + ?Sized>(store: &S, id: Option<u64>) -> Result<Goal> {
    let goal = load_goal(store)?;
    match id {
        None => goal.ok_or(RoutineError::GoalNotSet),
        Some(id) => {
            if let Some(g) = goal.filter(|g| g.id == id) {
                return Ok(g);
            }
            list_routines(store)?
                .into_iter()
                .find(|r| r.id == id)
                .ok_or(RoutineError::RoutineNotFound(id))
        }
    }
}

/// Persist a goal back to wherever [`resolve`] found it.
pub fn save_resolved<S: KeyValueStore + ?Sized>(store: &mut S, goal: &Goal) -> Result<()> {
    match load_goal(store)? {
        Some(g) if g.id == goal.id => save_goal(store, goal),
        _ => update_routine(store, goal),
    }
}

/// Every goal and routine, single goal first.
pub fn all_goals<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Goal>> {
    let mut all: Vec<Goal> = load_goal(store)?.into_iter().collect();
    all.extend(list_routines(store)?);
    Ok(all)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn draft_defaults_match_setup_form() {
        let d = GoalDraft::new("run");
        assert_eq!(d.frequency, Frequency::Daily);
        assert_eq!(d.duration, 30);
        assert_eq!(d.time, "08:00");
        assert_eq!(d.difficulty, Difficulty::Medium);
        assert!(d.success_criteria.is_empty());
    }

    #[test]
    fn validate_rejects_bad_drafts() {
        assert!(GoalDraft::new("  ").validate().is_err());
        let mut d = GoalDraft::new("read");
        d.duration = 0;
        assert!(d.validate().is_err());
        d.duration = MAX_DURATION + 1;
        assert!(d.validate().is_err());
        d.duration = 700_000_000;
        assert!(d.validate().is_err());
        d.duration = MAX_DURATION;
        assert!(d.validate().is_ok());
        let mut d = GoalDraft::new("read");
        d.time = "25:00".into();
        assert!(d.validate().is_err());
        assert!(GoalDraft::new("read").validate().is_ok());
    }

    #[test]
    fn criteria_are_deduplicated_by_text() {
        let mut d = GoalDraft::new("read");
        assert!(d.add_preset(&PRESET_CRITERIA[0]));
        assert!(!d.add_preset(&PRESET_CRITERIA[0]));
        assert!(d.add_criterion("  책 10쪽 읽기 "));
        assert!(!d.add_criterion("책 10쪽 읽기"));
        assert!(!d.add_criterion("   "));
        assert_eq!(d.success_criteria.len(), 2);
        assert_eq!(d.success_criteria[0].category.as_deref(), Some("timing"));
        assert!(!d.success_criteria[0].is_custom);
        assert!(d.success_criteria[1].is_custom);
        assert_ne!(d.success_criteria[0].id, d.success_criteria[1].id);

        let id = d.success_criteria[0].id;
        assert!(d.remove_criterion(id));
        assert!(!d.remove_criterion(id));
    }

    #[test]
    fn suggestion_prefills_draft() {
        let d = GoalDraft::from_suggestion(&GOAL_SUGGESTIONS[2]);
        assert_eq!(d.duration, 15);
        assert_eq!(d.title, "명상과 마음챙김");
    }

    #[test]
    fn unique_id_bumps_on_collision() {
        assert_eq!(unique_id(100, [1, 2]), 100);
        assert_eq!(unique_id(100, [100]), 101);
        assert_eq!(unique_id(100, [150, 3]), 151);
        assert_eq!(unique_id(100, std::iter::empty()), 100);
    }

    #[test]
    fn set_goal_creates_then_edits_in_place() {
        let mut store = MemoryStore::new();
        let created = set_goal(&mut store, GoalDraft::new("운동"), now()).unwrap();
        assert_eq!(created.id, now().timestamp_millis() as u64);

        let mut loaded = load_goal(&store).unwrap().unwrap();
        loaded.apply_status(DayStatus::Completed, now());
        save_goal(&mut store, &loaded).unwrap();

        let later = now() + chrono::Duration::days(1);
        let mut draft = GoalDraft::new("운동 40분");
        draft.duration = 40;
        let edited = set_goal(&mut store, draft, later).unwrap();
        assert_eq!(edited.id, created.id);
        assert_eq!(edited.created_at, created.created_at);
        assert_eq!(edited.updated_at, later);
        assert_eq!(edited.duration, 40);
        assert_eq!(edited.streak, 1);
    }

    #[test]
    fn apply_status_updates_counters() {
        let mut g = Goal::create(GoalDraft::new("read"), 1, now()).unwrap();
        g.apply_status(DayStatus::Completed, now());
        g.apply_status(DayStatus::Completed, now());
        assert_eq!((g.streak, g.total_days), (2, 2));
        g.apply_status(DayStatus::Skipped, now());
        assert_eq!((g.streak, g.total_days), (0, 2));
    }

    #[test]
    fn routines_add_update_remove() {
        let mut store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(7);
        let a = add_routine(&mut store, GoalDraft::new("A"), now(), &mut rng).unwrap();
        let b = add_routine(&mut store, GoalDraft::new("B"), now(), &mut rng).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.color.is_some());

        let mut b2 = b.clone();
        b2.streak = 5;
        update_routine(&mut store, &b2).unwrap();
        assert_eq!(resolve(&store, Some(b.id)).unwrap().streak, 5);

        assert!(remove_routine(&mut store, a.id).unwrap());
        assert!(!remove_routine(&mut store, a.id).unwrap());
        assert_eq!(list_routines(&store).unwrap().len(), 1);
    }

    #[test]
    fn update_missing_routine_fails() {
        let mut store = MemoryStore::new();
        let g = Goal::create(GoalDraft::new("x"), 9, now()).unwrap();
        assert!(matches!(
            update_routine(&mut store, &g),
            Err(RoutineError::RoutineNotFound(9))
        ));
    }

    #[test]
    fn resolve_prefers_single_goal() {
        let mut store = MemoryStore::new();
        assert!(matches!(resolve(&store, None), Err(RoutineError::GoalNotSet)));
        let goal = set_goal(&mut store, GoalDraft::new("goal"), now()).unwrap();
        assert_eq!(resolve(&store, None).unwrap().id, goal.id);
        assert_eq!(resolve(&store, Some(goal.id)).unwrap().title, "goal");
        assert!(matches!(
            resolve(&store, Some(1)),
            Err(RoutineError::RoutineNotFound(1))
        ));
    }

    #[test]
    fn save_resolved_writes_back_to_origin() {
        let mut store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut goal = set_goal(&mut store, GoalDraft::new("goal"), now()).unwrap();
        let mut routine = add_routine(
            &mut store,
            GoalDraft::new("routine"),
            now() + chrono::Duration::seconds(1),
            &mut rng,
        )
        .unwrap();

        goal.streak = 3;
        routine.streak = 4;
        save_resolved(&mut store, &goal).unwrap();
        save_resolved(&mut store, &routine).unwrap();

        assert_eq!(load_goal(&store).unwrap().unwrap().streak, 3);
        assert_eq!(list_routines(&store).unwrap()[0].streak, 4);
        assert_eq!(all_goals(&store).unwrap().len(), 2);
    }
}
