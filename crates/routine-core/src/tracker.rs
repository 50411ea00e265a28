//! Daily status records: marking a day completed or skipped, reading the
//! history back as a lookup for the statistics engine, and the month
//! calendar across every routine.

use crate::config::StatsConfig;
use crate::error::Result;
use crate::goal::{self, Goal};
use crate::stats;
use crate::store::{keys, KeyValueStore};
use crate::types::DayStatus;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

pub fn status_on<S: KeyValueStore + ?Sized>(
    store: &S,
    routine_id: u64,
    date: NaiveDate,
) -> Option<DayStatus> {
    let raw = store.get(&keys::status(routine_id, date))?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            tracing::warn!(routine_id, %date, value = %raw, "ignoring unrecognized status record");
            None
        }
    }
}

/// Borrow the store as a `date → status` lookup for one routine.
pub fn status_lookup<S: KeyValueStore + ?Sized>(
    store: &S,
    routine_id: u64,
) -> impl Fn(NaiveDate) -> Option<DayStatus> + '_ {
    move |date| status_on(store, routine_id, date)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Record today's outcome for `goal` and update its counters.
///
/// Writes the status record (last write wins), applies the streak/total
/// bookkeeping, recomputes `success_rate` over the statistics window, and
/// saves the goal back where it came from.
pub fn record_status<S: KeyValueStore + ?Sized>(
    store: &mut S,
    goal: &mut Goal,
    date: NaiveDate,
    status: DayStatus,
    cfg: &StatsConfig,
    now: DateTime<Utc>,
) -> Result<()> {
    store.set(&keys::status(goal.id, date), status.as_str())?;
    goal.apply_status(status, now);

    let dashboard = stats::compute_streaks_and_rate(
        status_lookup(store, goal.id),
        date,
        cfg.window_days,
        cfg.recent_window,
    );
    goal.success_rate = dashboard.success_rate;

    goal::save_resolved(store, goal)?;
    tracing::debug!(routine_id = goal.id, %date, %status, streak = goal.streak, "status recorded");
    Ok(())
}

// ---------------------------------------------------------------------------
// Month calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMark {
    pub routine_id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub status: DayStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub marks: Vec<CalendarMark>,
}

/// Every day of `year-month` with the statuses recorded for `routines`.
/// Returns an empty list for an invalid month.
pub fn month_calendar<S: KeyValueStore + ?Sized>(
    store: &S,
    routines: &[Goal],
    year: i32,
    month: u32,
) -> Vec<CalendarDay> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| CalendarDay {
            date,
            marks: routines
                .iter()
                .filter_map(|r| {
                    status_on(store, r.id, date).map(|status| CalendarMark {
                        routine_id: r.id,
                        title: r.title.clone(),
                        color: r.color.clone(),
                        status,
                    })
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
