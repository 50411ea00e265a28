use axum::extract::{Query, State};
use axum::Json;
use chrono::Datelike;
use routine_core::goal;
use routine_core::tracker::{self, CalendarDay};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Restrict to one routine; every goal and routine otherwise.
    pub routine: Option<u64>,
}

/// GET /api/calendar: per-day marks for one month.
pub async fn get_calendar(
    State(app): State<AppState>,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    let now = chrono::Local::now().date_naive();
    let year = q.year.unwrap_or_else(|| now.year());
    let month = q.month.unwrap_or_else(|| now.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request(format!("month must be 1-12, got {month}")));
    }

    let days = app
        .with_store(move |store, _| {
            let goals = match q.routine {
                Some(id) => vec![goal::resolve(&*store, Some(id))?],
                None => goal::all_goals(&*store)?,
            };
            Ok(tracker::month_calendar(&*store, &goals, year, month))
        })
        .await?;
    Ok(Json(days))
}
