pub mod calendar;
pub mod coach;
pub mod config;
pub mod goal;
pub mod init;
pub mod reflections;
pub mod routines;
pub mod stats;
pub mod status;
pub mod weekly;

use chrono::NaiveDate;
use routine_core::paths;
use serde::Deserialize;

/// `?routine=<id>&date=YYYY-MM-DD`, accepted by every per-goal endpoint.
/// Without `routine` the single goal is used; without `date`, today.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Scope {
    pub routine: Option<u64>,
    pub date: Option<String>,
}

/// `?date=YYYY-MM-DD` on `/api/routines/{id}/...` endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl Scope {
    pub fn for_routine(id: u64, q: DateQuery) -> Self {
        Self {
            routine: Some(id),
            date: q.date,
        }
    }

    pub fn today(&self) -> routine_core::Result<NaiveDate> {
        match &self.date {
            Some(d) => paths::parse_date(d),
            None => Ok(chrono::Local::now().date_naive()),
        }
    }
}
