use crate::error::{Result, RoutineError};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ROUTINE_DIR: &str = ".routine";
pub const CONFIG_FILE: &str = ".routine/config.yaml";
pub const STORE_FILE: &str = ".routine/store.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn routine_dir(root: &Path) -> PathBuf {
    root.join(ROUTINE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn store_path(root: &Path) -> PathBuf {
    root.join(STORE_FILE)
}

// ---------------------------------------------------------------------------
// Calendar-day keys
// ---------------------------------------------------------------------------

const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_RE: OnceLock<Regex> = OnceLock::new();
static TIME_RE: OnceLock<Regex> = OnceLock::new();
static MONTH_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

fn month_re() -> &'static Regex {
    MONTH_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}$").unwrap())
}

fn time_re() -> &'static Regex {
    TIME_RE.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap())
}

/// Locale-independent calendar-day representation used in every store key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if !date_re().is_match(s) {
        return Err(RoutineError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| RoutineError::InvalidDate(s.to_string()))
}

/// Parse a `YYYY-MM` month into its year and month number.
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    if !month_re().is_match(s) {
        return Err(RoutineError::InvalidMonth(s.to_string()));
    }
    let first = NaiveDate::parse_from_str(&format!("{s}-01"), DATE_FORMAT)
        .map_err(|_| RoutineError::InvalidMonth(s.to_string()))?;
    Ok((first.year(), first.month()))
}

/// Validate a 24h `HH:MM` clock time.
pub fn validate_time(s: &str) -> Result<()> {
    if !time_re().is_match(s) {
        return Err(RoutineError::Validation(format!(
            "time '{s}' must be HH:MM (24h)"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
