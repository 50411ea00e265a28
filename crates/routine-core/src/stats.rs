//! Statistics engine.
//!
//! Every function here is pure: it takes a `lookup` from calendar day to the
//! recorded [`DayStatus`] (or `None` when nothing was recorded) plus the
//! reference `today`, and walks backward from there. Callers build the lookup
//! from a store snapshot (see [`crate::tracker::status_lookup`]).

use crate::types::DayStatus;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_RECENT_WINDOW: u32 = 7;
pub const DEFAULT_TREND_WEEKS: u32 = 4;
pub const DEFAULT_SERIES_DAYS: u32 = 7;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_days: u32,
    pub completed_days: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Integer percentage, 0 when nothing was recorded.
    pub success_rate: u32,
    pub this_week_success: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week_label: String,
    pub success_rate: u32,
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPoint {
    pub day_label: String,
    /// 1 when completed. Skipped and unrecorded days are both 0.
    pub completed: u8,
    pub date_label: String,
}

/// Statistics for the calendar week (Sunday through today) used by weekly
/// reflections and the adjustment advisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub completed_days: u32,
    pub total_days: u32,
    pub success_rate: u32,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub day_label: String,
    pub status: Option<DayStatus>,
}

/// The trailing seven days with their raw statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekProgress {
    pub days: Vec<DayEntry>,
    pub completed: u32,
    pub skipped: u32,
    pub remaining: u32,
    pub success_rate: u32,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `round(part / total * 100)`, or 0 when `total` is 0.
pub fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(total) * 100.0).round() as u32
}

fn days_before(today: NaiveDate, offset: u32) -> NaiveDate {
    today - Duration::days(i64::from(offset))
}

pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "일",
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
    }
}

pub fn short_date_label(date: NaiveDate) -> String {
    format!("{}월 {}일", date.month(), date.day())
}

// ---------------------------------------------------------------------------
// Streaks and rate
// ---------------------------------------------------------------------------

pub fn compute_streaks_and_rate<F>(
    lookup: F,
    today: NaiveDate,
    window_days: u32,
    recent_window: u32,
) -> DashboardStats
where
    F: Fn(NaiveDate) -> Option<DayStatus>,
{
    let mut stats = DashboardStats::default();
    let mut running = 0;

    for offset in 0..window_days {
        let Some(status) = lookup(days_before(today, offset)) else {
            continue;
        };
        stats.total_days += 1;
        if status.is_completed() {
            stats.completed_days += 1;
            running += 1;
            if offset <= recent_window {
                stats.this_week_success += 1;
            }
        } else {
            stats.longest_streak = stats.longest_streak.max(running);
            running = 0;
        }
    }

    // A streak still open at the far end of the window counts too.
    stats.longest_streak = stats.longest_streak.max(running);

    stats.current_streak = (0..window_days)
        .take_while(|&offset| lookup(days_before(today, offset)) == Some(DayStatus::Completed))
        .count() as u32;

    stats.success_rate = percent(stats.completed_days, stats.total_days);
    stats
}

// ---------------------------------------------------------------------------
// Weekly trend
// ---------------------------------------------------------------------------

/// Non-overlapping 7-day blocks ending today, oldest block first.
pub fn compute_weekly_trend<F>(lookup: F, today: NaiveDate, weeks: u32) -> Vec<WeekSummary>
where
    F: Fn(NaiveDate) -> Option<DayStatus>,
{
    (0..weeks)
        .rev()
        .map(|week| {
            let mut completed = 0;
            let mut total = 0;
            for day in 0..7 {
                if let Some(status) = lookup(days_before(today, week * 7 + day)) {
                    total += 1;
                    if status.is_completed() {
                        completed += 1;
                    }
                }
            }
            WeekSummary {
                week_label: format!("{}주 전", week + 1),
                success_rate: percent(completed, total),
                completed,
                total,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Daily series
// ---------------------------------------------------------------------------

/// One point per day in `[today - days + 1, today]`, oldest first.
pub fn compute_daily_series<F>(lookup: F, today: NaiveDate, days: u32) -> Vec<DayPoint>
where
    F: Fn(NaiveDate) -> Option<DayStatus>,
{
    (0..days)
        .rev()
        .map(|offset| {
            let date = days_before(today, offset);
            DayPoint {
                day_label: weekday_label(date).to_string(),
                completed: u8::from(lookup(date) == Some(DayStatus::Completed)),
                date_label: short_date_label(date),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Week views
// ---------------------------------------------------------------------------

pub fn week_progress<F>(lookup: F, today: NaiveDate) -> WeekProgress
where
    F: Fn(NaiveDate) -> Option<DayStatus>,
{
    let days: Vec<DayEntry> = (0..7)
        .rev()
        .map(|offset| {
            let date = days_before(today, offset);
            DayEntry {
                date,
                day_label: weekday_label(date).to_string(),
                status: lookup(date),
            }
        })
        .collect();

    let completed = days
        .iter()
        .filter(|d| d.status == Some(DayStatus::Completed))
        .count() as u32;
    let skipped = days
        .iter()
        .filter(|d| d.status == Some(DayStatus::Skipped))
        .count() as u32;
    let recorded = completed + skipped;

    WeekProgress {
        days,
        completed,
        skipped,
        remaining: 7 - recorded,
        success_rate: percent(completed, recorded),
    }
}

/// Sunday-based calendar week up to and including `today`.
pub fn current_week_stats<F>(lookup: F, today: NaiveDate) -> WeeklyStats
where
    F: Fn(NaiveDate) -> Option<DayStatus>,
{
    let since_sunday = today.weekday().num_days_from_sunday();
    let mut completed_days = 0;
    let mut total_days = 0;
    for offset in 0..=since_sunday {
        if let Some(status) = lookup(days_before(today, offset)) {
            total_days += 1;
            if status.is_completed() {
                completed_days += 1;
            }
        }
    }
    WeeklyStats {
        completed_days,
        total_days,
        success_rate: percent(completed_days, total_days),
        streak: completed_days,
    }
}

// ---------------------------------------------------------------------------
// Motivation
// ---------------------------------------------------------------------------

pub fn motivation_message(success_rate: u32) -> &'static str {
    if success_rate >= 80 {
        "🔥 완벽해요! 이 기세로 계속 가봐요!"
    } else if success_rate >= 60 {
        "✨ 잘하고 있어요! 조금만 더 힘내봐요!"
    } else if success_rate >= 40 {
        "💪 괜찮아요, 꾸준히 하는 게 중요해요!"
    } else {
        "🌱 새로운 시작이에요. 하루씩 쌓아가봐요!"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
