//! Failure-reason taxonomy and keyword classifier.
//!
//! Skipped days can carry one or more reason ids. The ids come either from
//! the user directly or from [`classify`], which scans the reflection text for
//! the keywords below. Declaration order is significant: [`classify`] returns
//! matches in this order.

use crate::reflection::{self, DailyReflection};
use crate::stats::percent;
use crate::store::KeyValueStore;
use crate::tracker;
use crate::types::{DayStatus, FailureCategory};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Returned by [`classify`] when no keyword matches. Not part of the taxonomy.
pub const OTHER_REASON: &str = "other";

pub const RECENT_CONTEXT_DAYS: u32 = 7;

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    pub id: &'static str,
    pub text: &'static str,
    pub category: FailureCategory,
    pub keywords: &'static [&'static str],
}

pub const FAILURE_REASONS: &[FailureReason] = &[
    FailureReason {
        id: "time_lack",
        text: "시간이 부족했어요",
        category: FailureCategory::Time,
        keywords: &["시간", "바쁨", "늦음", "급함"],
    },
    FailureReason {
        id: "motivation_low",
        text: "의욕이 없었어요",
        category: FailureCategory::Motivation,
        keywords: &["의욕", "동기", "귀찮", "하기싫"],
    },
    FailureReason {
        id: "health_issue",
        text: "몸이 좋지 않았어요",
        category: FailureCategory::Health,
        keywords: &["아픔", "피곤", "감기", "몸살", "아프"],
    },
    FailureReason {
        id: "external_factor",
        text: "외부 상황 때문이에요",
        category: FailureCategory::External,
        keywords: &["일정", "약속", "상황", "사정"],
    },
    FailureReason {
        id: "forgot",
        text: "깜빡했어요",
        category: FailureCategory::Other,
        keywords: &["깜빡", "잊어버림", "기억", "놓쳤"],
    },
    FailureReason {
        id: "weather",
        text: "날씨가 안 좋았어요",
        category: FailureCategory::External,
        keywords: &["날씨", "비", "추움", "더움"],
    },
    FailureReason {
        id: "stress",
        text: "스트레스가 심했어요",
        category: FailureCategory::Motivation,
        keywords: &["스트레스", "힘듦", "우울", "걱정"],
    },
];

pub fn find_reason(id: &str) -> Option<&'static FailureReason> {
    FAILURE_REASONS.iter().find(|r| r.id == id)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Every reason whose keywords occur in `text` (case-insensitive), in
/// taxonomy order. Falls back to `["other"]`.
pub fn classify(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let found: Vec<String> = FAILURE_REASONS
        .iter()
        .filter(|r| r.keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
        .map(|r| r.id.to_string())
        .collect();
    if found.is_empty() {
        vec![OTHER_REASON.to_string()]
    } else {
        found
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureStats {
    /// Skipped days with a reflection that lists reasons.
    pub total: u32,
    /// One increment per listed reason, so a day can count more than once.
    pub by_category: BTreeMap<FailureCategory, u32>,
}

impl FailureStats {
    pub fn count(&self, category: FailureCategory) -> u32 {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Tally failure reasons over the trailing `window_days` (today included).
pub fn aggregate_failure_stats<F>(lookup: F, today: NaiveDate, window_days: u32) -> FailureStats
where
    F: Fn(NaiveDate) -> Option<DailyReflection>,
{
    let mut stats = FailureStats::default();
    for offset in 0..window_days {
        let date = today - Duration::days(i64::from(offset));
        let Some(record) = lookup(date) else {
            continue;
        };
        if record.completion_type != DayStatus::Skipped || record.failure_reasons.is_empty() {
            continue;
        }
        stats.total += 1;
        for id in &record.failure_reasons {
            if let Some(reason) = find_reason(id) {
                *stats.by_category.entry(reason.category).or_insert(0) += 1;
            }
        }
    }
    stats
}

// ---------------------------------------------------------------------------
// Recent context
// ---------------------------------------------------------------------------

/// Short history fed into the daily-reflection prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub recent_success_rate: u32,
    pub common_failures: Vec<String>,
    /// 1 when today is already completed, else 0.
    pub current_streak: u32,
}

pub fn user_context<S: KeyValueStore + ?Sized>(
    store: &S,
    routine_id: u64,
    today: NaiveDate,
) -> UserContext {
    let mut completed = 0;
    let mut recorded = 0;
    let mut current_streak = 0;
    let mut common_failures: Vec<String> = Vec::new();

    for offset in 0..RECENT_CONTEXT_DAYS {
        let date = today - Duration::days(i64::from(offset));
        let Some(status) = tracker::status_on(store, routine_id, date) else {
            continue;
        };
        recorded += 1;
        if status.is_completed() {
            completed += 1;
            if offset == 0 {
                current_streak = 1;
            }
        } else if let Some(record) = reflection::load_daily(store, routine_id, date) {
            for id in record.failure_reasons {
                if !common_failures.contains(&id) {
                    common_failures.push(id);
                }
            }
        }
    }

    UserContext {
        recent_success_rate: percent(completed, recorded),
        common_failures,
        current_streak,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{keys, MemoryStore};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn record(status: DayStatus, reasons: &[&str]) -> DailyReflection {
        DailyReflection {
            reflection: String::new(),
            ai_response: String::new(),
            failure_reasons: reasons.iter().map(|s| s.to_string()).collect(),
            completion_type: status,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 15, 21, 0, 0).unwrap(),
        }
    }

    fn lookup(
        entries: Vec<(u32, DailyReflection)>,
    ) -> impl Fn(NaiveDate) -> Option<DailyReflection> {
        let map: HashMap<NaiveDate, DailyReflection> = entries
            .into_iter()
            .map(|(o, r)| (today() - Duration::days(i64::from(o)), r))
            .collect();
        move |d| map.get(&d).cloned()
    }

    #[test]
    fn classify_finds_time_and_health() {
        assert_eq!(
            classify("너무 바빠서 시간이 없었고 피곤했어요"),
            vec!["time_lack", "health_issue"]
        );
    }

    #[test]
    fn classify_falls_back_to_other() {
        assert_eq!(classify("그냥 안 했어요"), vec!["other"]);
        assert_eq!(classify("그냥 아무 이유 없어요"), vec!["other"]);
        assert_eq!(classify(""), vec!["other"]);
    }

    #[test]
    fn classify_finds_time_lack_in_a_plain_sentence() {
        let found = classify("오늘은 시간이 너무 부족했어요");
        assert!(found.contains(&"time_lack".to_string()));
        assert_eq!(found, vec!["time_lack"]);
    }

    #[test]
    fn classify_keeps_taxonomy_order() {
        // stress listed before time in the text, still returned after it.
        assert_eq!(classify("스트레스 때문에 시간 없음"), vec!["time_lack", "stress"]);
    }

    #[test]
    fn classify_single_char_keyword_matches_inside_words() {
        // "비" (rain) is a substring of "비행기".
        assert_eq!(classify("비행기를 탔어요"), vec!["weather"]);
    }

    #[test]
    fn classify_is_case_insensitive() {
        // Taxonomy keywords are Hangul, but lowercase folding still applies.
        assert_eq!(classify("STRESS"), vec!["other"]);
        assert_eq!(classify("일정이 ABC"), vec!["external_factor"]);
    }

    #[test]
    fn aggregate_counts_each_reason() {
        let stats = aggregate_failure_stats(
            lookup(vec![
                (0, record(DayStatus::Skipped, &["time_lack", "stress"])),
                (1, record(DayStatus::Skipped, &["time_lack"])),
                (2, record(DayStatus::Completed, &["time_lack"])),
                (3, record(DayStatus::Skipped, &[])),
            ]),
            today(),
            30,
        );
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count(FailureCategory::Time), 2);
        assert_eq!(stats.count(FailureCategory::Motivation), 1);
        assert_eq!(stats.count(FailureCategory::Health), 0);
    }

    #[test]
    fn aggregate_unknown_ids_count_toward_total_only() {
        let stats = aggregate_failure_stats(
            lookup(vec![(0, record(DayStatus::Skipped, &["other", "bogus"]))]),
            today(),
            30,
        );
        assert_eq!(stats.total, 1);
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn aggregate_forgot_counts_as_other_category() {
        let stats = aggregate_failure_stats(
            lookup(vec![(0, record(DayStatus::Skipped, &["forgot"]))]),
            today(),
            30,
        );
        assert_eq!(stats.count(FailureCategory::Other), 1);
    }

    #[test]
    fn aggregate_respects_window() {
        let stats = aggregate_failure_stats(
            lookup(vec![
                (6, record(DayStatus::Skipped, &["time_lack"])),
                (7, record(DayStatus::Skipped, &["time_lack"])),
            ]),
            today(),
            7,
        );
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn failure_stats_serialize_with_category_names() {
        let mut stats = FailureStats::default();
        stats.total = 1;
        stats.by_category.insert(FailureCategory::Time, 1);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_category"]["time"], 1);
    }

    #[test]
    fn user_context_collects_recent_history() {
        let mut store = MemoryStore::new();
        let id = 7;
        let d = |o: i64| today() - Duration::days(o);

        store.set(&keys::status(id, d(0)), "completed").unwrap();
        store.set(&keys::status(id, d(1)), "skipped").unwrap();
        store.set(&keys::status(id, d(2)), "skipped").unwrap();
        store.set(&keys::status(id, d(3)), "completed").unwrap();
        // Outside the 7-day context.
        store.set(&keys::status(id, d(8)), "skipped").unwrap();

        reflection::save_daily(&mut store, id, d(1), &record(DayStatus::Skipped, &["time_lack", "stress"]))
            .unwrap();
        reflection::save_daily(&mut store, id, d(2), &record(DayStatus::Skipped, &["stress", "weather"]))
            .unwrap();

        let ctx = user_context(&store, id, today());
        assert_eq!(ctx.recent_success_rate, 50);
        assert_eq!(ctx.current_streak, 1);
        assert_eq!(ctx.common_failures, vec!["time_lack", "stress", "weather"]);
    }

    #[test]
    fn user_context_empty_history() {
        let store = MemoryStore::new();
        let ctx = user_context(&store, 1, today());
        assert_eq!(ctx, UserContext::default());
    }
}
