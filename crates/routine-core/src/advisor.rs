//! Weekly adjustment advisor and templated coaching copy.
//!
//! Pure functions over a week's statistics, the failure tallies and what the
//! user wrote. Nothing here calls the network; when the coach gateway fails
//! callers fall back to [`default_contextual_feedback`].

use crate::failure::{FailureStats, UserContext};
use crate::goal::Goal;
use crate::stats::WeeklyStats;
use crate::types::{DayStatus, Difficulty, FailureCategory, Mood};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suggested value for a time adjustment. Advisory only.
pub const FLEXIBLE_TIME_SLOT: &str = "flexible";

const MIN_DURATION: u32 = 10;
const EXPANSION_MINUTES: u32 = 10;
const CATEGORY_THRESHOLD: u32 = 2;

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Duration,
    Time,
    Difficulty,
    Expansion,
}

impl AdjustmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentKind::Duration => "duration",
            AdjustmentKind::Time => "time",
            AdjustmentKind::Difficulty => "difficulty",
            AdjustmentKind::Expansion => "expansion",
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub current_value: String,
    pub suggested_value: String,
    pub reason: String,
}

/// Every rule that applies, in rule order. Rules are independent.
pub fn suggest_adjustments(
    goal: &Goal,
    weekly: &WeeklyStats,
    failures: &FailureStats,
) -> Vec<Adjustment> {
    let mut out = Vec::new();

    if weekly.success_rate < 50 {
        let shorter = (goal.duration.saturating_mul(7) / 10).max(MIN_DURATION);
        out.push(Adjustment {
            kind: AdjustmentKind::Duration,
            current_value: goal.duration.to_string(),
            suggested_value: shorter.to_string(),
            reason: "이번 주 성공률이 50% 미만이에요. 시간을 줄여 부담을 낮춰보세요.".to_string(),
        });
    }

    if failures.count(FailureCategory::Time) >= CATEGORY_THRESHOLD {
        out.push(Adjustment {
            kind: AdjustmentKind::Time,
            current_value: goal.time.clone(),
            suggested_value: FLEXIBLE_TIME_SLOT.to_string(),
            reason: "시간 부족으로 건너뛴 날이 많았어요. 더 여유로운 시간대로 옮겨보세요."
                .to_string(),
        });
    }

    if failures.count(FailureCategory::Motivation) >= CATEGORY_THRESHOLD {
        out.push(Adjustment {
            kind: AdjustmentKind::Difficulty,
            current_value: goal.difficulty.to_string(),
            suggested_value: Difficulty::Easy.to_string(),
            reason: "의욕이 떨어진 날이 많았어요. 난이도를 낮춰 작은 성공부터 쌓아봐요."
                .to_string(),
        });
    }

    if weekly.success_rate >= 80 && weekly.total_days >= 5 {
        out.push(Adjustment {
            kind: AdjustmentKind::Expansion,
            current_value: goal.duration.to_string(),
            suggested_value: goal.duration.saturating_add(EXPANSION_MINUTES).to_string(),
            reason: "꾸준히 잘 해내고 있어요. 한 단계 늘려볼 준비가 된 것 같아요.".to_string(),
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Narrative insight
// ---------------------------------------------------------------------------

/// Templated weekly insight. `reflection` and `challenges` are the user's
/// free text; the stress paragraph keys off `challenges`, the positive one
/// off `reflection`.
pub fn generate_narrative_insight(
    weekly: &WeeklyStats,
    failures: &FailureStats,
    mood: Option<Mood>,
    reflection: &str,
    challenges: &str,
) -> String {
    let rate = weekly.success_rate;
    let mut insight = if rate >= 80 {
        format!(
            "🎉 이번 주 정말 훌륭했어요! {rate}%의 성공률을 달성하셨네요. \
             이 기세를 유지하면서도 너무 무리하지 마세요. "
        )
    } else if rate >= 60 {
        format!(
            "✨ 이번 주도 잘 하셨어요! {rate}%는 충분히 의미있는 성과예요. \
             완벽하지 않아도 괜찮아요. 꾸준함이 더 중요해요. "
        )
    } else if rate >= 40 {
        "💪 힘든 한 주였지만 포기하지 않으셨네요. \
         다음 주는 목표를 조금 낮춰서 부담을 줄여보는 건 어떨까요? "
            .to_string()
    } else {
        "🌱 힘든 시기를 보내고 계시는군요. 괜찮아요, 새로운 시작이 될 수 있어요. \
         목표를 더 작게 나누어 작은 성공부터 쌓아가봐요. "
            .to_string()
    };

    if failures.count(FailureCategory::Time) >= CATEGORY_THRESHOLD {
        insight.push_str(
            "\n\n시간이 부족했던 날이 많았네요. 루틴 시간을 조금 줄이거나 \
             여유 있는 시간대로 옮겨보는 건 어떨까요?",
        );
    }
    if failures.count(FailureCategory::Motivation) >= CATEGORY_THRESHOLD {
        insight.push_str(
            "\n\n의욕이 떨어진 날이 있었군요. 시작 장벽을 낮추고, \
             딱 5분만 해보자는 마음으로 접근해보세요.",
        );
    }
    if failures.count(FailureCategory::Health) >= CATEGORY_THRESHOLD {
        insight.push_str(
            "\n\n몸 상태가 좋지 않은 날이 있었네요. 회복이 먼저예요. \
             컨디션이 돌아올 때까지 강도를 낮춰도 괜찮아요.",
        );
    }

    if mood == Some(Mood::Stressed) || challenges.contains("스트레스") || challenges.contains("힘들")
    {
        insight.push_str(
            "\n\n스트레스가 많으셨던 것 같아요. 루틴을 스트레스 해소의 도구로 활용해보세요. \
             완벽하게 하려고 하지 말고, 그날그날 컨디션에 맞춰 유연하게 조정하는 것도 좋습니다.",
        );
    }

    if mood == Some(Mood::Motivated) || reflection.contains("좋았") || reflection.contains("성취")
    {
        insight.push_str(
            "\n\n긍정적인 에너지가 느껴져요! 이런 동기가 지속될 수 있도록 작은 보상을 주는 것도 좋겠어요. \
             자신을 칭찬하는 시간을 가져보세요.",
        );
    }

    insight
}

// ---------------------------------------------------------------------------
// Daily fallback
// ---------------------------------------------------------------------------

/// Feedback shown after a daily reflection when the coach is unavailable.
pub fn default_contextual_feedback(completion: DayStatus, context: &UserContext) -> String {
    match completion {
        DayStatus::Completed => format!(
            "축하해요! 연속 {}일째 성공이네요. 이 패턴을 유지해보세요! 💪",
            context.current_streak
        ),
        DayStatus::Skipped => format!(
            "괜찮아요. 최근 성공률이 {}%니까 충분히 잘하고 있어요. 내일 다시 시작해봐요! 🌟",
            context.recent_success_rate
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
