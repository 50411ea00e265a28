//! Canned coaching copy.
//!
//! Random picks take an injected [`Rng`] so tests can seed them.

use crate::types::DayStatus;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;

pub const COMPLETE_MESSAGES: &[&str] = &[
    "🎉 훌륭해요! 오늘도 목표를 달성하셨네요. 조금씩 꾸준히 하는 게 정말 대단한 일이에요!",
    "✨ 완료! 이렇게 하나씩 쌓여가는 성공이 큰 변화를 만들어낼 거예요.",
    "🔥 멋져요! 오늘의 루틴 완료로 한 걸음 더 목표에 가까워졌어요.",
    "💪 대단해요! 꾸준함이 가장 큰 힘이라는 걸 보여주고 계시네요!",
];

pub const SKIP_MESSAGES: &[&str] = &[
    "괜찮아요! 오늘은 힘들었죠? 완벽하지 않아도 돼요. 내일은 조금 더 쉽게 시작해볼까요?",
    "오늘 하루 쉬어가는 것도 필요해요. 너무 자책하지 마세요. 내일 다시 함께 해봐요!",
    "모든 날이 완벽할 순 없어요. 중요한 건 다시 시작하는 것이죠. 응원할게요! 💪",
    "오늘은 쉬어가도 괜찮아요. 지금까지 잘 해왔으니까 내일은 더 가볍게 시작해봐요.",
];

pub const QUICK_MESSAGES: &[&str] = &[
    "오늘 루틴 완료했어요!",
    "오늘은 너무 힘들어요",
    "목표를 조정하고 싶어요",
    "동기부여가 필요해요",
];

const COMPLETED_REPLIES: &[&str] = &[
    "🎉 정말 잘하셨어요! 오늘의 성공이 내일의 힘이 될 거예요.",
    "👏 완료 축하해요! 이 기분을 기억해두세요.",
    "🔥 멋져요! 작은 성공이 모여 큰 변화가 돼요.",
];

const STRUGGLING_REPLIES: &[&str] = &[
    "🤗 힘든 날도 있죠. 오늘은 5분만이라도 해보는 건 어떨까요?",
    "🌱 완벽하지 않아도 괜찮아요. 쉬어가는 것도 과정이에요.",
    "💙 지금까지 잘 해오셨어요. 내일 다시 가볍게 시작해봐요.",
];

const ADJUST_REPLIES: &[&str] = &[
    "🛠️ 좋아요! 시간을 줄이거나 난이도를 낮춰서 부담을 덜어봐요.",
    "📅 조정은 실패가 아니에요. 지금 생활에 맞는 목표가 가장 좋은 목표예요.",
];

const MOTIVATION_REPLIES: &[&str] = &[
    "✨ 처음 이 목표를 세운 이유를 떠올려보세요. 그 마음이 답이에요!",
    "💪 오늘 한 번이 내일의 습관을 만들어요. 할 수 있어요!",
    "🌟 작은 보상을 정해두고 시작해보는 건 어때요?",
];

const GENERAL_REPLIES: &[&str] = &[
    "😊 이야기해줘서 고마워요! 루틴에 대해 궁금한 게 있으면 언제든 물어보세요.",
    "🙌 함께 하고 있어요. 오늘 하루는 어땠나요?",
];

/// Uniform pick from `candidates`. `None` only when the list is empty.
pub fn pick<'a, R: Rng + ?Sized>(candidates: &[&'a str], rng: &mut R) -> Option<&'a str> {
    candidates.choose(rng).copied()
}

pub fn status_message<R: Rng + ?Sized>(status: DayStatus, rng: &mut R) -> &'static str {
    let list = match status {
        DayStatus::Completed => COMPLETE_MESSAGES,
        DayStatus::Skipped => SKIP_MESSAGES,
    };
    pick(list, rng).unwrap_or_default()
}

/// Short confirmation copy: `(title, description)`.
pub fn toast(status: DayStatus, routine_title: Option<&str>) -> (&'static str, String) {
    match status {
        DayStatus::Completed => (
            "루틴 완료! 🎉",
            match routine_title {
                Some(t) => format!("{t} 완료했어요!"),
                None => "오늘의 목표를 달성했어요!".to_string(),
            },
        ),
        DayStatus::Skipped => ("오늘은 쉬어가요", "괜찮아요, 내일 다시 시작해봐요!".to_string()),
    }
}

pub fn welcome_message(goal_title: &str) -> String {
    format!(
        "안녕하세요! 저는 당신의 루틴 코치 AI예요. \"{goal_title}\" 목표를 함께 달성해나가요! 🎯\n\n\
         궁금한 것이 있거나 힘든 일이 있으면 언제든 말씀해주세요. 어떻게 도와드릴까요?"
    )
}

// ---------------------------------------------------------------------------
// Offline chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatIntent {
    Completed,
    Struggling,
    Adjust,
    Motivation,
    General,
}

impl ChatIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatIntent::Completed => "completed",
            ChatIntent::Struggling => "struggling",
            ChatIntent::Adjust => "adjust",
            ChatIntent::Motivation => "motivation",
            ChatIntent::General => "general",
        }
    }

    fn replies(self) -> &'static [&'static str] {
        match self {
            ChatIntent::Completed => COMPLETED_REPLIES,
            ChatIntent::Struggling => STRUGGLING_REPLIES,
            ChatIntent::Adjust => ADJUST_REPLIES,
            ChatIntent::Motivation => MOTIVATION_REPLIES,
            ChatIntent::General => GENERAL_REPLIES,
        }
    }
}

impl fmt::Display for ChatIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INTENT_KEYWORDS: &[(ChatIntent, &[&str])] = &[
    (ChatIntent::Completed, &["완료", "했어요", "성공", "해냈"]),
    (ChatIntent::Struggling, &["힘들", "힘드", "못했", "포기", "지쳐", "피곤"]),
    (ChatIntent::Adjust, &["조정", "바꾸", "변경", "줄이"]),
    (ChatIntent::Motivation, &["동기", "의욕", "응원", "하기 싫"]),
];

/// First intent whose keywords occur in `message`, else `General`.
pub fn detect_intent(message: &str) -> ChatIntent {
    let lower = message.to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(ChatIntent::General)
}

/// Reply used when no API key is configured.
pub fn offline_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> &'static str {
    pick(detect_intent(message).replies(), rng).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pick_is_deterministic_with_seed() {
        let a = pick(COMPLETE_MESSAGES, &mut StdRng::seed_from_u64(7));
        let b = pick(COMPLETE_MESSAGES, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(COMPLETE_MESSAGES.contains(&a.unwrap()));
    }

    #[test]
    fn pick_from_empty_is_none() {
        assert_eq!(pick(&[], &mut StdRng::seed_from_u64(1)), None);
    }

    #[test]
    fn status_message_draws_from_matching_list() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert!(SKIP_MESSAGES.contains(&status_message(DayStatus::Skipped, &mut rng)));
        }
    }

    #[test]
    fn quick_messages_map_to_intents() {
        let intents: Vec<_> = QUICK_MESSAGES.iter().map(|m| detect_intent(m)).collect();
        assert_eq!(
            intents,
            vec![
                ChatIntent::Completed,
                ChatIntent::Struggling,
                ChatIntent::Adjust,
                ChatIntent::Motivation
            ]
        );
        assert_eq!(detect_intent("안녕?"), ChatIntent::General);
    }

    #[test]
    fn offline_reply_uses_intent_list() {
        let reply = offline_reply("목표를 조정하고 싶어요", &mut StdRng::seed_from_u64(0));
        assert!(ADJUST_REPLIES.contains(&reply));
    }

    #[test]
    fn toast_mentions_routine_title() {
        let (title, desc) = toast(DayStatus::Completed, Some("독서"));
        assert_eq!(title, "루틴 완료! 🎉");
        assert_eq!(desc, "독서 완료했어요!");
        assert_eq!(toast(DayStatus::Skipped, None).0, "오늘은 쉬어가요");
    }

    #[test]
    fn welcome_includes_goal() {
        assert!(welcome_message("독서").contains("\"독서\" 목표"));
    }
}
