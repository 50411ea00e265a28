use crate::error::RoutineError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DayStatus
// ---------------------------------------------------------------------------

/// Outcome recorded for one routine on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Completed,
    Skipped,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Completed => "completed",
            DayStatus::Skipped => "skipped",
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, DayStatus::Completed)
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DayStatus {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(DayStatus::Completed),
            "skipped" => Ok(DayStatus::Skipped),
            _ => Err(RoutineError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekdays,
    Alternate,
    Weekly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekdays => "weekdays",
            Frequency::Alternate => "alternate",
            Frequency::Weekly => "weekly",
        }
    }

    /// Human-facing label shown on routine cards.
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "매일",
            Frequency::Weekdays => "주중",
            Frequency::Alternate => "격일",
            Frequency::Weekly => "주 3회",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekdays" => Ok(Frequency::Weekdays),
            "alternate" => Ok(Frequency::Alternate),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(RoutineError::InvalidFrequency(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(RoutineError::InvalidDifficulty(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Tired,
    Stressed,
    Motivated,
}

impl Mood {
    pub fn all() -> &'static [Mood] {
        &[
            Mood::Great,
            Mood::Good,
            Mood::Neutral,
            Mood::Tired,
            Mood::Stressed,
            Mood::Motivated,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
            Mood::Stressed => "stressed",
            Mood::Motivated => "motivated",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mood {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RoutineError::InvalidMood(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FailureCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Time,
    Motivation,
    Health,
    External,
    Other,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::Time => "time",
            FailureCategory::Motivation => "motivation",
            FailureCategory::Health => "health",
            FailureCategory::External => "external",
            FailureCategory::Other => "other",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
