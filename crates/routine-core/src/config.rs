use crate::coach::{self, GenerationConfig};
use crate::error::{Result, RoutineError};
use crate::paths;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StatsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_recent_window")]
    pub recent_window: u32,
    #[serde(default = "default_trend_weeks")]
    pub trend_weeks: u32,
    #[serde(default = "default_series_days")]
    pub series_days: u32,
}

fn default_window_days() -> u32 {
    stats::DEFAULT_WINDOW_DAYS
}

fn default_recent_window() -> u32 {
    stats::DEFAULT_RECENT_WINDOW
}

fn default_trend_weeks() -> u32 {
    stats::DEFAULT_TREND_WEEKS
}

fn default_series_days() -> u32 {
    stats::DEFAULT_SERIES_DAYS
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            recent_window: default_recent_window(),
            trend_weeks: default_trend_weeks(),
            series_days: default_series_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// CoachConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Consecutive invalid/expired key results before the key must be replaced.
    #[serde(default = "default_key_failure_threshold")]
    pub key_failure_threshold: u32,
    #[serde(default = "GenerationConfig::chat")]
    pub chat: GenerationConfig,
    #[serde(default = "GenerationConfig::reflection")]
    pub reflection: GenerationConfig,
}

fn default_base_url() -> String {
    coach::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    coach::DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    coach::DEFAULT_TIMEOUT_SECS
}

fn default_key_failure_threshold() -> u32 {
    coach::DEFAULT_KEY_FAILURE_THRESHOLD
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            key_failure_threshold: default_key_failure_threshold(),
            chat: GenerationConfig::chat(),
            reflection: GenerationConfig::reflection(),
        }
    }
}

impl CoachConfig {
    pub fn client(&self) -> coach::CoachClient {
        coach::CoachClient::new(
            &self.base_url,
            &self.model,
            Duration::from_secs(self.timeout_secs),
        )
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub coach: CoachConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            stats: StatsConfig::default(),
            coach: CoachConfig::default(),
        }
    }
}

impl Config {
    /// Load `.routine/config.yaml`. A project without the file uses defaults.
    pub fn load(root: &Path) -> Result<Self> {
        if !paths::routine_dir(root).is_dir() {
            return Err(RoutineError::NotInitialized);
        }
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let s = &self.stats;

        for (name, value) in [
            ("stats.window_days", s.window_days),
            ("stats.recent_window", s.recent_window),
            ("stats.trend_weeks", s.trend_weeks),
            ("stats.series_days", s.series_days),
        ] {
            if value == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{name} is 0; statistics will be empty"),
                });
            }
        }

        if s.recent_window > s.window_days {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "stats.recent_window ({}) is larger than stats.window_days ({})",
                    s.recent_window, s.window_days
                ),
            });
        }

        if self.coach.key_failure_threshold == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "coach.key_failure_threshold is 0; every key failure would force replacement"
                    .to_string(),
            });
        }

        for (name, gen) in [
            ("coach.chat", &self.coach.chat),
            ("coach.reflection", &self.coach.reflection),
        ] {
            if !(0.0..=2.0).contains(&gen.temperature) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "{name}.temperature={} is outside 0.0-2.0",
                        gen.temperature
                    ),
                });
            }
        }

        if self.coach.base_url.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "coach.base_url is empty".to_string(),
            });
        }

        warnings
    }
}

/// Create `.routine/` with a default config and an empty store. Existing
/// files are left alone. Returns true if the config was written.
pub fn init_project(root: &Path) -> Result<bool> {
    crate::io::ensure_dir(&paths::routine_dir(root))?;
    let yaml = serde_yaml::to_string(&Config::default())?;
    let created = crate::io::write_if_missing(&paths::config_path(root), yaml.as_bytes())?;
    crate::io::write_if_missing(&paths::store_path(root), b"{}\n")?;
    Ok(created)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.coach.model, "gemini-1.5-flash");
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = serde_yaml::from_str("version: 1\nstats:\n  window_days: 14\n").unwrap();
        assert_eq!(parsed.stats.window_days, 14);
        assert_eq!(parsed.stats.recent_window, 7);
        assert_eq!(parsed.coach.key_failure_threshold, 3);
        assert_eq!(parsed.coach.reflection.max_output_tokens, 250);
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_values() {
        let mut cfg = Config::default();
        cfg.stats.window_days = 5;
        cfg.stats.trend_weeks = 0;
        cfg.coach.key_failure_threshold = 0;
        cfg.coach.chat.temperature = 3.5;
        let warnings = cfg.validate();
        let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(warnings.len(), 4, "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("trend_weeks")));
        assert!(messages.iter().any(|m| m.contains("recent_window")));
        assert!(messages.iter().any(|m| m.contains("coach.chat.temperature")));
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn load_requires_init_and_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(RoutineError::NotInitialized)
        ));
        std::fs::create_dir_all(dir.path().join(".routine")).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn init_project_is_idempotent() {
        let dir = TempDir::new().unwrap();
        assert!(init_project(dir.path()).unwrap());
        assert!(dir.path().join(".routine/store.json").exists());
        assert!(!init_project(dir.path()).unwrap());
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".routine")).unwrap();
        let mut cfg = Config::default();
        cfg.coach.timeout_secs = 5;
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().coach.timeout_secs, 5);
    }
}
