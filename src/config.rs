//! Difficulty presets and round rules
//!
//! Pure data. The engine copies the active [`Config`] at round start, so edits
//! made mid-round only take effect on the next start.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_DURATION_SEC, MIN_DURATION_SEC, MIN_LIVES};

/// Pace bundle for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// How long a target stays tappable
    pub lifetime_ms: u64,
    /// Spawn cadence
    pub spawn_every_ms: u64,
}

/// Named difficulty levels, slowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
    Agony,
}

impl Difficulty {
    /// Every preset in increasing difficulty
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Extreme,
        Difficulty::Agony,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Extreme => "Extreme",
            Difficulty::Agony => "Agony",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "extreme" => Some(Difficulty::Extreme),
            "agony" => Some(Difficulty::Agony),
            _ => None,
        }
    }

    /// Like [`Difficulty::from_str`], but unknown names fall back to Medium
    pub fn from_name(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            log::warn!("Unknown difficulty {:?}, using Medium", s);
            Difficulty::Medium
        })
    }

    /// Target lifetime and spawn cadence for this level
    pub fn preset(&self) -> Preset {
        let (lifetime_ms, spawn_every_ms) = match self {
            Difficulty::Easy => (1800, 1000),
            Difficulty::Medium => (1400, 800),
            Difficulty::Hard => (1100, 650),
            Difficulty::Extreme => (850, 500),
            Difficulty::Agony => (650, 380),
        };
        Preset {
            lifetime_ms,
            spawn_every_ms,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Difficulty {
    fn from(s: String) -> Self {
        Difficulty::from_name(&s)
    }
}

impl From<Difficulty> for String {
    fn from(d: Difficulty) -> Self {
        d.as_str().to_string()
    }
}

/// Effective lives rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivesRule {
    Finite(u32),
    Infinite,
}

/// Effective round duration rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationRule {
    Finite { secs: u32 },
    Infinite,
}

impl DurationRule {
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            DurationRule::Finite { secs } => Some(u64::from(*secs) * 1000),
            DurationRule::Infinite => None,
        }
    }
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// User-tunable round settings
///
/// The finite values are kept while the matching `infinite_*` flag is on, so
/// toggling infinity off restores the previous number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub max_lives: u32,
    pub infinite_lives: bool,
    pub duration_sec: u32,
    pub infinite_duration: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            max_lives: 3,
            infinite_lives: false,
            duration_sec: 30,
            infinite_duration: false,
        }
    }
}

impl Config {
    pub fn preset(&self) -> Preset {
        self.difficulty.preset()
    }

    pub fn lives_rule(&self) -> LivesRule {
        if self.infinite_lives {
            LivesRule::Infinite
        } else {
            LivesRule::Finite(self.max_lives)
        }
    }

    pub fn duration_rule(&self) -> DurationRule {
        if self.infinite_duration {
            DurationRule::Infinite
        } else {
            DurationRule::Finite {
                secs: self.duration_sec,
            }
        }
    }

    /// Lives a round starts with (1 when lives are infinite)
    pub fn starting_lives(&self) -> u32 {
        match self.lives_rule() {
            LivesRule::Finite(n) => n,
            LivesRule::Infinite => 1,
        }
    }

    pub fn set_max_lives(&mut self, n: i64) {
        self.max_lives = clamp_lives(n);
    }

    pub fn set_duration_sec(&mut self, n: i64) {
        self.duration_sec = clamp_duration(n);
    }

    /// Parse a lives text field. Garbage and values below 1 become 1.
    pub fn parse_lives_input(input: &str) -> u32 {
        input
            .trim()
            .parse::<i64>()
            .map(clamp_lives)
            .unwrap_or(MIN_LIVES)
    }

    /// Parse a duration text field, clamped to [5, 30]. Garbage becomes 5.
    pub fn parse_duration_input(input: &str) -> u32 {
        input
            .trim()
            .parse::<i64>()
            .map(clamp_duration)
            .unwrap_or(MIN_DURATION_SEC)
    }

    /// Re-apply the clamps (used after deserialising untrusted input)
    pub fn sanitized(mut self) -> Self {
        self.max_lives = clamp_lives(i64::from(self.max_lives));
        self.duration_sec = clamp_duration(i64::from(self.duration_sec));
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}

fn clamp_lives(n: i64) -> u32 {
    n.clamp(i64::from(MIN_LIVES), i64::from(u32::MAX)) as u32
}

fn clamp_duration(n: i64) -> u32 {
    n.clamp(i64::from(MIN_DURATION_SEC), i64::from(MAX_DURATION_SEC)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_presets_get_strictly_faster() {
        for pair in Difficulty::ALL.windows(2) {
            let (easier, harder) = (pair[0].preset(), pair[1].preset());
            assert!(easier.lifetime_ms > harder.lifetime_ms, "{:?}", pair);
            assert!(easier.spawn_every_ms > harder.spawn_every_ms, "{:?}", pair);
        }
    }

    #[test]
    fn test_unknown_difficulty_falls_back_to_medium() {
        assert_eq!(Difficulty::from_name("nightmare"), Difficulty::Medium);
        assert_eq!(Difficulty::from_name(""), Difficulty::Medium);
        assert_eq!(Difficulty::from_name("  HARD "), Difficulty::Hard);
        assert_eq!(Difficulty::from_str("nope"), None);
    }

    #[test]
    fn test_input_parsing_clamps() {
        assert_eq!(Config::parse_lives_input("abc"), 1);
        assert_eq!(Config::parse_lives_input("0"), 1);
        assert_eq!(Config::parse_lives_input("-4"), 1);
        assert_eq!(Config::parse_lives_input(" 7 "), 7);

        assert_eq!(Config::parse_duration_input("2"), 5);
        assert_eq!(Config::parse_duration_input("99"), 30);
        assert_eq!(Config::parse_duration_input("12"), 12);
        assert_eq!(Config::parse_duration_input("soon"), 5);
    }

    #[test]
    fn test_rules_follow_flags() {
        let mut config = Config::default();
        config.set_max_lives(5);
        assert_eq!(config.lives_rule(), LivesRule::Finite(5));
        assert_eq!(config.starting_lives(), 5);

        config.infinite_lives = true;
        assert_eq!(config.lives_rule(), LivesRule::Infinite);
        assert_eq!(config.starting_lives(), 1);

        // Finite value survives the toggle
        config.infinite_lives = false;
        assert_eq!(config.lives_rule(), LivesRule::Finite(5));

        config.set_duration_sec(12);
        assert_eq!(config.duration_rule().as_millis(), Some(12_000));
        config.infinite_duration = true;
        assert_eq!(config.duration_rule().as_millis(), None);
    }

    #[test]
    fn test_json_roundtrip_and_sanitize() {
        let config = Config {
            difficulty: Difficulty::Extreme,
            max_lives: 4,
            infinite_lives: false,
            duration_sec: 20,
            infinite_duration: true,
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"Extreme\""));
        assert_eq!(Config::from_json(&json).unwrap(), config);

        let loaded =
            Config::from_json(r#"{"difficulty":"bogus","max_lives":0,"duration_sec":300}"#)
                .unwrap();
        assert_eq!(loaded.difficulty, Difficulty::Medium);
        assert_eq!(loaded.max_lives, 1);
        assert_eq!(loaded.duration_sec, 30);
        assert!(!loaded.infinite_lives);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::load("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_clamps_stay_in_range(n in any::<i64>()) {
            let mut config = Config::default();
            config.set_max_lives(n);
            config.set_duration_sec(n);
            prop_assert!(config.max_lives >= MIN_LIVES);
            prop_assert!((MIN_DURATION_SEC..=MAX_DURATION_SEC).contains(&config.duration_sec));
        }
    }
}
