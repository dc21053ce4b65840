use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{RhythmError, Result};

/// Top-level configuration structure for a play session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub judgment: JudgmentConfig,
    pub scoring: ScoringConfig,
    pub health: HealthConfig,
    pub spawner: SpawnerConfig,
    /// Lane -> symbol table. Lane `k` is the `k`-th playable key.
    pub lanes: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            judgment: JudgmentConfig::default(),
            scoring: ScoringConfig::default(),
            health: HealthConfig::default(),
            spawner: SpawnerConfig::default(),
            lanes: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GameConfig {
    /// Parses a JSON document. Missing sections and fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let j = &self.judgment;
        let ranges = [j.perfect_range, j.cool_range, j.good_range, j.bad_range];
        if ranges[0] < 0.0 || ranges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RhythmError::InvalidConfig(format!(
                "judgment ranges must be non-negative and strictly increasing, got {ranges:?}"
            )));
        }

        let miss_x = j.line_x - j.bad_range;
        if !(self.spawner.destroy_x < miss_x) {
            return Err(RhythmError::InvalidConfig(format!(
                "destroy_x {} must lie left of the auto-miss point {miss_x}",
                self.spawner.destroy_x
            )));
        }

        if !(self.spawner.note_speed > 0.0) {
            return Err(RhythmError::InvalidConfig(
                "note speed must be positive".to_string(),
            ));
        }

        if !(self.health.initial > 0.0) {
            return Err(RhythmError::InvalidConfig(
                "initial health must be positive".to_string(),
            ));
        }

        if self.lanes.is_empty() {
            return Err(RhythmError::InvalidConfig(
                "at least one lane is required".to_string(),
            ));
        }

        for (index, lane) in self.lanes.iter().enumerate() {
            if lane.trim().is_empty() {
                return Err(RhythmError::InvalidConfig(format!("lane {index} has no symbol")));
            }
            if self.lanes[..index].contains(lane) {
                return Err(RhythmError::InvalidConfig(format!(
                    "symbol `{lane}` is assigned to more than one lane"
                )));
            }
        }

        Ok(())
    }
}

/// Judgment line placement and the distance thresholds of each tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgmentConfig {
    pub line_x: f32,
    pub perfect_range: f32,
    pub cool_range: f32,
    pub good_range: f32,
    pub bad_range: f32,
}

impl Default for JudgmentConfig {
    fn default() -> Self {
        Self {
            line_x: 0.0,
            perfect_range: 0.1,
            cool_range: 0.2,
            good_range: 0.3,
            bad_range: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Target maximum before per-note rounding.
    pub max_score: u32,
    pub perfect_weight: u32,
    pub cool_weight: u32,
    pub good_weight: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_score: 350_000,
            perfect_weight: 100,
            cool_weight: 50,
            good_weight: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub initial: f32,
    pub miss_penalty: f32,
    pub combo_bonus: f32,
    /// Health is restored every time the combo reaches a multiple of this.
    pub combo_bonus_interval: u32,
    /// Seconds between game over and the game-over screen request.
    pub fade_duration: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            initial: 100.0,
            miss_penalty: 10.0,
            combo_bonus: 10.0,
            combo_bonus_interval: 10,
            fade_duration: 2.0,
        }
    }
}

/// How the spawner measures the wait before each note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPolicy {
    /// Each delay runs from the previous emission; frame overshoot is dropped
    /// and accumulates as drift.
    #[default]
    Relative,
    /// Each note is emitted as soon as the clock reaches its absolute time.
    Resync,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub spawn_x: f32,
    /// Leftward speed in stage units per second.
    pub note_speed: f32,
    /// Notes left of this position are despawned without judgment.
    pub destroy_x: f32,
    pub policy: SpawnPolicy,
    /// Delay between session start and the scheduled music start.
    pub music_lead_in: f64,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_x: 11.24,
            note_speed: 4.0,
            destroy_x: -10.0,
            policy: SpawnPolicy::Relative,
            music_lead_in: 2.81,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "judgment": { "bad_range": 0.8 }, "spawner": { "policy": "resync" } }"#,
        )
        .unwrap();

        assert_eq!(config.judgment.bad_range, 0.8);
        assert_eq!(config.judgment.perfect_range, 0.1);
        assert_eq!(config.spawner.policy, SpawnPolicy::Resync);
        assert_eq!(config.scoring.max_score, 350_000);
        assert_eq!(config.lanes.len(), 4);
    }

    #[test]
    fn rejects_unordered_ranges() {
        let err = GameConfig::from_json_str(r#"{ "judgment": { "cool_range": 0.1 } }"#)
            .unwrap_err();
        assert!(matches!(err, RhythmError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_despawn_before_auto_miss() {
        let err = GameConfig::from_json_str(
            r#"{ "judgment": { "line_x": 1.0 }, "spawner": { "destroy_x": 0.5 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RhythmError::InvalidConfig(_)));

        GameConfig::from_json_str(r#"{ "spawner": { "destroy_x": -0.6 } }"#).unwrap();
    }

    #[test]
    fn rejects_duplicate_lanes() {
        let err = GameConfig::from_json_str(r#"{ "lanes": ["A", "B", "A"] }"#).unwrap_err();
        assert!(format!("{err}").contains("`A`"));
    }
}
