//! Data-driven game balance
//!
//! Every number the simulation reads lives here so a host can ship a JSON
//! balance file without recompiling. Missing fields fall back to the
//! defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading a balance file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl TuningError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// One obstacle size tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierSpec {
    pub radius: f32,
    pub score: u32,
}

/// Fragment scatter speed distribution (bimodal)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSpec {
    /// Probability of drawing from the slow band
    pub slow_chance: f64,
    pub slow_min: f32,
    pub slow_max: f32,
    pub fast_min: f32,
    pub fast_max: f32,
}

impl Default for ScatterSpec {
    fn default() -> Self {
        Self {
            slow_chance: 0.8,
            slow_min: 0.3,
            slow_max: 1.0,
            fast_min: 1.0,
            fast_max: 2.5,
        }
    }
}

/// Difficulty curve parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySpec {
    /// Level at which the cubic ease-in hands over to logarithmic growth
    pub ease_threshold_level: u32,
    pub log_scale: f32,
    pub base_spawn_interval_ms: f64,
    pub min_spawn_interval_ms: f64,
    pub base_speed_min: f32,
    pub base_speed_max: f32,
    pub speed_min_growth: f32,
    pub speed_max_growth: f32,
    pub level_duration_ms: f64,
    pub transition_ticks: u32,
}

impl Default for DifficultySpec {
    fn default() -> Self {
        Self {
            ease_threshold_level: 10,
            log_scale: 0.5,
            base_spawn_interval_ms: 1500.0,
            min_spawn_interval_ms: 250.0,
            base_speed_min: 1.5,
            base_speed_max: 3.5,
            speed_min_growth: 0.5,
            speed_max_growth: 0.75,
            level_duration_ms: LEVEL_DURATION_MS,
            transition_ticks: LEVEL_TRANSITION_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpec {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub lives: u8,
    pub invulnerable_ticks: u32,
}

impl Default for PlayerSpec {
    fn default() -> Self {
        Self {
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            speed: PLAYER_SPEED,
            lives: PLAYER_LIVES,
            invulnerable_ticks: PLAYER_INVULNERABLE_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletSpec {
    pub radius: f32,
    pub speed: f32,
    pub fire_cooldown_ticks: u32,
    pub spread_drift: f32,
}

impl Default for BulletSpec {
    fn default() -> Self {
        Self {
            radius: BULLET_RADIUS,
            speed: BULLET_SPEED,
            fire_cooldown_ticks: FIRE_COOLDOWN_TICKS,
            spread_drift: SPREAD_SHOT_DRIFT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupSpec {
    pub spawn_interval_ms: f64,
    pub size: f32,
    pub fall_speed: f32,
    pub shield_ticks: u32,
    pub rapid_fire_ticks: u32,
    pub spread_shot_ticks: u32,
    pub slow_time_ticks: u32,
    pub slow_time_factor: f32,
}

impl Default for PowerupSpec {
    fn default() -> Self {
        Self {
            spawn_interval_ms: POWERUP_SPAWN_INTERVAL_MS,
            size: POWERUP_SIZE,
            fall_speed: POWERUP_FALL_SPEED,
            shield_ticks: SHIELD_TICKS,
            rapid_fire_ticks: RAPID_FIRE_TICKS,
            spread_shot_ticks: SPREAD_SHOT_TICKS,
            slow_time_ticks: SLOW_TIME_TICKS,
            slow_time_factor: SLOW_TIME_FACTOR,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub width: f32,
    pub height: f32,
    pub offscreen_margin: f32,
    pub obstacle_max_lifetime_ms: f64,
    pub tiers: Vec<TierSpec>,
    pub fragment_min: u32,
    pub fragment_max: u32,
    pub family_clear_bonus: u32,
    pub scatter: ScatterSpec,
    pub difficulty: DifficultySpec,
    pub player: PlayerSpec,
    pub bullet: BulletSpec,
    pub powerups: PowerupSpec,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            offscreen_margin: OFFSCREEN_MARGIN,
            obstacle_max_lifetime_ms: OBSTACLE_MAX_LIFETIME_MS,
            tiers: OBSTACLE_TIERS
                .iter()
                .map(|&(radius, score)| TierSpec { radius, score })
                .collect(),
            fragment_min: 2,
            fragment_max: 3,
            family_clear_bonus: FAMILY_CLEAR_BONUS,
            scatter: ScatterSpec::default(),
            difficulty: DifficultySpec::default(),
            player: PlayerSpec::default(),
            bullet: BulletSpec::default(),
            powerups: PowerupSpec::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a balance file
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize for export/debugging
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(TuningError::invalid("width/height", "viewport must be non-empty"));
        }
        if self.offscreen_margin < 0.0 {
            return Err(TuningError::invalid("offscreen_margin", "must be >= 0"));
        }
        if self.obstacle_max_lifetime_ms <= 0.0 {
            return Err(TuningError::invalid("obstacle_max_lifetime_ms", "must be > 0"));
        }
        if self.tiers.is_empty() {
            return Err(TuningError::invalid("tiers", "at least one tier required"));
        }
        if self.tiers.len() > u8::MAX as usize {
            return Err(TuningError::invalid("tiers", "too many tiers"));
        }
        if let Some(bad) = self.tiers.iter().position(|t| t.radius <= 0.0) {
            return Err(TuningError::invalid(
                "tiers",
                format!("tier {bad} has a non-positive radius"),
            ));
        }
        if self.fragment_min == 0 || self.fragment_min > self.fragment_max {
            return Err(TuningError::invalid(
                "fragment_min/fragment_max",
                format!("need 1 <= min <= max, got {}..={}", self.fragment_min, self.fragment_max),
            ));
        }
        if !(0.0..=1.0).contains(&self.scatter.slow_chance) {
            return Err(TuningError::invalid("scatter.slow_chance", "must be within [0, 1]"));
        }
        if self.scatter.slow_min > self.scatter.slow_max || self.scatter.fast_min > self.scatter.fast_max {
            return Err(TuningError::invalid("scatter", "band min exceeds max"));
        }
        let d = &self.difficulty;
        if d.ease_threshold_level == 0 {
            return Err(TuningError::invalid("difficulty.ease_threshold_level", "must be > 0"));
        }
        if d.min_spawn_interval_ms <= 0.0 || d.min_spawn_interval_ms > d.base_spawn_interval_ms {
            return Err(TuningError::invalid(
                "difficulty.min_spawn_interval_ms",
                "must be in (0, base_spawn_interval_ms]",
            ));
        }
        if d.base_speed_min > d.base_speed_max {
            return Err(TuningError::invalid("difficulty.base_speed_min", "exceeds base_speed_max"));
        }
        if d.level_duration_ms <= 0.0 {
            return Err(TuningError::invalid("difficulty.level_duration_ms", "must be > 0"));
        }
        if self.powerups.spawn_interval_ms <= 0.0 {
            return Err(TuningError::invalid("powerups.spawn_interval_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Index of the smallest (leaf) tier
    #[inline]
    pub fn leaf_level(&self) -> u8 {
        (self.tiers.len() - 1) as u8
    }

    /// Tier spec for a level, clamped to the leaf tier
    #[inline]
    pub fn tier(&self, level: u8) -> TierSpec {
        let idx = (level as usize).min(self.tiers.len() - 1);
        self.tiers[idx]
    }

    /// Largest obstacle radius (drives grid cell size and query padding)
    pub fn max_obstacle_radius(&self) -> f32 {
        self.tiers.iter().map(|t| t.radius).fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.leaf_level(), 2);
        assert_eq!(tuning.max_obstacle_radius(), 35.0);
        assert_eq!(tuning.tier(0).score, 20);
        assert_eq!(tuning.tier(9).radius, 12.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "width": 480, "bullet": { "speed": 12 } }"#).unwrap();
        assert_eq!(tuning.width, 480.0);
        assert_eq!(tuning.height, VIEWPORT_HEIGHT);
        assert_eq!(tuning.bullet.speed, 12.0);
        assert_eq!(tuning.bullet.radius, BULLET_RADIUS);
    }

    #[test]
    fn test_rejects_bad_fragment_range() {
        let err = Tuning::from_json(r#"{ "fragment_min": 4, "fragment_max": 3 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field, .. } if field == "fragment_min/fragment_max"));
    }

    #[test]
    fn test_rejects_empty_tiers() {
        let err = Tuning::from_json(r#"{ "tiers": [] }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "tiers", .. }));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse tuning JSON"));
    }

    #[test]
    fn test_json_roundtrip_keeps_tiers() {
        let json = Tuning::default().to_json().unwrap();
        let back = Tuning::from_json(&json).unwrap();
        assert_eq!(back.tiers, Tuning::default().tiers);
    }
}
