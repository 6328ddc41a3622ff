//! Rock Drift - a falling-rock arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, spatial grid, fragmentation, collisions)
//! - `scheduler`: Fixed-timestep accumulator loop decoupled from render cadence
//! - `renderer`: Read-only snapshot and per-entity draw strategies
//! - `tuning`: Data-driven game balance
//! - `settings`: Platform selection (desktop/mobile time step)

pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use scheduler::{FixedStepScheduler, FrameHost, FrameOutcome};
pub use settings::{Platform, Settings};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference tick length; entity velocities are expressed per base tick
    pub const BASE_STEP_MS: f64 = 1000.0 / 60.0;
    /// Fixed simulation timestep on desktop (60 Hz)
    pub const DESKTOP_TIME_STEP_MS: f64 = 1000.0 / 60.0;
    /// Fixed simulation timestep on mobile (30 Hz)
    pub const MOBILE_TIME_STEP_MS: f64 = 1000.0 / 30.0;
    /// Maximum simulation updates per render callback (spiral of death guard)
    pub const MAX_UPDATES: u32 = 5;
    /// Frame delta is capped at this many time steps
    pub const MAX_DELTA_STEPS: f64 = 5.0;

    /// Default play field
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;
    /// Entities this far past the viewport are reclaimed
    pub const OFFSCREEN_MARGIN: f32 = 100.0;

    /// Obstacle size tiers: (radius, score), level 0 = largest
    pub const OBSTACLE_TIERS: [(f32, u32); 3] = [(35.0, 20), (22.0, 50), (12.0, 100)];
    /// Safety net against obstacles that never leave the field
    pub const OBSTACLE_MAX_LIFETIME_MS: f64 = 30_000.0;
    /// Awarded once when the last leaf of a family is shot
    pub const FAMILY_CLEAR_BONUS: u32 = 250;
    /// Polygon vertex count range for generated rock outlines
    pub const SHAPE_MIN_POINTS: usize = 7;
    pub const SHAPE_MAX_POINTS: usize = 11;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 40.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 6.0;
    pub const PLAYER_LIVES: u8 = 3;
    /// Grace period after losing a life
    pub const PLAYER_INVULNERABLE_TICKS: u32 = 90;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 4.0;
    /// Upward speed, pixels per base tick
    pub const BULLET_SPEED: f32 = 10.0;
    pub const FIRE_COOLDOWN_TICKS: u32 = 9;
    /// Sideways drift of the outer bullets while SpreadShot is active
    pub const SPREAD_SHOT_DRIFT: f32 = 1.5;
    /// Shooter id of the local player
    pub const PLAYER_SHOOTER_ID: u32 = 0;

    /// Powerup defaults
    pub const POWERUP_SPAWN_INTERVAL_MS: f64 = 10_000.0;
    pub const POWERUP_SIZE: f32 = 24.0;
    pub const POWERUP_FALL_SPEED: f32 = 2.0;
    pub const SHIELD_TICKS: u32 = 300;
    pub const RAPID_FIRE_TICKS: u32 = 360;
    pub const SPREAD_SHOT_TICKS: u32 = 360;
    pub const SLOW_TIME_TICKS: u32 = 300;
    pub const SLOW_TIME_FACTOR: f32 = 0.5;

    /// Level progression
    pub const LEVEL_DURATION_MS: f64 = 30_000.0;
    pub const LEVEL_TRANSITION_TICKS: u32 = 120;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector at the given angle
#[inline]
pub fn unit_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Rotate a point around the origin
#[inline]
pub fn rotate(p: Vec2, theta: f32) -> Vec2 {
    Vec2::from_angle(theta).rotate(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        // Odd multiples of pi land on either end depending on rounding
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = rotate(Vec2::X, PI / 2.0);
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }
}
