//! The player's ship

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::{PlayerSpec, Tuning};

/// The player's ship (axis-aligned box)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Keyboard speed, pixels per base tick
    pub speed: f32,
    /// Keyboard velocity, pixels per base tick
    pub vel: Vec2,
    /// Pointer/touch target (top-left); bypasses velocity integration
    pub override_pos: Option<Vec2>,
    pub lives: u8,
    /// Grace ticks left after a hit
    pub invulnerable_ticks: u32,
}

impl Player {
    /// Ship parked at the bottom center of the field
    pub fn new(spec: &PlayerSpec, tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(
                (tuning.width - spec.width) / 2.0,
                tuning.height - spec.height * 2.0,
            ),
            width: spec.width,
            height: spec.height,
            speed: spec.speed,
            vel: Vec2::ZERO,
            override_pos: None,
            lives: spec.lives,
            invulnerable_ticks: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size() * 0.5
    }

    /// Where bullets leave the ship (top middle)
    #[inline]
    pub fn muzzle(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.width * 0.5, self.pos.y)
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Latch this tick's controls. `pointer` is the desired ship center.
    pub fn apply_input(&mut self, move_dir: Vec2, pointer: Option<Vec2>) {
        self.vel = move_dir.normalize_or_zero() * self.speed;
        if let Some(p) = pointer {
            self.override_pos = Some(p - self.size() * 0.5);
        }
    }

    /// Move one tick and keep the ship inside the viewport
    pub fn advance(&mut self, scale: f32, tuning: &Tuning) {
        match self.override_pos.take() {
            Some(target) => self.pos = target,
            None => self.pos += self.vel * scale,
        }
        let max = Vec2::new(tuning.width - self.width, tuning.height - self.height).max(Vec2::ZERO);
        self.pos = self.pos.clamp(Vec2::ZERO, max);
    }

    /// Take a hit. Returns false when the ship is still in its grace period.
    pub fn take_hit(&mut self, grace_ticks: u32) -> bool {
        if self.is_invulnerable() || !self.is_alive() {
            return false;
        }
        self.lives -= 1;
        self.invulnerable_ticks = grace_ticks;
        true
    }

    pub fn tick_invulnerability(&mut self) {
        self.invulnerable_ticks = self.invulnerable_ticks.saturating_sub(1);
    }
}
