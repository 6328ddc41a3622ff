//! Player bullets
//!
//! Bullets are pooled like rocks; the fire cooldown lives here so the core
//! rate-limits shots even if the host forwards every key repeat.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Handle};
use super::pool::ObjectPool;
use crate::tuning::{BulletSpec, Tuning};

const PREWARM_BULLETS: usize = 24;

/// A bullet travelling up the screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    /// Center
    pub pos: Vec2,
    pub radius: f32,
    /// Sideways drift (SpreadShot outer bullets), pixels per base tick
    pub dx: f32,
    /// Vertical velocity (negative = up), pixels per base tick
    pub dy: f32,
    /// Shooter that fired it
    pub parent_id: u32,
}

impl Bullet {
    pub fn blank() -> Self {
        Self {
            pos: Vec2::ZERO,
            radius: 0.0,
            dx: 0.0,
            dy: 0.0,
            parent_id: 0,
        }
    }

    #[inline]
    pub fn advance(&mut self, scale: f32) {
        self.pos.x += self.dx * scale;
        self.pos.y += self.dy * scale;
    }

    /// Past the field margins (bullets may travel above the viewport to
    /// reach rocks still spawning there)
    pub fn is_out_of_bounds(&self, tuning: &Tuning) -> bool {
        let m = tuning.offscreen_margin;
        self.pos.y + self.radius < -m
            || self.pos.y - self.radius > tuning.height + m
            || self.pos.x + self.radius < -m
            || self.pos.x - self.radius > tuning.width + m
    }
}

/// How a shot should be fired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireMode {
    pub rapid: bool,
    pub spread: bool,
}

/// Live bullets, their pool and the fire cooldown
#[derive(Debug, Clone)]
pub struct BulletField {
    pub live: Arena<Bullet>,
    pool: ObjectPool<Bullet>,
    cooldown_ticks: u32,
}

impl Default for BulletField {
    fn default() -> Self {
        Self::new()
    }
}

impl BulletField {
    pub fn new() -> Self {
        Self {
            live: Arena::new(),
            pool: ObjectPool::with_capacity(Bullet::blank, PREWARM_BULLETS),
            cooldown_ticks: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    #[inline]
    pub fn cooldown_ticks(&self) -> u32 {
        self.cooldown_ticks
    }

    /// Spawn one bullet with every field overwritten
    pub fn spawn(&mut self, pos: Vec2, dx: f32, spec: &BulletSpec, shooter: u32) -> Handle {
        let mut bullet = self.pool.acquire();
        bullet.pos = pos;
        bullet.radius = spec.radius;
        bullet.dx = dx;
        bullet.dy = -spec.speed;
        bullet.parent_id = shooter;
        self.live.insert(bullet)
    }

    /// Fire from `muzzle` unless cooling down. Returns the number of bullets spawned.
    pub fn try_fire(&mut self, muzzle: Vec2, mode: FireMode, spec: &BulletSpec, shooter: u32) -> u32 {
        if self.cooldown_ticks > 0 {
            return 0;
        }
        self.spawn(muzzle, 0.0, spec, shooter);
        let mut fired = 1;
        if mode.spread {
            self.spawn(muzzle, -spec.spread_drift, spec, shooter);
            self.spawn(muzzle, spec.spread_drift, spec, shooter);
            fired += 2;
        }
        self.cooldown_ticks = if mode.rapid {
            (spec.fire_cooldown_ticks / 2).max(1)
        } else {
            spec.fire_cooldown_ticks
        };
        fired
    }

    /// Count the cooldown down one tick
    pub fn tick_cooldown(&mut self) {
        self.cooldown_ticks = self.cooldown_ticks.saturating_sub(1);
    }

    pub fn advance_all(&mut self, scale: f32) {
        for (_, bullet) in self.live.iter_mut() {
            bullet.advance(scale);
        }
    }

    /// Retire a bullet into the pool
    pub fn remove(&mut self, handle: Handle) -> bool {
        match self.live.remove(handle) {
            Some(bullet) => {
                self.pool.release(bullet);
                true
            }
            None => false,
        }
    }

    /// Retire bullets that left the field. Returns how many.
    pub fn expire_offscreen(&mut self, tuning: &Tuning) -> usize {
        let gone: Vec<Handle> = self
            .live
            .iter()
            .filter(|(_, b)| b.is_out_of_bounds(tuning))
            .map(|(h, _)| h)
            .collect();
        gone.into_iter().filter(|&h| self.remove(h)).count()
    }

    pub fn reset(&mut self) {
        self.live.drain();
        self.pool.clear();
        self.cooldown_ticks = 0;
    }
}
