//! Obstacle (rock) lifecycle
//!
//! Lifecycle: `Spawning -> Live -> {DestroyedByBullet, ExpiredOutOfBounds, ExpiredByAge}`.
//! Rocks shot above the leaf tier split into 2-3 smaller rocks of the next
//! tier. Every rock belongs to the family of the root it descended from;
//! shooting the last leaf of a family pays a one-time bonus, unless any
//! member left the field unshot.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Handle};
use super::pool::ObjectPool;
use crate::consts::{SHAPE_MAX_POINTS, SHAPE_MIN_POINTS};
use crate::tuning::{ScatterSpec, Tuning};
use crate::unit_from_angle;

/// Spin range for new rocks, radians per base tick
const MAX_ROTATION_SPEED: f32 = 0.05;
/// Rocks kept warm in the pool at startup
const PREWARM_OBSTACLES: usize = 32;

/// Terminal state a rock reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleFate {
    DestroyedByBullet,
    ExpiredOutOfBounds,
    ExpiredByAge,
}

/// A falling rock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Root ancestor id (own id for a root)
    pub parent_id: u32,
    /// Top-left of the bounding box
    pub pos: Vec2,
    pub radius: f32,
    /// Outline offsets on the unit circle, scaled by radius and rotated when drawn
    pub shape: Vec<Vec2>,
    /// Scatter drift, pixels per base tick
    pub drift: Vec2,
    /// Forward (downward) speed, pixels per base tick
    pub speed: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// Size tier, 0 = largest
    pub level: u8,
    pub score_value: u32,
    /// Simulation clock at spawn
    pub created_at_ms: f64,
    /// Claimed by a bullet during the current tick
    #[serde(skip)]
    pub destroyed: bool,
}

impl Obstacle {
    /// Pool factory
    pub fn blank() -> Self {
        Self {
            id: 0,
            parent_id: 0,
            pos: Vec2::ZERO,
            radius: 0.0,
            shape: Vec::with_capacity(SHAPE_MAX_POINTS),
            drift: Vec2::ZERO,
            speed: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            level: 0,
            score_value: 0,
            created_at_ms: 0.0,
            destroyed: false,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.radius)
    }

    /// Move the bounding box so its center lands on `center`
    #[inline]
    pub fn set_center(&mut self, center: Vec2) {
        self.pos = center - Vec2::splat(self.radius);
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id == self.id
    }

    /// Integrate one tick. `scale` converts base-tick velocities to this
    /// tick's length, `time_scale` applies SlowTime.
    pub fn advance(&mut self, scale: f32, time_scale: f32) {
        let k = scale * time_scale;
        self.pos.x += self.drift.x * k;
        self.pos.y += (self.speed + self.drift.y) * k;
        self.rotation = crate::normalize_angle(self.rotation + self.rotation_speed * k);
    }

    /// Expiry check: off-field past the margin (no top edge) or too old
    pub fn expiry(&self, now_ms: f64, tuning: &Tuning) -> Option<ObstacleFate> {
        let margin = tuning.offscreen_margin;
        let diameter = self.radius * 2.0;
        let past_bottom = self.pos.y > tuning.height + margin;
        let past_left = self.pos.x + diameter < -margin;
        let past_right = self.pos.x > tuning.width + margin;
        if past_bottom || past_left || past_right {
            return Some(ObstacleFate::ExpiredOutOfBounds);
        }
        if now_ms - self.created_at_ms > tuning.obstacle_max_lifetime_ms {
            return Some(ObstacleFate::ExpiredByAge);
        }
        None
    }
}

/// Fill `shape` with a jagged unit polygon, reusing its allocation
pub fn generate_shape(rng: &mut impl Rng, shape: &mut Vec<Vec2>) {
    shape.clear();
    let points = rng.random_range(SHAPE_MIN_POINTS..=SHAPE_MAX_POINTS);
    let step = TAU / points as f32;
    for i in 0..points {
        let jitter: f32 = rng.random_range(-0.3..=0.3);
        let r: f32 = rng.random_range(0.75..=1.0);
        let theta = (i as f32 + jitter) * step;
        shape.push(unit_from_angle(theta) * r);
    }
}

/// Bimodal scatter speed: mostly slow, occasionally fast
pub fn scatter_speed(rng: &mut impl Rng, spec: &ScatterSpec) -> f32 {
    if rng.random_bool(spec.slow_chance) {
        rng.random_range(spec.slow_min..=spec.slow_max)
    } else {
        rng.random_range(spec.fast_min..=spec.fast_max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FamilyEntry {
    /// Live leaf-tier members (only leaf spawns increment this)
    live_leaves: u32,
    /// Live members above the leaf tier that have not split yet
    open_splits: u32,
}

/// Per-family bookkeeping for the completion bonus
#[derive(Debug, Clone, Default)]
pub struct FamilyTracker {
    families: HashMap<u32, FamilyEntry>,
}

impl FamilyEntry {
    fn add(&mut self, is_leaf: bool) {
        if is_leaf {
            self.live_leaves += 1;
        } else {
            self.open_splits += 1;
        }
    }

    fn is_settled(&self) -> bool {
        self.live_leaves == 0 && self.open_splits == 0
    }
}

impl FamilyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Families still tracked
    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn contains(&self, family: u32) -> bool {
        self.families.contains_key(&family)
    }

    /// Live leaves counted for a family
    pub fn live_leaves(&self, family: u32) -> Option<u32> {
        self.families.get(&family).map(|f| f.live_leaves)
    }

    pub fn register_root(&mut self, family: u32, is_leaf: bool) {
        let mut entry = FamilyEntry::default();
        entry.add(is_leaf);
        self.families.insert(family, entry);
    }

    /// A fragment joined the family. Families whose bonus already fired stay closed.
    pub fn fragment_spawned(&mut self, family: u32, is_leaf: bool) {
        if let Some(entry) = self.families.get_mut(&family) {
            entry.add(is_leaf);
        }
    }

    /// A non-leaf member was shot and split
    pub fn member_split(&mut self, family: u32) {
        if let Some(entry) = self.families.get_mut(&family) {
            entry.open_splits = entry.open_splits.saturating_sub(1);
        }
    }

    /// A leaf was shot. Returns true exactly once per family: when the last
    /// live member goes down.
    pub fn leaf_destroyed(&mut self, family: u32) -> bool {
        let Some(entry) = self.families.get_mut(&family) else {
            return false;
        };
        entry.live_leaves = entry.live_leaves.saturating_sub(1);
        if entry.is_settled() {
            self.families.remove(&family);
            return true;
        }
        false
    }

    /// A member left the field without being shot. The family can no
    /// longer be cleared, so it is forfeited and closed.
    pub fn member_expired(&mut self, family: u32) {
        if self.families.remove(&family).is_some() {
            log::debug!("Family {} forfeited its bonus", family);
        }
    }

    pub fn clear(&mut self) {
        self.families.clear();
    }
}

/// Change record for a rock shot down this tick
#[derive(Debug, Clone, PartialEq)]
pub struct Destruction {
    pub id: u32,
    pub family: u32,
    pub level: u8,
    pub center: Vec2,
    pub score: u32,
    /// Handles of the fragments spawned in its place
    pub fragments: Vec<Handle>,
    /// Completion bonus paid for the family, if this was its last leaf
    pub family_bonus: Option<u32>,
}

/// Change record for a rock reclaimed without being shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expiry {
    pub id: u32,
    pub family: u32,
    pub fate: ObstacleFate,
}

/// Live rocks, their recycling pool and family bookkeeping
#[derive(Debug, Clone)]
pub struct ObstacleField {
    pub live: Arena<Obstacle>,
    pool: ObjectPool<Obstacle>,
    pub families: FamilyTracker,
    next_id: u32,
}

impl Default for ObstacleField {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstacleField {
    pub fn new() -> Self {
        Self {
            live: Arena::new(),
            pool: ObjectPool::with_capacity(Obstacle::blank, PREWARM_OBSTACLES),
            families: FamilyTracker::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn pool_size(&self) -> usize {
        self.pool.size()
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
    pub fn get(&self, handle: Handle) -> Option<&Obstacle> {
        self.live.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Obstacle> {
        self.live.get_mut(handle)
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Acquire a rock from the pool and overwrite every field
    fn build(
        &mut self,
        rng: &mut impl Rng,
        tuning: &Tuning,
        level: u8,
        parent: Option<u32>,
        now_ms: f64,
    ) -> Obstacle {
        let id = self.allocate_id();
        let tier = tuning.tier(level);
        let mut obstacle = self.pool.acquire();
        obstacle.id = id;
        obstacle.parent_id = parent.unwrap_or(id);
        obstacle.radius = tier.radius;
        obstacle.level = level;
        obstacle.score_value = tier.score;
        obstacle.drift = Vec2::ZERO;
        obstacle.speed = 0.0;
        obstacle.rotation = rng.random_range(0.0..TAU);
        obstacle.rotation_speed = rng.random_range(-MAX_ROTATION_SPEED..=MAX_ROTATION_SPEED);
        obstacle.created_at_ms = now_ms;
        obstacle.destroyed = false;
        generate_shape(rng, &mut obstacle.shape);
        obstacle
    }

    /// Spawn a level-0 rock above the viewport
    pub fn spawn_root(
        &mut self,
        rng: &mut impl Rng,
        tuning: &Tuning,
        speed_range: (f32, f32),
        now_ms: f64,
    ) -> Handle {
        let mut obstacle = self.build(rng, tuning, 0, None, now_ms);
        let diameter = obstacle.radius * 2.0;
        let x = rng.random_range(0.0..=(tuning.width - diameter).max(0.0));
        obstacle.pos = Vec2::new(x, -diameter);
        obstacle.speed = rng.random_range(speed_range.0..=speed_range.1);
        self.families.register_root(obstacle.id, obstacle.level >= tuning.leaf_level());
        log::debug!("Spawned root rock {} at x={:.0}", obstacle.id, x);
        self.live.insert(obstacle)
    }

    /// Place a rock directly (scripted spawns and tests)
    pub fn spawn_root_at(
        &mut self,
        rng: &mut impl Rng,
        tuning: &Tuning,
        level: u8,
        pos: Vec2,
        speed: f32,
        now_ms: f64,
    ) -> Handle {
        let level = level.min(tuning.leaf_level());
        let mut obstacle = self.build(rng, tuning, level, None, now_ms);
        obstacle.pos = pos;
        obstacle.speed = speed;
        self.families.register_root(obstacle.id, level >= tuning.leaf_level());
        self.live.insert(obstacle)
    }

    /// Shoot a rock: retire it, split it or settle its family.
    ///
    /// Returns `None` for a stale handle.
    pub fn destroy_by_bullet(
        &mut self,
        handle: Handle,
        rng: &mut impl Rng,
        tuning: &Tuning,
        now_ms: f64,
    ) -> Option<Destruction> {
        let mut obstacle = self.live.remove(handle)?;
        let center = obstacle.center();
        let leaf = tuning.leaf_level();
        let mut record = Destruction {
            id: obstacle.id,
            family: obstacle.parent_id,
            level: obstacle.level,
            center,
            score: obstacle.score_value,
            fragments: Vec::new(),
            family_bonus: None,
        };

        if obstacle.level < leaf {
            let child_level = obstacle.level + 1;
            let child_is_leaf = child_level >= leaf;
            let count = rng.random_range(tuning.fragment_min..=tuning.fragment_max);
            for _ in 0..count {
                let mut child = self.build(rng, tuning, child_level, Some(obstacle.parent_id), now_ms);
                child.set_center(center);
                let angle = rng.random_range(0.0..TAU);
                child.drift = unit_from_angle(angle) * scatter_speed(rng, &tuning.scatter);
                child.speed = obstacle.speed;
                self.families.fragment_spawned(child.parent_id, child_is_leaf);
                record.fragments.push(self.live.insert(child));
            }
            self.families.member_split(obstacle.parent_id);
            log::debug!(
                "Rock {} (level {}) split into {} fragments",
                obstacle.id,
                obstacle.level,
                count
            );
        } else if self.families.leaf_destroyed(obstacle.parent_id) {
            record.family_bonus = Some(tuning.family_clear_bonus);
            log::info!(
                "Family {} cleared, bonus {} at ({:.0}, {:.0})",
                obstacle.parent_id,
                tuning.family_clear_bonus,
                center.x,
                center.y
            );
        }

        obstacle.destroyed = false;
        self.pool.release(obstacle);
        Some(record)
    }

    /// Reclaim a rock that left the field or aged out
    pub fn expire(&mut self, handle: Handle, fate: ObstacleFate) -> Option<Expiry> {
        let mut obstacle = self.live.remove(handle)?;
        self.families.member_expired(obstacle.parent_id);
        let record = Expiry {
            id: obstacle.id,
            family: obstacle.parent_id,
            fate,
        };
        obstacle.destroyed = false;
        self.pool.release(obstacle);
        Some(record)
    }

    /// Move every rock one tick
    pub fn advance_all(&mut self, scale: f32, time_scale: f32) {
        for (_, obstacle) in self.live.iter_mut() {
            obstacle.advance(scale, time_scale);
        }
    }

    /// Reclaim every rock past the margins or lifetime
    pub fn expire_stale(&mut self, now_ms: f64, tuning: &Tuning) -> Vec<Expiry> {
        let stale: Vec<(Handle, ObstacleFate)> = self
            .live
            .iter()
            .filter_map(|(h, o)| o.expiry(now_ms, tuning).map(|fate| (h, fate)))
            .collect();
        stale
            .into_iter()
            .filter_map(|(h, fate)| self.expire(h, fate))
            .collect()
    }

    /// Clear per-tick destroyed marks
    pub fn clear_marks(&mut self) {
        for (_, obstacle) in self.live.iter_mut() {
            obstacle.destroyed = false;
        }
    }

    /// Full restart: drop live rocks, the pool and all families
    pub fn reset(&mut self) {
        self.live.drain();
        self.pool.clear();
        self.families.clear();
    }
}
