//! Powerups: falling pickups and time-boxed player buffs
//!
//! Each buff kind owns an independent countdown in ticks. Collecting a kind
//! that is already active refreshes that kind only.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::{PowerupSpec, Tuning};

/// Buff types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Rock collisions pass through the ship
    Shield,
    /// Fire cooldown halved
    RapidFire,
    /// Three bullets per shot
    SpreadShot,
    /// Rocks move at half speed
    SlowTime,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 4] = [
        PowerupKind::Shield,
        PowerupKind::RapidFire,
        PowerupKind::SpreadShot,
        PowerupKind::SlowTime,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            PowerupKind::Shield => 0,
            PowerupKind::RapidFire => 1,
            PowerupKind::SpreadShot => 2,
            PowerupKind::SlowTime => 3,
        }
    }

    /// Buff length in ticks
    pub fn duration_ticks(self, spec: &PowerupSpec) -> u32 {
        match self {
            PowerupKind::Shield => spec.shield_ticks,
            PowerupKind::RapidFire => spec.rapid_fire_ticks,
            PowerupKind::SpreadShot => spec.spread_shot_ticks,
            PowerupKind::SlowTime => spec.slow_time_ticks,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A pickup falling through the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldPowerup {
    pub id: u32,
    /// Top-left
    pub pos: Vec2,
    pub size: f32,
    pub kind: PowerupKind,
    /// Fall speed, pixels per base tick
    pub dy: f32,
}

impl WorldPowerup {
    /// Axis-aligned overlap with a rectangle at `pos` of `size`
    pub fn overlaps_rect(&self, pos: Vec2, size: Vec2) -> bool {
        self.pos.x < pos.x + size.x
            && self.pos.x + self.size > pos.x
            && self.pos.y < pos.y + size.y
            && self.pos.y + self.size > pos.y
    }
}

/// One buff slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffTimer {
    pub active: bool,
    /// Remaining ticks
    pub timer: u32,
}

/// All buffs currently applied to the player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivePowerups {
    slots: [BuffTimer; 4],
}

impl ActivePowerups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or refresh) one buff
    pub fn activate(&mut self, kind: PowerupKind, ticks: u32) {
        if ticks == 0 {
            return;
        }
        self.slots[kind.index()] = BuffTimer {
            active: true,
            timer: ticks,
        };
    }

    #[inline]
    pub fn is_active(&self, kind: PowerupKind) -> bool {
        self.slots[kind.index()].active
    }

    #[inline]
    pub fn get(&self, kind: PowerupKind) -> BuffTimer {
        self.slots[kind.index()]
    }

    /// Active buffs with their remaining ticks
    pub fn iter_active(&self) -> impl Iterator<Item = (PowerupKind, u32)> + '_ {
        PowerupKind::ALL
            .into_iter()
            .filter(|k| self.is_active(*k))
            .map(|k| (k, self.slots[k.index()].timer))
    }

    /// Count every active buff down one tick; returns the kinds that just ran out
    pub fn tick(&mut self) -> Vec<PowerupKind> {
        let mut expired = Vec::new();
        for kind in PowerupKind::ALL {
            let slot = &mut self.slots[kind.index()];
            if !slot.active {
                continue;
            }
            slot.timer = slot.timer.saturating_sub(1);
            if slot.timer == 0 {
                slot.active = false;
                expired.push(kind);
            }
        }
        expired
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

/// Pickups currently in the field
#[derive(Debug, Clone, Default)]
pub struct PowerupField {
    pub items: Vec<WorldPowerup>,
    next_id: u32,
}

impl PowerupField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a random pickup above the viewport
    pub fn spawn(&mut self, rng: &mut impl Rng, tuning: &Tuning) -> PowerupKind {
        let spec = &tuning.powerups;
        let kind = PowerupKind::random(rng);
        let x = rng.random_range(0.0..=(tuning.width - spec.size).max(0.0));
        self.next_id += 1;
        self.items.push(WorldPowerup {
            id: self.next_id,
            pos: Vec2::new(x, -spec.size),
            size: spec.size,
            kind,
            dy: spec.fall_speed,
        });
        kind
    }

    pub fn advance_all(&mut self, scale: f32) {
        for item in &mut self.items {
            item.pos.y += item.dy * scale;
        }
    }

    /// Remove pickups that fell past the bottom uncollected
    pub fn expire_fallen(&mut self, tuning: &Tuning) -> Vec<PowerupKind> {
        let mut fallen = Vec::new();
        self.items.retain(|p| {
            let gone = p.pos.y > tuning.height;
            if gone {
                fallen.push(p.kind);
            }
            !gone
        });
        fallen
    }

    /// Remove pickups touching the player rect and return their kinds
    pub fn collect(&mut self, player_pos: Vec2, player_size: Vec2) -> Vec<PowerupKind> {
        let mut picked = Vec::new();
        self.items.retain(|p| {
            let hit = p.overlaps_rect(player_pos, player_size);
            if hit {
                picked.push(p.kind);
            }
            !hit
        });
        picked
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_timer_deactivates_exactly_at_zero() {
        let mut buffs = ActivePowerups::new();
        buffs.activate(PowerupKind::Shield, 3);
        assert!(buffs.tick().is_empty());
        assert!(buffs.tick().is_empty());
        assert!(buffs.is_active(PowerupKind::Shield));
        assert_eq!(buffs.get(PowerupKind::Shield).timer, 1);
        assert_eq!(buffs.tick(), vec![PowerupKind::Shield]);
        assert!(!buffs.is_active(PowerupKind::Shield));
        // Inactive slots stay put
        assert!(buffs.tick().is_empty());
        assert_eq!(buffs.get(PowerupKind::Shield).timer, 0);
    }

    #[test]
    fn test_buffs_are_independent() {
        let mut buffs = ActivePowerups::new();
        buffs.activate(PowerupKind::Shield, 10);
        buffs.tick();
        buffs.activate(PowerupKind::RapidFire, 5);
        assert_eq!(buffs.get(PowerupKind::Shield).timer, 9);
        assert_eq!(buffs.get(PowerupKind::RapidFire).timer, 5);
        // Refresh only touches its own kind
        buffs.activate(PowerupKind::RapidFire, 20);
        assert_eq!(buffs.get(PowerupKind::Shield).timer, 9);
        let active: Vec<_> = buffs.iter_active().collect();
        assert_eq!(active, vec![(PowerupKind::Shield, 9), (PowerupKind::RapidFire, 20)]);
    }

    #[test]
    fn test_pickup_falls_and_expires() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut field = PowerupField::new();
        field.spawn(&mut rng, &tuning);
        assert!(field.items[0].pos.y < 0.0);
        let ticks = ((tuning.height + tuning.powerups.size) / tuning.powerups.fall_speed) as usize + 2;
        for _ in 0..ticks {
            field.advance_all(1.0);
        }
        assert_eq!(field.expire_fallen(&tuning).len(), 1);
        assert!(field.items.is_empty());
    }

    #[test]
    fn test_collect_on_overlap() {
        let mut field = PowerupField::new();
        field.items.push(WorldPowerup {
            id: 1,
            pos: Vec2::new(100.0, 100.0),
            size: 24.0,
            kind: PowerupKind::SlowTime,
            dy: 2.0,
        });
        assert!(field.collect(Vec2::new(200.0, 200.0), Vec2::splat(40.0)).is_empty());
        assert_eq!(
            field.collect(Vec2::new(110.0, 110.0), Vec2::splat(40.0)),
            vec![PowerupKind::SlowTime]
        );
        assert!(field.items.is_empty());
    }
}
