//! Read-only view of the simulation handed to renderers once per frame

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::powerup::PowerupKind;
use crate::sim::state::{GamePhase, SimulationContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub id: u32,
    pub center: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub level: u8,
    /// Unit outline, scaled by `radius` when drawn
    pub shape: Vec<Vec2>,
    /// Pixels per base tick, SlowTime included
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    pub center: Vec2,
    pub radius: f32,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerupView {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub kind: PowerupKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub size: Vec2,
    pub invulnerable: bool,
    pub shielded: bool,
    /// Simulation tick, for blink effects
    pub tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffView {
    pub kind: PowerupKind,
    pub remaining_ticks: u32,
}

/// Everything a renderer or HUD may read for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub width: f32,
    pub height: f32,
    pub obstacles: Vec<ObstacleView>,
    pub bullets: Vec<BulletView>,
    pub powerups: Vec<PowerupView>,
    pub player: PlayerView,
    pub buffs: Vec<BuffView>,
    pub score: u64,
    pub lives: u8,
    pub level: u32,
    pub phase: GamePhase,
    /// Scheduler leftover, 0..1 of a step
    pub alpha: f32,
}

impl RenderSnapshot {
    pub fn capture(ctx: &SimulationContext, alpha: f64) -> Self {
        let time_scale = ctx.time_scale();
        let obstacles = ctx
            .obstacles
            .live
            .values()
            .map(|o| ObstacleView {
                id: o.id,
                center: o.center(),
                radius: o.radius,
                rotation: o.rotation,
                level: o.level,
                shape: o.shape.clone(),
                velocity: Vec2::new(o.drift.x, o.speed + o.drift.y) * time_scale,
            })
            .collect();
        let bullets = ctx
            .bullets
            .live
            .values()
            .map(|b| BulletView {
                center: b.pos,
                radius: b.radius,
                velocity: Vec2::new(b.dx, b.dy),
            })
            .collect();
        let powerups = ctx
            .powerups
            .items
            .iter()
            .map(|p| PowerupView {
                id: p.id,
                pos: p.pos,
                size: p.size,
                kind: p.kind,
            })
            .collect();
        let buffs = ctx
            .buffs
            .iter_active()
            .map(|(kind, remaining_ticks)| BuffView {
                kind,
                remaining_ticks,
            })
            .collect();

        Self {
            width: ctx.tuning.width,
            height: ctx.tuning.height,
            obstacles,
            bullets,
            powerups,
            player: PlayerView {
                pos: ctx.player.pos,
                size: ctx.player.size(),
                invulnerable: ctx.player.is_invulnerable(),
                shielded: ctx.buffs.is_active(PowerupKind::Shield),
                tick: ctx.time_ticks,
            },
            buffs,
            score: ctx.score,
            lives: ctx.player.lives,
            level: ctx.level,
            phase: ctx.phase,
            alpha: alpha.clamp(0.0, 1.0) as f32,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
