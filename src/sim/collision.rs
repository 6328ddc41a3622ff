//! Collision detection and response
//!
//! Player vs rocks is a linear scan (one ship). Bullets vs rocks goes through
//! the spatial grid: rebuild, query each bullet padded by the largest rock
//! radius, confirm with an exact circle test.

use glam::Vec2;

use super::arena::Handle;
use super::events::GameEvent;
use super::powerup::PowerupKind;
use super::state::SimulationContext;

/// What the collision pass did this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub player_hit: bool,
    pub obstacles_destroyed: u32,
    pub powerups_collected: u32,
}

/// Circle vs axis-aligned rectangle (clamp the center into the rect)
#[inline]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect_pos: Vec2, rect_size: Vec2) -> bool {
    let closest = center.clamp(rect_pos, rect_pos + rect_size);
    center.distance_squared(closest) < radius * radius
}

#[inline]
pub fn circle_circle_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Run every collision check for one tick
pub fn check_collisions(ctx: &mut SimulationContext) -> CollisionReport {
    let player_hit = check_player_collision(ctx);
    let obstacles_destroyed = check_bullet_collisions(ctx);
    let powerups_collected = collect_powerups(ctx);
    CollisionReport {
        player_hit,
        obstacles_destroyed,
        powerups_collected,
    }
}

/// Ship vs rocks. Returns true if a life was lost.
pub fn check_player_collision(ctx: &mut SimulationContext) -> bool {
    if ctx.obstacles.is_empty() {
        return false;
    }
    // Shield passes through rocks entirely
    if ctx.buffs.is_active(PowerupKind::Shield) {
        return false;
    }
    if ctx.player.is_invulnerable() || !ctx.player.is_alive() {
        return false;
    }

    let pos = ctx.player.pos;
    let size = ctx.player.size();
    let touching = ctx
        .obstacles
        .live
        .values()
        .any(|o| !o.destroyed && circle_rect_overlap(o.center(), o.radius, pos, size));
    if !touching {
        return false;
    }

    if !ctx.player.take_hit(ctx.tuning.player.invulnerable_ticks) {
        return false;
    }
    let lives = ctx.player.lives;
    log::info!("Player hit, {} lives left", lives);
    ctx.emit(GameEvent::PlayerHit { lives });
    if lives == 0 {
        ctx.game_over();
    }
    true
}

/// Bullets vs rocks. Returns the number of rocks shot down.
pub fn check_bullet_collisions(ctx: &mut SimulationContext) -> u32 {
    if ctx.obstacles.is_empty() || ctx.bullets.is_empty() {
        return 0;
    }

    ctx.grid.clear();
    for (handle, obstacle) in ctx.obstacles.live.iter() {
        if !obstacle.destroyed {
            ctx.grid.insert(handle, obstacle.center());
        }
    }

    let pad = ctx.tuning.max_obstacle_radius();
    let mut candidates = Vec::new();
    let mut hits: Vec<(Handle, Handle)> = Vec::new();

    // Detection: each bullet claims at most one rock
    for (bullet_handle, bullet) in ctx.bullets.live.iter().rev() {
        candidates.clear();
        ctx.grid
            .query_near(bullet.pos.x, bullet.pos.y, bullet.radius + pad, &mut candidates);
        for &rock_handle in &candidates {
            let Some(rock) = ctx.obstacles.get_mut(rock_handle) else {
                continue;
            };
            if rock.destroyed {
                continue;
            }
            if circle_circle_overlap(bullet.pos, bullet.radius, rock.center(), rock.radius) {
                rock.destroyed = true;
                hits.push((bullet_handle, rock_handle));
                break;
            }
        }
    }

    // Resolution: retire bullets, fragment rocks, pay out
    let mut destroyed = 0;
    for (bullet_handle, rock_handle) in hits {
        ctx.bullets.remove(bullet_handle);
        let now = ctx.clock_ms;
        let record = ctx
            .obstacles
            .destroy_by_bullet(rock_handle, &mut ctx.rng, &ctx.tuning, now);
        let Some(record) = record else {
            continue;
        };
        destroyed += 1;
        ctx.add_score(record.score);
        ctx.emit(GameEvent::ObstacleDestroyed {
            id: record.id,
            level: record.level,
            center: record.center,
            fragments: record.fragments.len() as u32,
            score: record.score,
        });
        if let Some(bonus) = record.family_bonus {
            ctx.add_score(bonus);
            ctx.emit(GameEvent::FamilyCleared {
                family: record.family,
                center: record.center,
                bonus,
            });
        }
    }
    destroyed
}

/// Ship vs falling pickups. Returns how many were collected.
pub fn collect_powerups(ctx: &mut SimulationContext) -> u32 {
    if ctx.powerups.items.is_empty() {
        return 0;
    }
    let picked = ctx.powerups.collect(ctx.player.pos, ctx.player.size());
    for &kind in &picked {
        ctx.activate_powerup(kind);
    }
    picked.len() as u32
}
