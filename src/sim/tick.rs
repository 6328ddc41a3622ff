//! Fixed timestep simulation tick
//!
//! Advances the context by one step in a fixed order:
//! spawn, move, collide, reclaim, timers.

use glam::Vec2;

use super::collision::check_collisions;
use super::difficulty::{spawn_interval_ms, speed_range};
use super::events::GameEvent;
use super::state::{GamePhase, SimulationContext};
use crate::consts::{BASE_STEP_MS, PLAYER_SHOOTER_ID};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Keyboard direction; normalized before use
    pub move_dir: Vec2,
    /// Pointer/touch position; the ship centers on it this tick
    pub pointer: Option<Vec2>,
    /// Fire held
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start a run from the title or game-over screen
    pub start: bool,
}

/// Advance the simulation by one fixed step of `dt_ms`
pub fn tick(ctx: &mut SimulationContext, input: &TickInput, dt_ms: f64) {
    if input.pause {
        match ctx.phase {
            GamePhase::Playing | GamePhase::LevelTransition => {
                ctx.pause();
                return;
            }
            GamePhase::Paused => {
                ctx.resume();
            }
            _ => {}
        }
    }
    if input.start {
        ctx.start();
    }
    if !ctx.is_running() {
        return;
    }

    ctx.time_ticks += 1;
    ctx.clock_ms += dt_ms;
    let scale = (dt_ms / BASE_STEP_MS) as f32;

    spawn(ctx, dt_ms);
    move_entities(ctx, input, scale);
    check_collisions(ctx);
    reclaim(ctx);
    run_timers(ctx, dt_ms);
}

/// Root obstacles and falling powerups. Nothing spawns during a level transition.
fn spawn(ctx: &mut SimulationContext, dt_ms: f64) {
    if ctx.phase != GamePhase::Playing {
        return;
    }

    ctx.obstacle_spawn_ms += dt_ms;
    let interval = spawn_interval_ms(ctx.level, &ctx.tuning.difficulty);
    if ctx.obstacle_spawn_ms >= interval {
        ctx.obstacle_spawn_ms = 0.0;
        let speeds = speed_range(ctx.level, &ctx.tuning.difficulty);
        let now = ctx.clock_ms;
        ctx.obstacles
            .spawn_root(&mut ctx.rng, &ctx.tuning, speeds, now);
    }

    ctx.powerup_spawn_ms += dt_ms;
    if ctx.powerup_spawn_ms >= ctx.tuning.powerups.spawn_interval_ms {
        ctx.powerup_spawn_ms = 0.0;
        let kind = ctx.powerups.spawn(&mut ctx.rng, &ctx.tuning);
        log::debug!("Powerup {:?} dropped", kind);
        ctx.emit(GameEvent::PowerupSpawned { kind });
    }
}

fn move_entities(ctx: &mut SimulationContext, input: &TickInput, scale: f32) {
    ctx.player.apply_input(input.move_dir, input.pointer);
    ctx.player.advance(scale, &ctx.tuning);

    if input.fire && ctx.player.is_alive() {
        let mode = ctx.fire_mode();
        let muzzle = ctx.player.muzzle();
        let count = ctx
            .bullets
            .try_fire(muzzle, mode, &ctx.tuning.bullet, PLAYER_SHOOTER_ID);
        if count > 0 {
            ctx.emit(GameEvent::BulletFired { count });
        }
    }

    let time_scale = ctx.time_scale();
    ctx.obstacles.advance_all(scale, time_scale);
    ctx.bullets.advance_all(scale);
    ctx.powerups.advance_all(scale);
}

/// Return everything that left the field to its pool
fn reclaim(ctx: &mut SimulationContext) {
    let now = ctx.clock_ms;
    for expiry in ctx.obstacles.expire_stale(now, &ctx.tuning) {
        ctx.emit(GameEvent::ObstacleExpired {
            id: expiry.id,
            fate: expiry.fate,
        });
    }
    ctx.bullets.expire_offscreen(&ctx.tuning);
    ctx.powerups.expire_fallen(&ctx.tuning);
    ctx.obstacles.clear_marks();
}

fn run_timers(ctx: &mut SimulationContext, dt_ms: f64) {
    for kind in ctx.buffs.tick() {
        log::debug!("Powerup {:?} expired", kind);
        ctx.emit(GameEvent::PowerupExpired { kind });
    }
    ctx.bullets.tick_cooldown();
    ctx.player.tick_invulnerability();

    match ctx.phase {
        GamePhase::Playing => {
            ctx.level_elapsed_ms += dt_ms;
            if ctx.level_elapsed_ms >= ctx.tuning.difficulty.level_duration_ms {
                ctx.level_elapsed_ms = 0.0;
                ctx.transition_ticks = ctx.tuning.difficulty.transition_ticks;
                ctx.set_phase(GamePhase::LevelTransition);
                if ctx.transition_ticks == 0 {
                    level_up(ctx);
                }
            }
        }
        GamePhase::LevelTransition => {
            ctx.transition_ticks = ctx.transition_ticks.saturating_sub(1);
            if ctx.transition_ticks == 0 {
                level_up(ctx);
            }
        }
        _ => {}
    }
}

fn level_up(ctx: &mut SimulationContext) {
    ctx.level += 1;
    ctx.obstacle_spawn_ms = 0.0;
    log::info!("Level {} begins", ctx.level);
    ctx.emit(GameEvent::LevelUp { level: ctx.level });
    ctx.set_phase(GamePhase::Playing);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DESKTOP_TIME_STEP_MS;
    use crate::sim::powerup::PowerupKind;
    use crate::tuning::Tuning;

    const DT: f64 = DESKTOP_TIME_STEP_MS;

    fn playing(seed: u64) -> SimulationContext {
        let mut ctx = SimulationContext::new(seed, Tuning::default());
        tick(
            &mut ctx,
            &TickInput {
                start: true,
                ..Default::default()
            },
            DT,
        );
        ctx
    }

    #[test]
    fn test_start_to_playing() {
        let mut ctx = SimulationContext::new(12345, Tuning::default());
        tick(&mut ctx, &TickInput::default(), DT);
        assert_eq!(ctx.phase, GamePhase::Start);
        assert_eq!(ctx.time_ticks, 0);

        let ctx = playing(12345);
        assert_eq!(ctx.phase, GamePhase::Playing);
        assert_eq!(ctx.time_ticks, 1);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut ctx = playing(1);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut ctx, &pause, DT);
        assert_eq!(ctx.phase, GamePhase::Paused);
        let clock = ctx.clock_ms;
        for _ in 0..10 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.clock_ms, clock);

        tick(&mut ctx, &pause, DT);
        assert_eq!(ctx.phase, GamePhase::Playing);
        assert!(ctx.clock_ms > clock);
    }

    #[test]
    fn test_rocks_spawn_on_interval() {
        let mut ctx = playing(3);
        let interval = spawn_interval_ms(ctx.level, &ctx.tuning.difficulty);
        let ticks = (interval / DT).ceil() as usize + 1;
        for _ in 0..ticks {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.obstacles.len(), 1);
    }

    #[test]
    fn test_fire_spawns_and_rate_limits() {
        let mut ctx = playing(4);
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut ctx, &fire, DT);
        assert_eq!(ctx.bullets.len(), 1);
        tick(&mut ctx, &fire, DT);
        assert_eq!(ctx.bullets.len(), 1);
        ctx.activate_powerup(PowerupKind::SpreadShot);
        for _ in 0..ctx.tuning.bullet.fire_cooldown_ticks {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        tick(&mut ctx, &fire, DT);
        assert_eq!(ctx.bullets.len(), 4);
    }

    #[test]
    fn test_mobile_step_moves_twice_as_far() {
        let mut a = playing(8);
        let mut b = playing(8);
        let right = TickInput {
            move_dir: Vec2::X,
            ..Default::default()
        };
        let start = a.player.pos.x;
        tick(&mut a, &right, DT);
        tick(&mut b, &right, DT * 2.0);
        let da = a.player.pos.x - start;
        let db = b.player.pos.x - start;
        assert!((db - 2.0 * da).abs() < 1e-3);
    }

    #[test]
    fn test_level_transition_then_level_up() {
        let mut tuning = Tuning::default();
        tuning.difficulty.level_duration_ms = DT * 10.0 - 1.0;
        tuning.difficulty.transition_ticks = 5;
        let mut ctx = SimulationContext::new(9, tuning);
        ctx.start();
        for _ in 0..10 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase, GamePhase::LevelTransition);
        let rocks = ctx.obstacles.len();
        let spawn_ms = ctx.obstacle_spawn_ms;
        for _ in 0..4 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase, GamePhase::LevelTransition);
        assert_eq!(ctx.obstacle_spawn_ms, spawn_ms);
        assert!(ctx.obstacles.len() <= rocks);
        tick(&mut ctx, &TickInput::default(), DT);
        assert_eq!(ctx.phase, GamePhase::Playing);
        assert_eq!(ctx.level, 2);
        assert!(ctx.drain_events().contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_determinism() {
        let mut a = playing(99999);
        let mut b = playing(99999);
        let inputs = [
            TickInput {
                move_dir: Vec2::new(-1.0, 0.0),
                fire: true,
                ..Default::default()
            },
            TickInput {
                pointer: Some(Vec2::new(420.0, 500.0)),
                ..Default::default()
            },
            TickInput {
                fire: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for i in 0..2000 {
            let input = &inputs[i % inputs.len()];
            tick(&mut a, input, DT);
            tick(&mut b, input, DT);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.obstacles.len(), b.obstacles.len());
        for (ra, rb) in a.obstacles.live.values().zip(b.obstacles.live.values()) {
            assert_eq!(ra.id, rb.id);
            assert_eq!(ra.pos, rb.pos);
        }
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
