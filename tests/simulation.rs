//! End-to-end gameplay scenarios through the public API

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use rock_drift::consts::{DESKTOP_TIME_STEP_MS, MOBILE_TIME_STEP_MS, PLAYER_SHOOTER_ID};
use rock_drift::renderer::RenderSnapshot;
use rock_drift::scheduler::FrameId;
use rock_drift::sim::{
    GameEvent, GamePhase, ObstacleField, PowerupKind, SimulationContext, TickInput, check_collisions,
    tick,
};
use rock_drift::{FixedStepScheduler, FrameHost, Platform, Settings, Tuning};

/// Balance with spawning switched off so scenarios control every entity
fn quiet_tuning() -> Tuning {
    let mut tuning = Tuning::default();
    tuning.difficulty.base_spawn_interval_ms = 1e12;
    tuning.difficulty.min_spawn_interval_ms = 1e12;
    tuning.powerups.spawn_interval_ms = 1e12;
    tuning
}

fn playing(seed: u64, tuning: Tuning) -> SimulationContext {
    let mut ctx = SimulationContext::new(seed, tuning);
    assert!(ctx.start());
    ctx.drain_events();
    ctx
}

#[test]
fn bullet_splits_large_rock() {
    let mut ctx = playing(2024, quiet_tuning());
    let rock = ctx.obstacles.spawn_root_at(
        &mut ctx.rng,
        &ctx.tuning,
        0,
        Vec2::new(100.0, -70.0),
        2.0,
        0.0,
    );
    let rock_id = ctx.obstacles.get(rock).map(|o| o.id).unwrap();
    assert_eq!(ctx.obstacles.get(rock).unwrap().center(), Vec2::new(135.0, -35.0));
    let spec = ctx.tuning.bullet.clone();
    ctx.bullets
        .spawn(Vec2::new(135.0, -35.0), 0.0, &spec, PLAYER_SHOOTER_ID);

    let report = check_collisions(&mut ctx);

    assert_eq!(report.obstacles_destroyed, 1);
    assert!(ctx.obstacles.get(rock).is_none());
    assert!(ctx.bullets.is_empty());
    assert_eq!(ctx.score, 20);
    let children: Vec<_> = ctx.obstacles.live.values().collect();
    assert!((2..=3).contains(&children.len()));
    for child in children {
        assert_eq!(child.level, 1);
        assert_eq!(child.radius, 22.0);
        assert_eq!(child.parent_id, rock_id);
        assert!((child.center() - Vec2::new(135.0, -35.0)).length() < 1e-4);
        assert!(child.drift.length() >= 0.3 - 1e-4);
        assert_eq!(child.speed, 2.0);
    }
    let events = ctx.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::ObstacleDestroyed { id, level: 0, score: 20, .. } if *id == rock_id
    )));
}

#[test]
fn shield_absorbs_exactly_its_duration() {
    let mut ctx = playing(7, quiet_tuning());
    let center = ctx.player.center();
    let r = ctx.tuning.tier(0).radius;
    ctx.obstacles.spawn_root_at(
        &mut ctx.rng,
        &ctx.tuning,
        0,
        center - Vec2::splat(r),
        0.0,
        0.0,
    );
    ctx.activate_powerup(PowerupKind::Shield);
    let lives = ctx.player.lives;
    let idle = TickInput::default();

    for t in 1..=300 {
        tick(&mut ctx, &idle, DESKTOP_TIME_STEP_MS);
        assert_eq!(ctx.player.lives, lives, "life lost on tick {t}");
    }
    assert!(!ctx.buffs.is_active(PowerupKind::Shield));
    assert!(ctx
        .drain_events()
        .contains(&GameEvent::PowerupExpired { kind: PowerupKind::Shield }));

    tick(&mut ctx, &idle, DESKTOP_TIME_STEP_MS);
    assert_eq!(ctx.player.lives, lives - 1);
    assert!(ctx.drain_events().contains(&GameEvent::PlayerHit { lives: lives - 1 }));
}

#[test]
fn family_bonus_fires_once_in_any_order() {
    let tuning = Tuning::default();
    for seed in 0..200u64 {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut order = Pcg32::seed_from_u64(seed ^ 0xDEAD_BEEF);
        let mut field = ObstacleField::new();
        let root = field.spawn_root_at(&mut rng, &tuning, 0, Vec2::new(300.0, 100.0), 1.0, 0.0);

        let mut open = vec![root];
        let mut bonuses = 0;
        while !open.is_empty() {
            let pick = open.swap_remove(order.random_range(0..open.len()));
            let record = field
                .destroy_by_bullet(pick, &mut rng, &tuning, 0.0)
                .expect("live rock");
            open.extend(record.fragments.iter().copied());
            if let Some(bonus) = record.family_bonus {
                bonuses += 1;
                assert_eq!(bonus, tuning.family_clear_bonus);
                assert!(open.is_empty(), "bonus paid with rocks left (seed {seed})");
            }
        }
        assert_eq!(bonuses, 1, "seed {seed}");
        assert!(field.families.is_empty());
    }
}

#[test]
fn expired_fragment_forfeits_bonus() {
    let tuning = Tuning::default();
    let mut rng = Pcg32::seed_from_u64(77);
    let mut field = ObstacleField::new();
    let root = field.spawn_root_at(&mut rng, &tuning, 1, Vec2::new(300.0, 100.0), 1.0, 0.0);
    let leaves = field
        .destroy_by_bullet(root, &mut rng, &tuning, 0.0)
        .unwrap()
        .fragments;
    // One leaf drifts away
    field.get_mut(leaves[0]).unwrap().pos.y = 10_000.0;
    assert_eq!(field.expire_stale(0.0, &tuning).len(), 1);
    let bonuses = leaves[1..]
        .iter()
        .filter_map(|&h| field.destroy_by_bullet(h, &mut rng, &tuning, 0.0))
        .filter(|d| d.family_bonus.is_some())
        .count();
    assert_eq!(bonuses, 0);
    assert!(field.families.is_empty());
}

#[test]
fn same_seed_same_game() {
    let inputs: Vec<TickInput> = (0..40)
        .map(|i| TickInput {
            move_dir: Vec2::new(if i % 3 == 0 { 1.0 } else { -1.0 }, 0.0),
            fire: i % 2 == 0,
            ..Default::default()
        })
        .collect();
    let run = |seed: u64| {
        let mut ctx = playing(seed, Tuning::default());
        let mut frames = Vec::new();
        for i in 0..3000 {
            tick(&mut ctx, &inputs[(i / 7) % inputs.len()], DESKTOP_TIME_STEP_MS);
            if i % 500 == 0 {
                frames.push(RenderSnapshot::capture(&ctx, 0.0).to_json().unwrap());
            }
        }
        (frames, ctx.score, ctx.drain_events())
    };
    let a = run(31337);
    let b = run(31337);
    assert_eq!(a, b);
    let c = run(31338);
    assert_ne!(a.0, c.0);
}

#[derive(Default)]
struct ManualFrames {
    next: FrameId,
    pending: Option<FrameId>,
}

impl FrameHost for ManualFrames {
    fn request_frame(&mut self) -> FrameId {
        self.next += 1;
        self.pending = Some(self.next);
        self.next
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

#[test]
fn mobile_runs_thirty_updates_per_second() {
    let settings = Settings::for_platform(Platform::Mobile);
    assert_eq!(settings.time_step_ms(), MOBILE_TIME_STEP_MS);
    let mut ctx = playing(5, quiet_tuning());
    let mut scheduler = FixedStepScheduler::new(&settings);
    let mut host = ManualFrames::default();
    scheduler.start(&mut host);

    let mut now = 0.0;
    scheduler.frame(now, &mut host, |dt| tick(&mut ctx, &TickInput::default(), dt));
    let mut updates = 0;
    for _ in 0..120 {
        now += 1000.0 / 120.0;
        updates += scheduler
            .frame(now, &mut host, |dt| tick(&mut ctx, &TickInput::default(), dt))
            .updates;
    }
    assert!((29..=30).contains(&updates), "ran {updates} updates");
    assert_eq!(ctx.time_ticks, updates as u64);
}

#[test]
fn pause_stops_loop_and_resume_skips_gap() {
    let settings = Settings::default();
    let mut ctx = playing(9, quiet_tuning());
    let mut scheduler = FixedStepScheduler::new(&settings);
    let mut host = ManualFrames::default();
    scheduler.start(&mut host);
    scheduler.frame(0.0, &mut host, |dt| tick(&mut ctx, &TickInput::default(), dt));
    scheduler.frame(100.0, &mut host, |dt| tick(&mut ctx, &TickInput::default(), dt));
    let ticks = ctx.time_ticks;
    assert!(ticks > 0);

    assert!(ctx.pause());
    scheduler.stop(&mut host);
    assert!(host.pending.is_none());
    assert_eq!(ctx.phase, GamePhase::Paused);

    // Ten minutes later
    assert!(ctx.resume());
    scheduler.start(&mut host);
    scheduler.frame(600_000.0, &mut host, |dt| tick(&mut ctx, &TickInput::default(), dt));
    assert_eq!(ctx.time_ticks, ticks);
    scheduler.frame(600_020.0, &mut host, |dt| tick(&mut ctx, &TickInput::default(), dt));
    assert_eq!(ctx.time_ticks, ticks + 1);
}
