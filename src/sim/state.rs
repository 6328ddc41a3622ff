//! Simulation context and game phases
//!
//! Everything the tick mutates lives in one [`SimulationContext`]: entity
//! arenas with their pools, the broad-phase grid, the seeded RNG, counters
//! and the outgoing event queue.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::{BulletField, FireMode};
use super::events::GameEvent;
use super::grid::SpatialGrid;
use super::obstacle::ObstacleField;
use super::player::Player;
use super::powerup::{ActivePowerups, PowerupField, PowerupKind};
use crate::tuning::Tuning;

/// First level of a run
pub const FIRST_LEVEL: u32 = 1;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for the start input
    Start,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Short rest between levels: entities keep moving, nothing spawns
    LevelTransition,
    /// Out of lives
    GameOver,
}

impl GamePhase {
    /// Phases in which the fixed-step loop runs
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::LevelTransition)
    }
}

/// Complete simulation state for one game session
#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    resume_phase: GamePhase,
    pub obstacles: ObstacleField,
    pub bullets: BulletField,
    /// Broad phase, rebuilt every tick
    pub grid: SpatialGrid,
    pub player: Player,
    pub powerups: PowerupField,
    pub buffs: ActivePowerups,
    pub score: u64,
    pub level: u32,
    /// Simulation clock; advances only while the loop runs
    pub clock_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Time accumulated toward the next root obstacle
    pub obstacle_spawn_ms: f64,
    /// Time accumulated toward the next falling powerup
    pub powerup_spawn_ms: f64,
    /// Time played on the current level
    pub level_elapsed_ms: f64,
    /// Ticks left in the current level transition
    pub transition_ticks: u32,
    events: Vec<GameEvent>,
}

impl SimulationContext {
    /// Create a context waiting on the start screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let grid = SpatialGrid::new(tuning.max_obstacle_radius() * 2.0);
        let player = Player::new(&tuning.player, &tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Start,
            resume_phase: GamePhase::Playing,
            obstacles: ObstacleField::new(),
            bullets: BulletField::new(),
            grid,
            player,
            powerups: PowerupField::new(),
            buffs: ActivePowerups::new(),
            score: 0,
            level: FIRST_LEVEL,
            clock_ms: 0.0,
            time_ticks: 0,
            obstacle_spawn_ms: 0.0,
            powerup_spawn_ms: 0.0,
            level_elapsed_ms: 0.0,
            transition_ticks: 0,
            events: Vec::new(),
            tuning,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Queue an event for the host
    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain, oldest first
    #[inline]
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    pub fn add_score(&mut self, points: u32) {
        if points == 0 {
            return;
        }
        self.score += points as u64;
        self.emit(GameEvent::ScoreChanged { score: self.score });
    }

    /// Begin a run from the start or game-over screen
    pub fn start(&mut self) -> bool {
        if !matches!(self.phase, GamePhase::Start | GamePhase::GameOver) {
            return false;
        }
        self.reset();
        log::info!("Run started (seed {})", self.seed);
        self.set_phase(GamePhase::Playing);
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.phase.is_running() {
            return false;
        }
        self.resume_phase = self.phase;
        self.set_phase(GamePhase::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.set_phase(self.resume_phase);
        true
    }

    /// Enter the game-over screen
    pub(crate) fn game_over(&mut self) {
        log::info!("Game over: score {} at level {}", self.score, self.level);
        self.set_phase(GamePhase::GameOver);
        self.emit(GameEvent::GameOver {
            score: self.score,
            level: self.level,
        });
    }

    /// Clear the world for a fresh run. Entity ids keep counting and the RNG
    /// keeps its stream, so consecutive runs differ.
    pub fn reset(&mut self) {
        self.obstacles.reset();
        self.bullets.reset();
        self.grid.clear();
        self.powerups.clear();
        self.buffs.clear();
        self.player = Player::new(&self.tuning.player, &self.tuning);
        self.score = 0;
        self.level = FIRST_LEVEL;
        self.clock_ms = 0.0;
        self.time_ticks = 0;
        self.obstacle_spawn_ms = 0.0;
        self.powerup_spawn_ms = 0.0;
        self.level_elapsed_ms = 0.0;
        self.transition_ticks = 0;
    }

    /// Obstacle motion multiplier (SlowTime)
    pub fn time_scale(&self) -> f32 {
        if self.buffs.is_active(PowerupKind::SlowTime) {
            self.tuning.powerups.slow_time_factor
        } else {
            1.0
        }
    }

    pub fn fire_mode(&self) -> FireMode {
        FireMode {
            rapid: self.buffs.is_active(PowerupKind::RapidFire),
            spread: self.buffs.is_active(PowerupKind::SpreadShot),
        }
    }

    /// Start or refresh a buff and announce it
    pub fn activate_powerup(&mut self, kind: PowerupKind) {
        let ticks = kind.duration_ticks(&self.tuning.powerups);
        self.buffs.activate(kind, ticks);
        log::debug!("Powerup {:?} active for {} ticks", kind, ticks);
        self.emit(GameEvent::PowerupCollected { kind });
    }
}
