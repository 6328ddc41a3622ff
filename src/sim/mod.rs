//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (arena slot order)
//! - No rendering or platform dependencies

pub mod arena;
pub mod bullet;
pub mod collision;
pub mod difficulty;
pub mod events;
pub mod grid;
pub mod obstacle;
pub mod player;
pub mod pool;
pub mod powerup;
pub mod state;
pub mod tick;

pub use arena::{Arena, Handle};
pub use bullet::{Bullet, BulletField, FireMode};
pub use collision::{CollisionReport, check_collisions};
pub use difficulty::{difficulty_factor, spawn_interval_ms, speed_range};
pub use events::{EventBus, GameEvent};
pub use grid::SpatialGrid;
pub use obstacle::{Destruction, Expiry, FamilyTracker, Obstacle, ObstacleFate, ObstacleField};
pub use player::Player;
pub use pool::ObjectPool;
pub use powerup::{ActivePowerups, PowerupField, PowerupKind, WorldPowerup};
pub use state::{GamePhase, SimulationContext};
pub use tick::{TickInput, tick};
