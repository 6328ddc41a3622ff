//! Typed game events
//!
//! The simulation queues events on its context; the host drains the queue
//! once per frame and hands it to an [`EventBus`] so UI, audio and theming
//! layers can react without polling simulation state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacle::ObstacleFate;
use super::powerup::PowerupKind;
use super::state::GamePhase;

/// Something observable happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    ScoreChanged { score: u64 },
    ObstacleDestroyed {
        id: u32,
        level: u8,
        center: Vec2,
        fragments: u32,
        score: u32,
    },
    ObstacleExpired { id: u32, fate: ObstacleFate },
    /// Last leaf of a family shot down
    FamilyCleared { family: u32, center: Vec2, bonus: u32 },
    BulletFired { count: u32 },
    PlayerHit { lives: u8 },
    PowerupSpawned { kind: PowerupKind },
    PowerupCollected { kind: PowerupKind },
    PowerupExpired { kind: PowerupKind },
    LevelUp { level: u32 },
    GameOver { score: u64, level: u32 },
}

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Fan-out of drained events to registered listeners
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver events in queue order to every listener
    pub fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            log::trace!("Game event: {:?}", event);
            for listener in &mut self.listeners {
                listener(event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
