//! Rendering boundary
//!
//! The simulation never draws. Each frame the host captures a
//! [`RenderSnapshot`] and feeds it to a [`RendererTable`], which turns every
//! entity into triangles through one [`EntityRenderer`] per entity type.
//! Themes swap individual renderers with [`RenderStrategy::Override`]; the
//! choice is made once when the table is built.

pub mod shapes;
pub mod snapshot;
pub mod vertex;

pub use snapshot::{BulletView, BuffView, ObstacleView, PlayerView, PowerupView, RenderSnapshot};
pub use vertex::{Vertex, as_bytes, colors};

use crate::sim::powerup::PowerupKind;

/// Segments used for round shapes
const CIRCLE_SEGMENTS: u32 = 12;
/// Invulnerability blink period in ticks
const BLINK_TICKS: u64 = 8;

/// Draws one kind of entity
pub trait EntityRenderer<T> {
    /// Append triangles for `item`. `alpha` is the scheduler's leftover step
    /// fraction for extrapolating motion.
    fn draw(&self, item: &T, alpha: f32, out: &mut Vec<Vertex>);
}

/// How an entity type should be drawn
pub enum RenderStrategy<T> {
    Default,
    Override(Box<dyn EntityRenderer<T>>),
}

impl<T> Default for RenderStrategy<T> {
    fn default() -> Self {
        RenderStrategy::Default
    }
}

impl<T: 'static> RenderStrategy<T> {
    fn resolve(self, fallback: impl EntityRenderer<T> + 'static) -> Box<dyn EntityRenderer<T>> {
        match self {
            RenderStrategy::Default => Box::new(fallback),
            RenderStrategy::Override(renderer) => renderer,
        }
    }
}

/// Per-entity strategy selection for [`RendererTable::new`]
#[derive(Default)]
pub struct RenderStrategies {
    pub obstacle: RenderStrategy<ObstacleView>,
    pub bullet: RenderStrategy<BulletView>,
    pub powerup: RenderStrategy<PowerupView>,
    pub player: RenderStrategy<PlayerView>,
}

/// Resolved renderers, one per entity type
pub struct RendererTable {
    obstacle: Box<dyn EntityRenderer<ObstacleView>>,
    bullet: Box<dyn EntityRenderer<BulletView>>,
    powerup: Box<dyn EntityRenderer<PowerupView>>,
    player: Box<dyn EntityRenderer<PlayerView>>,
}

impl Default for RendererTable {
    fn default() -> Self {
        Self::new(RenderStrategies::default())
    }
}

impl RendererTable {
    pub fn new(strategies: RenderStrategies) -> Self {
        Self {
            obstacle: strategies.obstacle.resolve(DefaultObstacleRenderer),
            bullet: strategies.bullet.resolve(DefaultBulletRenderer),
            powerup: strategies.powerup.resolve(DefaultPowerupRenderer),
            player: strategies.player.resolve(DefaultPlayerRenderer),
        }
    }

    /// Tessellate a whole frame: rocks, pickups, bullets, then the ship on top
    pub fn render(&self, snapshot: &RenderSnapshot) -> Vec<Vertex> {
        let mut out = Vec::new();
        self.render_into(snapshot, &mut out);
        out
    }

    pub fn render_into(&self, snapshot: &RenderSnapshot, out: &mut Vec<Vertex>) {
        out.clear();
        let alpha = snapshot.alpha;
        for rock in &snapshot.obstacles {
            self.obstacle.draw(rock, alpha, out);
        }
        for pickup in &snapshot.powerups {
            self.powerup.draw(pickup, alpha, out);
        }
        for bullet in &snapshot.bullets {
            self.bullet.draw(bullet, alpha, out);
        }
        self.player.draw(&snapshot.player, alpha, out);
    }
}

pub struct DefaultObstacleRenderer;

impl EntityRenderer<ObstacleView> for DefaultObstacleRenderer {
    fn draw(&self, item: &ObstacleView, alpha: f32, out: &mut Vec<Vertex>) {
        let color = match item.level {
            0 => colors::ROCK_LARGE,
            1 => colors::ROCK_MEDIUM,
            _ => colors::ROCK_SMALL,
        };
        let center = item.center + item.velocity * alpha;
        shapes::polygon(out, center, &item.shape, item.radius, item.rotation, color);
    }
}

pub struct DefaultBulletRenderer;

impl EntityRenderer<BulletView> for DefaultBulletRenderer {
    fn draw(&self, item: &BulletView, alpha: f32, out: &mut Vec<Vertex>) {
        let center = item.center + item.velocity * alpha;
        shapes::circle(out, center, item.radius, colors::BULLET, CIRCLE_SEGMENTS);
    }
}

pub struct DefaultPowerupRenderer;

impl EntityRenderer<PowerupView> for DefaultPowerupRenderer {
    fn draw(&self, item: &PowerupView, _alpha: f32, out: &mut Vec<Vertex>) {
        let color = match item.kind {
            PowerupKind::Shield => colors::POWERUP_SHIELD,
            PowerupKind::RapidFire => colors::POWERUP_RAPID_FIRE,
            PowerupKind::SpreadShot => colors::POWERUP_SPREAD_SHOT,
            PowerupKind::SlowTime => colors::POWERUP_SLOW_TIME,
        };
        shapes::rect(out, item.pos, glam::Vec2::splat(item.size), color);
    }
}

pub struct DefaultPlayerRenderer;

impl EntityRenderer<PlayerView> for DefaultPlayerRenderer {
    fn draw(&self, item: &PlayerView, _alpha: f32, out: &mut Vec<Vertex>) {
        let blink = item.invulnerable && (item.tick / BLINK_TICKS) % 2 == 1;
        let color = if blink { colors::PLAYER_HURT } else { colors::PLAYER };
        shapes::ship(out, item.pos, item.size, color);
        if item.shielded {
            let center = item.pos + item.size * 0.5;
            let r = item.size.max_element() * 0.75;
            shapes::ring(out, center, r, r + 3.0, colors::SHIELD, CIRCLE_SEGMENTS * 2);
        }
    }
}
