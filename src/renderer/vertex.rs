//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Raw bytes of a vertex list, ready for a GPU or WebGL buffer upload
pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Colors for game elements
pub mod colors {
    pub const ROCK_LARGE: [f32; 4] = [0.55, 0.5, 0.45, 1.0];
    pub const ROCK_MEDIUM: [f32; 4] = [0.65, 0.55, 0.45, 1.0];
    pub const ROCK_SMALL: [f32; 4] = [0.8, 0.6, 0.4, 1.0];
    pub const BULLET: [f32; 4] = [1.0, 1.0, 0.6, 1.0];
    pub const PLAYER: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    /// Blinks between this and PLAYER while invulnerable
    pub const PLAYER_HURT: [f32; 4] = [0.9, 0.3, 0.3, 0.6];
    pub const SHIELD: [f32; 4] = [0.3, 0.7, 1.0, 0.5];
    pub const POWERUP_SHIELD: [f32; 4] = [0.3, 0.7, 1.0, 1.0];
    pub const POWERUP_RAPID_FIRE: [f32; 4] = [1.0, 0.4, 0.2, 1.0];
    pub const POWERUP_SPREAD_SHOT: [f32; 4] = [0.9, 0.85, 0.3, 1.0];
    pub const POWERUP_SLOW_TIME: [f32; 4] = [0.6, 0.2, 0.8, 1.0];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_tight() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let verts = [Vertex::new(1.0, 2.0, colors::BULLET); 3];
        assert_eq!(as_bytes(&verts).len(), 72);
    }
}
