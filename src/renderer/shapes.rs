//! Triangle-list tessellation for 2D primitives

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;
use crate::rotate;

/// Append a filled circle as a triangle fan
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4], segments: u32) {
    let segments = segments.max(3);
    out.reserve((segments * 3) as usize);
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        // Triangle from center to edge
        out.push(Vertex::new(center.x, center.y, color));
        out.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        out.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }
}

/// Append a ring (hollow circle)
pub fn ring(
    out: &mut Vec<Vertex>,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) {
    let segments = segments.max(3);
    out.reserve((segments * 6) as usize);
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;
        let dir1 = Vec2::from_angle(theta1);
        let dir2 = Vec2::from_angle(theta2);

        let inner1 = center + dir1 * inner_radius;
        let outer1 = center + dir1 * outer_radius;
        let inner2 = center + dir2 * inner_radius;
        let outer2 = center + dir2 * outer_radius;

        // Two triangles per segment
        out.push(Vertex::new(inner1.x, inner1.y, color));
        out.push(Vertex::new(outer1.x, outer1.y, color));
        out.push(Vertex::new(inner2.x, inner2.y, color));

        out.push(Vertex::new(inner2.x, inner2.y, color));
        out.push(Vertex::new(outer1.x, outer1.y, color));
        out.push(Vertex::new(outer2.x, outer2.y, color));
    }
}

/// Append an outline polygon (unit offsets) scaled, rotated and fanned from `center`
pub fn polygon(
    out: &mut Vec<Vertex>,
    center: Vec2,
    points: &[Vec2],
    scale: f32,
    rotation: f32,
    color: [f32; 4],
) {
    if points.len() < 3 {
        return;
    }
    out.reserve(points.len() * 3);
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let a = center + rotate(*p * scale, rotation);
        let b = center + rotate(q * scale, rotation);
        out.push(Vertex::new(center.x, center.y, color));
        out.push(Vertex::new(a.x, a.y, color));
        out.push(Vertex::new(b.x, b.y, color));
    }
}

/// Append an axis-aligned rectangle (top-left + size)
pub fn rect(out: &mut Vec<Vertex>, pos: Vec2, size: Vec2, color: [f32; 4]) {
    let (x0, y0) = (pos.x, pos.y);
    let (x1, y1) = (pos.x + size.x, pos.y + size.y);
    out.extend_from_slice(&[
        Vertex::new(x0, y0, color),
        Vertex::new(x1, y0, color),
        Vertex::new(x0, y1, color),
        Vertex::new(x0, y1, color),
        Vertex::new(x1, y0, color),
        Vertex::new(x1, y1, color),
    ]);
}

/// Append an upward-pointing ship triangle filling the box
pub fn ship(out: &mut Vec<Vertex>, pos: Vec2, size: Vec2, color: [f32; 4]) {
    out.extend_from_slice(&[
        Vertex::new(pos.x + size.x * 0.5, pos.y, color),
        Vertex::new(pos.x, pos.y + size.y, color),
        Vertex::new(pos.x + size.x, pos.y + size.y, color),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_vertex_count() {
        let mut out = Vec::new();
        circle(&mut out, Vec2::ZERO, 4.0, [1.0; 4], 8);
        assert_eq!(out.len(), 24);
        assert!(out.iter().all(|v| Vec2::from(v.position).length() <= 4.0 + 1e-4));
    }

    #[test]
    fn test_polygon_fans_every_edge() {
        let square = [Vec2::X, Vec2::Y, -Vec2::X, -Vec2::Y];
        let mut out = Vec::new();
        polygon(&mut out, Vec2::new(100.0, 50.0), &square, 10.0, 0.0, [1.0; 4]);
        assert_eq!(out.len(), 12);
        assert_eq!(out[1].position, [110.0, 50.0]);
        // Degenerate outlines draw nothing
        out.clear();
        polygon(&mut out, Vec2::ZERO, &square[..2], 10.0, 0.0, [1.0; 4]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_rect_bounds() {
        let mut out = Vec::new();
        rect(&mut out, Vec2::new(10.0, 20.0), Vec2::new(40.0, 40.0), [1.0; 4]);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|v| (10.0..=50.0).contains(&v.position[0])));
    }
}
