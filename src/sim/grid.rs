//! Uniform spatial grid (collision broad phase)
//!
//! Rebuilt from scratch every tick: no incremental updates, so entities that
//! moved since the last tick are re-bucketed by the rebuild itself.

use std::collections::HashMap;

use glam::Vec2;

use super::arena::Handle;

type CellKey = (i32, i32);

/// Buckets of obstacle handles keyed by cell
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<Handle>>,
    count: usize,
}

impl SpatialGrid {
    /// `cell_size` should be close to the largest entity diameter
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            count: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of entries inserted since the last clear
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    fn key(&self, x: f32, y: f32) -> CellKey {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Empty every bucket, keeping the allocations
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.count = 0;
    }

    /// Bucket an entity by its center point
    pub fn insert(&mut self, handle: Handle, center: Vec2) {
        let key = self.key(center.x, center.y);
        self.cells.entry(key).or_default().push(handle);
        self.count += 1;
    }

    /// Append every handle in the cells overlapping the circle's bounding box.
    ///
    /// Broad phase only: results include false positives and must be
    /// confirmed with an exact distance test.
    pub fn query_near(&self, x: f32, y: f32, radius: f32, out: &mut Vec<Handle>) {
        if self.count == 0 {
            return;
        }
        let (min_cx, min_cy) = self.key(x - radius, y - radius);
        let (max_cx, max_cy) = self.key(x + radius, y + radius);
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Allocating convenience wrapper around [`SpatialGrid::query_near`]
    pub fn query_near_vec(&self, x: f32, y: f32, radius: f32) -> Vec<Handle> {
        let mut out = Vec::new();
        self.query_near(x, y, radius, &mut out);
        out
    }
}
