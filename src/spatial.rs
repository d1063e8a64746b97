//! Uniform-grid spatial index mapping world rectangles to node identifiers.
//!
//! The index is a derived cache refreshed from the view's render callback. It is
//! never the system of record: dropping it and re-inserting every rendered node
//! yields the same query results.

use crate::geometry::{Point, Rect};
use ahash::{AHashMap, AHashSet};
use tracing::trace;

/// Edge length of one grid cell, in world units.
pub const CELL_SIZE: f64 = 256.0;

/// Entries covering more cells than this are kept outside the grid.
pub const MAX_ENTRY_CELLS: u128 = 4096;

type Cell = (i64, i64);

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    buckets: AHashMap<Cell, Vec<String>>,
    rects: AHashMap<String, Rect>,
    /// Inverse lookup so removal only touches the cells an id occupies.
    cells_by_id: AHashMap<String, Vec<Cell>>,
    /// Entries spanning more than `MAX_ENTRY_CELLS` cells; checked by every query.
    oversized: AHashSet<String>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell_of(p: Point) -> Cell {
        (
            (p.x / CELL_SIZE).floor() as i64,
            (p.y / CELL_SIZE).floor() as i64,
        )
    }

    /// Number of cells `rect` overlaps, saturating instead of overflowing.
    fn cell_count(rect: &Rect) -> u128 {
        let (x0, y0) = Self::cell_of(rect.min);
        let (x1, y1) = Self::cell_of(rect.max);
        let span = |lo: i64, hi: i64| (i128::from(hi) - i128::from(lo) + 1).max(0) as u128;
        span(x0, x1).saturating_mul(span(y0, y1))
    }

    /// Cells overlapped by `rect`. Callers bound the count with `cell_count` first.
    fn cells_for(rect: &Rect) -> impl Iterator<Item = Cell> {
        let (x0, y0) = Self::cell_of(rect.min);
        let (x1, y1) = Self::cell_of(rect.max);
        (x0..=x1).flat_map(move |cx| (y0..=y1).map(move |cy| (cx, cy)))
    }

    /// Stores `rect` for `node_id`, replacing any previous entry for the same id.
    pub fn insert(&mut self, node_id: &str, rect: Rect) {
        self.remove(node_id);
        if Self::cell_count(&rect) > MAX_ENTRY_CELLS {
            trace!(node = node_id, "spatial index entry stored outside the grid");
            self.oversized.insert(node_id.to_string());
            self.cells_by_id.insert(node_id.to_string(), Vec::new());
            self.rects.insert(node_id.to_string(), rect);
            return;
        }
        let cells: Vec<Cell> = Self::cells_for(&rect).collect();
        for cell in &cells {
            self.buckets
                .entry(*cell)
                .or_default()
                .push(node_id.to_string());
        }
        trace!(node = node_id, cells = cells.len(), "spatial index entry refreshed");
        self.cells_by_id.insert(node_id.to_string(), cells);
        self.rects.insert(node_id.to_string(), rect);
    }

    /// Drops every bucket reference to `node_id`. Returns whether an entry existed.
    pub fn remove(&mut self, node_id: &str) -> bool {
        let Some(cells) = self.cells_by_id.remove(node_id) else {
            return false;
        };
        self.oversized.remove(node_id);
        for cell in cells {
            if let Some(bucket) = self.buckets.get_mut(&cell) {
                bucket.retain(|id| id != node_id);
                if bucket.is_empty() {
                    self.buckets.remove(&cell);
                }
            }
        }
        self.rects.remove(node_id);
        true
    }

    /// Ids whose stored rectangle intersects `area`.
    pub fn query_ids_in_area(&self, area: &Rect) -> AHashSet<String> {
        // A query wider than the occupied grid is answered by scanning the entries.
        if Self::cell_count(area) > self.buckets.len() as u128 {
            return self
                .rects
                .iter()
                .filter(|(_, r)| r.intersects(area))
                .map(|(id, _)| id.clone())
                .collect();
        }

        let mut found: AHashSet<String> = self
            .oversized
            .iter()
            .filter(|id| self.rects.get(*id).is_some_and(|r| r.intersects(area)))
            .cloned()
            .collect();
        for cell in Self::cells_for(area) {
            let Some(bucket) = self.buckets.get(&cell) else {
                continue;
            };
            for id in bucket {
                if found.contains(id) {
                    continue;
                }
                // Cells over-approximate; confirm against the exact rectangle.
                if self.rects.get(id).is_some_and(|r| r.intersects(area)) {
                    found.insert(id.clone());
                }
            }
        }
        found
    }

    /// Ids whose rectangle contains `point`, for click hit-testing.
    pub fn query_ids_at(&self, point: Point) -> AHashSet<String> {
        self.query_ids_in_area(&Rect::from_corners(point, point))
    }

    pub fn rect_of(&self, node_id: &str) -> Option<Rect> {
        self.rects.get(node_id).copied()
    }

    /// Bounding rectangle over the last-known rectangles of `ids`. Unknown ids are ignored.
    pub fn bounds_of<'a, I>(&self, ids: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a String>,
    {
        Rect::bounding(ids.into_iter().filter_map(|id| self.rect_of(id)))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.rects.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.rects.clear();
        self.cells_by_id.clear();
        self.oversized.clear();
    }

    /// Number of non-empty grid cells.
    pub fn occupied_cells(&self) -> usize {
        self.buckets.len()
    }
}
