use rustc_hash::FxHashMap;

use crate::components::{Aabb, ObstacleId};

/// Uniform-grid broad phase. Each obstacle is inserted into every cell its
/// bounds overlap, so a query over the probe's cells plus a one-cell ring has
/// no false negatives as long as bounds enclose the exact shape.
///
/// A non-positive cell size, or more than `max_cells` occupied cells, collapses
/// the index into a single bucket: queries become O(n) but stay correct.
pub struct SpatialIndex {
    cell_size: f32,
    max_cells: usize,
    cells: FxHashMap<(i32, i32), Vec<ObstacleId>>,
    /// Single bucket used when the grid is unusable.
    collapsed: Vec<ObstacleId>,
    degraded: bool,
    len: usize,
    warned_runaway: bool,
}

impl SpatialIndex {
    pub fn new(cell_size: f32, max_cells: usize) -> Self {
        Self {
            cell_size,
            max_cells: max_cells.max(1),
            cells: FxHashMap::default(),
            collapsed: Vec::new(),
            degraded: false,
            len: 0,
            warned_runaway: false,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of inserted obstacles.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// True when entries live in the single fallback bucket.
    pub fn is_degraded(&self) -> bool {
        self.degraded || !self.grid_usable()
    }

    /// Drop every entry and switch to `cell_size`.
    pub fn rebuild(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.collapsed.clear();
        self.degraded = false;
        self.len = 0;
    }

    pub fn insert(&mut self, bounds: &Aabb, id: ObstacleId) {
        self.len += 1;
        if self.is_degraded() || !bounds.is_finite() {
            self.collapsed.push(id);
            return;
        }

        let (x0, y0, x1, y1) = self.cell_range(bounds);
        if span(x0, y0, x1, y1).map_or(true, |n| n > self.max_cells as u64) {
            self.degrade();
            self.collapsed.push(id);
            return;
        }

        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx as i32, cy as i32)).or_default().push(id);
            }
        }

        if self.cells.len() > self.max_cells {
            self.degrade();
        }
    }

    /// Every obstacle whose cells touch the probe's cells or their immediate
    /// neighbors, each yielded once. Callers still run the exact test.
    pub fn query_neighbors(&self, probe: &Aabb) -> impl Iterator<Item = ObstacleId> {
        let mut found = Vec::new();
        self.query_neighbors_into(probe, &mut found);
        found.into_iter()
    }

    /// Allocation-reusing form of [`query_neighbors`](Self::query_neighbors).
    /// `buf` is cleared first.
    pub fn query_neighbors_into(&self, probe: &Aabb, buf: &mut Vec<ObstacleId>) {
        buf.clear();
        buf.extend_from_slice(&self.collapsed);

        if !self.is_degraded() && probe.is_finite() {
            let (x0, y0, x1, y1) = self.cell_range(probe);
            let ring = |k: i64, d: i64| (k + d).clamp(i32::MIN as i64, i32::MAX as i64);
            let (x0, y0, x1, y1) = (ring(x0, -1), ring(y0, -1), ring(x1, 1), ring(y1, 1));

            if span(x0, y0, x1, y1).map_or(true, |n| n > self.cells.len() as u64) {
                // Probe covers more cells than exist; walk the occupied ones.
                for (&(cx, cy), ids) in &self.cells {
                    let (cx, cy) = (cx as i64, cy as i64);
                    if cx >= x0 && cx <= x1 && cy >= y0 && cy <= y1 {
                        buf.extend_from_slice(ids);
                    }
                }
            } else {
                for cx in x0..=x1 {
                    for cy in y0..=y1 {
                        if let Some(ids) = self.cells.get(&(cx as i32, cy as i32)) {
                            buf.extend_from_slice(ids);
                        }
                    }
                }
            }
        }

        buf.sort_unstable_by_key(|id| id.to_bits());
        buf.dedup();
    }

    fn grid_usable(&self) -> bool {
        self.cell_size.is_finite() && self.cell_size > 0.0
    }

    /// Inclusive cell coordinate range covered by `bounds`.
    fn cell_range(&self, bounds: &Aabb) -> (i64, i64, i64, i64) {
        let inv = 1.0 / self.cell_size;
        let key = |v: f32| ((v * inv).floor() as i64).clamp(i32::MIN as i64, i32::MAX as i64);
        (
            key(bounds.x),
            key(bounds.y),
            key(bounds.right()),
            key(bounds.bottom()),
        )
    }

    fn degrade(&mut self) {
        if !self.warned_runaway {
            log::warn!(
                "spatial index exceeded {} cells at cell size {}; falling back to a single bucket",
                self.max_cells,
                self.cell_size
            );
            self.warned_runaway = true;
        }
        let mut ids: Vec<ObstacleId> = self.cells.drain().flat_map(|(_, ids)| ids).collect();
        ids.sort_unstable_by_key(|id| id.to_bits());
        ids.dedup();
        self.collapsed.extend(ids);
        self.degraded = true;
    }
}

/// Number of cells in an inclusive key range, or `None` if it does not fit
/// in a `u64`.
fn span(x0: i64, y0: i64, x1: i64, y1: i64) -> Option<u64> {
    let w = u64::try_from(x1 - x0 + 1).ok()?;
    let h = u64::try_from(y1 - y0 + 1).ok()?;
    w.checked_mul(h)
}
