// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid over the viewport.
//!
//! The grid buckets boxes into a fixed number of cells covering the screen and
//! answers queries by touching only the cells overlapping the query box. Boxes
//! extending past the screen edge are clamped into the border cells, so the
//! broad phase never misses a pair: two boxes whose bounds overlap always share
//! at least one cell.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashSet;
use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;

use crate::obb::Obb;

/// Handle for a box stored in a [`SpatialIndex`].
///
/// Keys are generational: a key to a removed box is never confused with the
/// key of a box that later reuses its slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Slot indices are 32-bit; a frame never holds more than u32::MAX boxes."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Inclusive range of grid cells covered by a box.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellRange {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

#[derive(Clone, Debug)]
struct Entry<P> {
    obb: Obb,
    range: CellRange,
    payload: P,
}

#[derive(Clone, Debug)]
struct Slot<P> {
    generation: u32,
    entry: Option<Entry<P>>,
}

/// Uniform grid of screen cells holding oriented boxes with payloads.
///
/// The broad phase compares axis-aligned bounds cell by cell; candidates are
/// then confirmed with the exact [`Obb::intersects`] test, so a query reports
/// an intersection if and only if the boxes really touch.
///
/// # Example
///
/// ```rust
/// use kurbo::{Point, Size, Vec2};
/// use understory_isect::{Obb, SpatialIndex};
///
/// let mut index = SpatialIndex::new((4, 4), Size::new(256.0, 256.0));
/// let a = Obb::axis_aligned(Point::new(128.0, 128.0), Vec2::new(5.0, 5.0));
/// index.insert(a, "a");
///
/// let near = Obb::axis_aligned(Point::new(136.0, 128.0), Vec2::new(5.0, 5.0));
/// let far = Obb::axis_aligned(Point::new(40.0, 40.0), Vec2::new(5.0, 5.0));
/// assert!(index.intersects(&near));
/// assert!(!index.intersects(&far));
/// ```
pub struct SpatialIndex<P> {
    cols: u32,
    rows: u32,
    screen: Size,
    cell_size: Size,
    cells: Vec<SmallVec<[u32; 8]>>,
    slots: Vec<Slot<P>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<P> Debug for SpatialIndex<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let occupied = self.cells.iter().filter(|c| !c.is_empty()).count();
        f.debug_struct("SpatialIndex")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("screen", &self.screen)
            .field("cell_size", &self.cell_size)
            .field("boxes", &self.len)
            .field("occupied_cells", &occupied)
            .finish_non_exhaustive()
    }
}

impl<P> Default for SpatialIndex<P> {
    fn default() -> Self {
        Self::new((1, 1), Size::ZERO)
    }
}

/// Map a coordinate to a cell along one axis, clamped into `0..count`.
///
/// Rounds towards -∞ so the mapping is monotonic; equal coordinates always
/// land in the same cell.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The value is floored and clamped into 0..count before the cast."
)]
#[inline]
fn cell_coord(value: f64, cell: f64, count: u32) -> u32 {
    let t = value / cell;
    if !t.is_finite() {
        return if t > 0.0 { count - 1 } else { 0 };
    }
    let mut coord = t as i64;
    if t < 0.0 && (coord as f64) > t {
        coord = coord.saturating_sub(1);
    }
    coord.clamp(0, i64::from(count) - 1) as u32
}

impl<P> SpatialIndex<P> {
    /// Create an index covering `screen` with `dims` = (columns, rows) cells.
    pub fn new(dims: (u32, u32), screen: Size) -> Self {
        let mut index = Self {
            cols: 1,
            rows: 1,
            screen: Size::ZERO,
            cell_size: Size::new(1.0, 1.0),
            cells: Vec::new(),
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        };
        index.resize(dims, screen);
        index
    }

    /// Reconfigure the cell count and cell size. All stored boxes are dropped.
    ///
    /// Zero dimensions are treated as one cell. An empty screen keeps a single
    /// unit cell size so that coordinates never divide by zero.
    pub fn resize(&mut self, dims: (u32, u32), screen: Size) {
        self.cols = dims.0.max(1);
        self.rows = dims.1.max(1);
        self.screen = screen;
        let w = screen.width / f64::from(self.cols);
        let h = screen.height / f64::from(self.rows);
        self.cell_size = Size::new(
            if w.is_finite() && w > 0.0 { w } else { 1.0 },
            if h.is_finite() && h > 0.0 { h } else { 1.0 },
        );
        let count = self.cols as usize * self.rows as usize;
        self.cells.clear();
        self.cells.resize_with(count, SmallVec::new);
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    /// Remove every box but keep the grid configuration and allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    /// Grid dimensions as (columns, rows).
    pub fn dims(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// The screen size the grid was last resized to.
    pub fn screen(&self) -> Size {
        self.screen
    }

    /// Number of stored boxes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no boxes are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_range(&self, rect: Rect) -> CellRange {
        let x0 = cell_coord(rect.x0, self.cell_size.width, self.cols);
        let x1 = cell_coord(rect.x1, self.cell_size.width, self.cols);
        let y0 = cell_coord(rect.y0, self.cell_size.height, self.rows);
        let y1 = cell_coord(rect.y1, self.cell_size.height, self.rows);
        CellRange {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    #[inline]
    fn cell_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.cols as usize + x as usize
    }

    fn entry(&self, slot: u32) -> Option<(Key, &Entry<P>)> {
        let s = self.slots.get(slot as usize)?;
        let entry = s.entry.as_ref()?;
        Some((Key::new(slot as usize, s.generation), entry))
    }

    /// Insert a box into every cell it overlaps.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Slot indices are 32-bit; a frame never holds more than u32::MAX boxes."
    )]
    pub fn insert(&mut self, obb: Obb, payload: P) -> Key {
        let range = self.cell_range(obb.bounding_box());
        let idx = if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry: None,
            });
            self.slots.len() - 1
        };
        let generation = self.slots[idx].generation.wrapping_add(1);
        self.slots[idx] = Slot {
            generation,
            entry: Some(Entry {
                obb,
                range,
                payload,
            }),
        };
        for y in range.y0..=range.y1 {
            for x in range.x0..=range.x1 {
                let cell = self.cell_index(x, y);
                self.cells[cell].push(idx as u32);
            }
        }
        self.len += 1;
        Key::new(idx, generation)
    }

    /// Remove a box, returning its payload. Stale keys are ignored.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        let slot = self.slots.get_mut(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        let entry = slot.entry.take()?;
        let range = entry.range;
        for y in range.y0..=range.y1 {
            for x in range.x0..=range.x1 {
                let cell = self.cell_index(x, y);
                let slots = &mut self.cells[cell];
                if let Some(pos) = slots.iter().position(|&s| s as usize == key.idx()) {
                    slots.swap_remove(pos);
                }
            }
        }
        self.free_list.push(key.idx());
        self.len -= 1;
        Some(entry.payload)
    }

    /// Look up a live box and its payload.
    pub fn get(&self, key: Key) -> Option<(&Obb, &P)> {
        let slot = self.slots.get(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        let entry = slot.entry.as_ref()?;
        Some((&entry.obb, &entry.payload))
    }

    /// Whether `obb` intersects any stored box.
    pub fn intersects(&self, obb: &Obb) -> bool {
        self.find_intersecting(obb, |_, _| true).is_some()
    }

    /// Find a stored box intersecting `obb` whose payload passes `filter`.
    ///
    /// The search stops at the first match; which match is reported when
    /// several exist depends on cell order but is stable for a given grid.
    pub fn find_intersecting<F>(&self, obb: &Obb, mut filter: F) -> Option<Key>
    where
        F: FnMut(Key, &P) -> bool,
    {
        let range = self.cell_range(obb.bounding_box());
        for y in range.y0..=range.y1 {
            for x in range.x0..=range.x1 {
                for &slot in &self.cells[self.cell_index(x, y)] {
                    let Some((key, entry)) = self.entry(slot) else {
                        continue;
                    };
                    if entry.obb.intersects(obb) && filter(key, &entry.payload) {
                        return Some(key);
                    }
                }
            }
        }
        None
    }

    /// Visit every stored box intersecting `obb`, each exactly once.
    pub fn visit_intersecting<F>(&self, obb: &Obb, mut f: F)
    where
        F: FnMut(Key, &P),
    {
        let range = self.cell_range(obb.bounding_box());
        let mut seen: HashSet<u32> = HashSet::new();
        for y in range.y0..=range.y1 {
            for x in range.x0..=range.x1 {
                for &slot in &self.cells[self.cell_index(x, y)] {
                    if !seen.insert(slot) {
                        continue;
                    }
                    let Some((key, entry)) = self.entry(slot) else {
                        continue;
                    };
                    if entry.obb.intersects(obb) {
                        f(key, &entry.payload);
                    }
                }
            }
        }
    }

    /// Visit every stored box containing the point.
    pub fn visit_point<F>(&self, pt: Point, mut f: F)
    where
        F: FnMut(Key, &P),
    {
        let x = cell_coord(pt.x, self.cell_size.width, self.cols);
        let y = cell_coord(pt.y, self.cell_size.height, self.rows);
        for &slot in &self.cells[self.cell_index(x, y)] {
            let Some((key, entry)) = self.entry(slot) else {
                continue;
            };
            if entry.obb.contains(pt) {
                f(key, &entry.payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use kurbo::Vec2;

    fn square(x: f64, y: f64, half: f64) -> Obb {
        Obb::axis_aligned(Point::new(x, y), Vec2::new(half, half))
    }

    #[test]
    fn touching_boxes_share_a_cell_on_the_boundary() {
        // 10 px cells; the boxes meet exactly on the cell boundary y = 130.
        let mut index = SpatialIndex::new((25, 25), Size::new(250.0, 250.0));
        index.insert(square(125.0, 125.0, 5.0), 0_u32);
        assert!(index.intersects(&square(125.0, 135.0, 5.0)));
        assert!(!index.intersects(&square(125.0, 135.5, 5.0)));
    }

    #[test]
    fn boxes_past_the_screen_edge_are_clamped() {
        let mut index = SpatialIndex::new((4, 4), Size::new(100.0, 100.0));
        index.insert(square(-20.0, -20.0, 5.0), 0_u32);
        index.insert(square(130.0, 50.0, 40.0), 1_u32);

        assert!(index.intersects(&square(-24.0, -16.0, 1.0)));
        let mut hits = vec![];
        index.visit_intersecting(&square(95.0, 50.0, 2.0), |_, p| hits.push(*p));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn multi_cell_box_is_visited_once() {
        let mut index = SpatialIndex::new((8, 8), Size::new(80.0, 80.0));
        index.insert(square(40.0, 40.0, 35.0), 7_u32);
        let mut hits = vec![];
        index.visit_intersecting(&square(40.0, 40.0, 30.0), |_, p| hits.push(*p));
        assert_eq!(hits, vec![7]);
    }

    #[test]
    fn remove_and_stale_keys() {
        let mut index = SpatialIndex::new((2, 2), Size::new(100.0, 100.0));
        let k = index.insert(square(50.0, 50.0, 10.0), 1_u32);
        assert_eq!(index.len(), 1);
        assert_eq!(index.remove(k), Some(1));
        assert!(index.is_empty());
        assert!(!index.intersects(&square(50.0, 50.0, 1.0)));

        // The slot is reused but the old key stays dead.
        let k2 = index.insert(square(10.0, 10.0, 1.0), 2_u32);
        assert_ne!(k, k2);
        assert_eq!(index.remove(k), None);
        assert_eq!(index.get(k2).map(|(_, p)| *p), Some(2));
    }

    #[test]
    fn filter_skips_rejected_payloads() {
        let mut index = SpatialIndex::new((1, 1), Size::new(100.0, 100.0));
        index.insert(square(50.0, 50.0, 10.0), 1_u32);
        index.insert(square(52.0, 50.0, 10.0), 2_u32);
        let hit = index.find_intersecting(&square(50.0, 50.0, 1.0), |_, p| *p == 2);
        assert_eq!(hit.and_then(|k| index.get(k)).map(|(_, p)| *p), Some(2));
        assert!(
            index
                .find_intersecting(&square(50.0, 50.0, 1.0), |_, p| *p == 3)
                .is_none()
        );
    }

    #[test]
    fn point_queries_use_the_exact_box() {
        let mut index = SpatialIndex::new((4, 4), Size::new(256.0, 256.0));
        index.insert(
            Obb::rotated(Point::new(64.0, 64.0), Vec2::new(20.0, 2.0), 0.5),
            1_u32,
        );
        let mut hits = vec![];
        index.visit_point(Point::new(64.0, 64.0), |_, p| hits.push(*p));
        assert_eq!(hits, vec![1]);
        hits.clear();
        index.visit_point(Point::new(64.0, 50.0), |_, p| hits.push(*p));
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_screen_still_answers_queries() {
        let mut index = SpatialIndex::new((0, 0), Size::ZERO);
        assert_eq!(index.dims(), (1, 1));
        index.insert(square(0.0, 0.0, 1.0), 0_u32);
        assert!(index.intersects(&square(1.5, 0.0, 1.0)));
        index.clear();
        assert!(!index.intersects(&square(1.5, 0.0, 1.0)));
    }

    #[test]
    fn cell_coord_floors_and_clamps() {
        assert_eq!(cell_coord(-0.5, 10.0, 4), 0);
        assert_eq!(cell_coord(9.999, 10.0, 4), 0);
        assert_eq!(cell_coord(10.0, 10.0, 4), 1);
        assert_eq!(cell_coord(1e30, 10.0, 4), 3);
        assert_eq!(cell_coord(f64::INFINITY, 10.0, 4), 3);
        assert_eq!(cell_coord(f64::NEG_INFINITY, 10.0, 4), 0);
    }
}
