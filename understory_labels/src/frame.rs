// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame collection: which labels take part, how they relate, and in
//! which order they are placed.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;
use smallvec::SmallVec;
use understory_isect::Key;

use crate::{Label, LabelHandle, LabelTile, ParentLink, StyleId, View};

/// Longest parent chain followed before the link is treated as broken.
const MAX_PARENT_DEPTH: u8 = 8;

/// One collected label and its per-frame bookkeeping.
#[derive(Copy, Clone, Debug)]
pub(crate) struct FrameEntry {
    pub(crate) tile: usize,
    pub(crate) set: usize,
    pub(crate) label: usize,
    pub(crate) handle: LabelHandle,
    pub(crate) link: Option<ParentLink>,
    /// Entry index of the live parent.
    pub(crate) parent: Option<usize>,
    own_priority: f32,
    /// Sort priority: the larger of the label's and its ancestors'.
    pub(crate) priority: f32,
    pub(crate) depth: u8,
    pub(crate) required: bool,
    /// Box inserted into the collision index.
    pub(crate) key: Option<Key>,
    pub(crate) occluded: bool,
}

impl FrameEntry {
    fn new(tile: usize, set: usize, index: usize, handle: LabelHandle, label: &Label) -> Self {
        let priority = label.options().priority;
        Self {
            tile,
            set,
            label: index,
            handle,
            link: label.parent(),
            parent: None,
            own_priority: priority,
            priority,
            depth: 0,
            required: label.options().required,
            key: None,
            occluded: true,
        }
    }
}

/// The labels collected for one frame.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    pub(crate) entries: Vec<FrameEntry>,
    /// Entry indices in placement order.
    pub(crate) order: Vec<usize>,
    /// Accepted positions per repeat group, tagged with their entry.
    repeats: HashMap<u64, SmallVec<[(usize, Point); 4]>>,
}

impl Frame {
    /// Collect live labels from `tiles`, project them, link parents and sort.
    pub(crate) fn build<T: LabelTile>(view: &View, styles: &[StyleId], tiles: &mut [T]) -> Self {
        let mut frame = Self::default();
        let screen = view.size();
        for (ti, tile) in tiles.iter_mut().enumerate() {
            if !tile.zoom_window().contains(&view.zoom()) {
                continue;
            }
            let mvp = view.tile_mvp(&tile.model_matrix());
            for (si, set) in tile.label_sets_mut().iter_mut().enumerate() {
                if !styles.contains(&set.style()) {
                    continue;
                }
                let set_id = set.id();
                for (li, label) in set.labels_mut().iter_mut().enumerate() {
                    if label.is_dead() {
                        continue;
                    }
                    label.update(&mvp, screen);
                    frame
                        .entries
                        .push(FrameEntry::new(ti, si, li, LabelHandle::new(set_id, li), label));
                }
            }
        }
        frame.link_parents();
        frame.sort();
        frame
    }

    fn link_parents(&mut self) {
        let lookup: HashMap<LabelHandle, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.handle, i))
            .collect();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let Some(link) = entry.link else {
                continue;
            };
            match lookup.get(&link.handle) {
                Some(&p) if p != i => entry.parent = Some(p),
                _ => log::trace!(
                    "parent {:?} of label {:?} is not collected; placing it alone",
                    link.handle,
                    entry.handle
                ),
            }
        }

        let parents: Vec<Option<usize>> = self.entries.iter().map(|e| e.parent).collect();
        for i in 0..self.entries.len() {
            let mut priority = self.entries[i].own_priority;
            let mut depth = 0_u8;
            let mut cursor = parents[i];
            while let Some(p) = cursor {
                if depth == MAX_PARENT_DEPTH {
                    log::trace!(
                        "parent chain of label {:?} is cyclic or too deep; placing it alone",
                        self.entries[i].handle
                    );
                    self.entries[i].parent = None;
                    priority = self.entries[i].own_priority;
                    depth = 0;
                    break;
                }
                depth += 1;
                let ancestor = self.entries[p].own_priority;
                if ancestor.total_cmp(&priority).is_gt() {
                    priority = ancestor;
                }
                cursor = parents[p];
            }
            self.entries[i].priority = priority;
            self.entries[i].depth = depth;
        }
    }

    /// Stable sort by priority, then depth, required labels first.
    fn sort(&mut self) {
        let entries = &self.entries;
        self.order = (0..entries.len()).collect();
        self.order.sort_by(|&a, &b| {
            let (a, b) = (&entries[a], &entries[b]);
            a.priority
                .total_cmp(&b.priority)
                .then(a.depth.cmp(&b.depth))
                .then(b.required.cmp(&a.required))
        });
    }

    /// Whether a label of `group` was already accepted within `distance` of `at`.
    pub(crate) fn repeats_near(&self, group: u64, at: Point, distance: f64) -> bool {
        self.repeats
            .get(&group)
            .is_some_and(|pts| pts.iter().any(|(_, p)| p.distance(at) < distance))
    }

    pub(crate) fn record_repeat(&mut self, group: u64, entry: usize, at: Point) {
        self.repeats.entry(group).or_default().push((entry, at));
    }

    /// Drop the repeat positions recorded for `entry`.
    pub(crate) fn forget_repeat(&mut self, entry: usize) {
        for pts in self.repeats.values_mut() {
            pts.retain(|(e, _)| *e != entry);
        }
    }

    /// Whether `ancestor` is on the parent chain of `entry`.
    pub(crate) fn descends_from(&self, entry: usize, ancestor: usize) -> bool {
        let mut cursor = self.entries.get(entry).and_then(|e| e.parent);
        for _ in 0..MAX_PARENT_DEPTH {
            match cursor {
                Some(p) if p == ancestor => return true,
                Some(p) => cursor = self.entries[p].parent,
                None => return false,
            }
        }
        false
    }
}

/// The label behind a frame entry.
pub(crate) fn label_at<'a, T: LabelTile>(tiles: &'a [T], entry: &FrameEntry) -> Option<&'a Label> {
    tiles
        .get(entry.tile)?
        .label_sets()
        .get(entry.set)?
        .labels()
        .get(entry.label)
}

/// Mutable label behind a frame entry.
pub(crate) fn label_at_mut<'a, T: LabelTile>(
    tiles: &'a mut [T],
    entry: &FrameEntry,
) -> Option<&'a mut Label> {
    tiles
        .get_mut(entry.tile)?
        .label_sets_mut()
        .get_mut(entry.set)?
        .labels_mut()
        .get_mut(entry.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LabelGeometry, LabelOptions, LabelSet, Tile, TileId};
    use glam::DMat4;
    use kurbo::Size;

    fn label(priority: f32, required: bool) -> Label {
        Label::new(
            LabelGeometry::Point(Point::new(0.5, 0.5)),
            Size::new(10.0, 10.0),
            LabelOptions {
                priority,
                required,
                ..LabelOptions::default()
            },
        )
    }

    fn view() -> View {
        View::unit_square(Size::new(256.0, 256.0))
    }

    #[test]
    fn children_sort_after_parents_and_required_first() {
        let mut set = LabelSet::new(StyleId(0));
        let a = set.push(label(1.0, false));
        let parent = set.push(label(2.0, false));
        let child = set.push(label(0.0, false));
        set.push(label(1.0, true));
        set.set_parent(child, parent, false, true);
        let mut tiles = [Tile::new(TileId::default(), DMat4::IDENTITY).with_set(set)];

        let frame = Frame::build(&view(), &[StyleId(0)], &mut tiles);
        let handles: Vec<LabelHandle> = frame.order.iter().map(|&i| frame.entries[i].handle).collect();
        let required = tiles[0].label_sets()[0].handle(3);
        assert_eq!(handles, [required, a, parent, child]);
        let child_entry = frame.entries.iter().find(|e| e.handle == child).unwrap();
        assert_eq!(child_entry.priority, 2.0);
        assert_eq!(child_entry.depth, 1);
    }

    #[test]
    fn unlisted_styles_and_zoom_windows_are_skipped() {
        let mut shown = LabelSet::new(StyleId(0));
        shown.push(label(0.0, false));
        let mut hidden = LabelSet::new(StyleId(1));
        hidden.push(label(0.0, false));
        let mut far = LabelSet::new(StyleId(0));
        far.push(label(0.0, false));
        let mut tiles = [
            Tile::new(TileId::new(0, 0, 0), DMat4::IDENTITY)
                .with_set(shown)
                .with_set(hidden),
            Tile::new(TileId::new(1, 0, 0), DMat4::IDENTITY)
                .with_set(far)
                .with_zoom_window(10.0..12.0),
        ];
        let frame = Frame::build(&view(), &[StyleId(0)], &mut tiles);
        assert_eq!(frame.entries.len(), 1);
        assert_eq!(frame.entries[0].tile, 0);
    }

    #[test]
    fn cyclic_parents_are_dropped() {
        let mut set = LabelSet::new(StyleId(0));
        let a = set.push(label(0.0, false));
        let b = set.push(label(1.0, false));
        set.set_parent(a, b, false, false);
        set.set_parent(b, a, false, false);
        let mut tiles = [Tile::new(TileId::default(), DMat4::IDENTITY).with_set(set)];
        let frame = Frame::build(&view(), &[StyleId(0)], &mut tiles);
        assert!(frame.entries.iter().all(|e| e.parent.is_none()));
    }

    #[test]
    fn repeat_distance_is_per_group() {
        let mut frame = Frame::default();
        frame.record_repeat(7, 0, Point::new(0.0, 0.0));
        assert!(frame.repeats_near(7, Point::new(10.0, 0.0), 20.0));
        assert!(!frame.repeats_near(7, Point::new(30.0, 0.0), 20.0));
        assert!(!frame.repeats_near(8, Point::new(10.0, 0.0), 20.0));
        frame.forget_repeat(0);
        assert!(!frame.repeats_near(7, Point::new(10.0, 0.0), 20.0));
    }

    #[test]
    fn nan_parent_priority_still_sorts_first() {
        let mut set = LabelSet::new(StyleId(0));
        let child = set.push(label(1.0, false));
        let parent = set.push(label(f32::NAN, false));
        set.set_parent(child, parent, false, false);
        let mut tiles = [Tile::new(TileId::default(), DMat4::IDENTITY).with_set(set)];
        let frame = Frame::build(&view(), &[StyleId(0)], &mut tiles);
        let handles: Vec<LabelHandle> = frame.order.iter().map(|&i| frame.entries[i].handle).collect();
        assert_eq!(handles, [parent, child]);
    }

    #[test]
    fn grandchildren_descend_from_the_root() {
        let mut set = LabelSet::new(StyleId(0));
        let root = set.push(label(0.0, false));
        let middle = set.push(label(0.0, false));
        let leaf = set.push(label(0.0, false));
        let other = set.push(label(0.0, false));
        set.set_parent(middle, root, false, false);
        set.set_parent(leaf, middle, false, false);
        let mut tiles = [Tile::new(TileId::default(), DMat4::IDENTITY).with_set(set)];
        let frame = Frame::build(&view(), &[StyleId(0)], &mut tiles);
        let index = |h: LabelHandle| frame.entries.iter().position(|e| e.handle == h).unwrap();
        assert!(frame.descends_from(index(leaf), index(root)));
        assert!(frame.descends_from(index(middle), index(root)));
        assert!(!frame.descends_from(index(root), index(leaf)));
        assert!(!frame.descends_from(index(other), index(root)));
    }
}
