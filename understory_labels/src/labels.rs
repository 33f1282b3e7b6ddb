// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The label manager: per-frame placement and occlusion.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_isect::{Obb, SpatialIndex};

use crate::frame::{Frame, label_at, label_at_mut};
use crate::picking::FeatureHit;
use crate::{
    Anchor, DebugFlags, Label, LabelHandle, LabelTile, LabelsConfig, LabelsError, StyleId, View,
};

/// Counts from the last [`Labels::update_labels`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Labels collected from tiles.
    pub collected: usize,
    /// Labels accepted for display.
    pub visible: usize,
    /// Labels hidden by occlusion.
    pub occluded: usize,
}

/// A candidate box tested during placement, recorded with [`DebugFlags::LABELS`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DebugBox {
    /// Label the box belongs to.
    pub handle: LabelHandle,
    /// Collision box tested.
    pub obb: Obb,
    /// Anchor the box was tested at.
    pub anchor: Anchor,
    /// Whether the box was free.
    pub accepted: bool,
}

/// Parent facts a child needs during placement.
#[derive(Copy, Clone, Debug)]
struct ParentState {
    entry: usize,
    occluded: bool,
    obb: Option<Obb>,
}

/// Places labels each frame so that no two accepted boxes overlap.
///
/// Each [`update_labels`](Self::update_labels) call collects the labels of the
/// given tiles and styles, projects them, sorts them by priority and accepts
/// them greedily against a screen-space collision grid. Results are written
/// back into the labels; the manager itself keeps only reusable buffers,
/// statistics, and the data picking needs.
#[derive(Debug)]
pub struct Labels {
    config: LabelsConfig,
    index: SpatialIndex<usize>,
    stats: FrameStats,
    debug_boxes: Vec<DebugBox>,
    /// Count of frames run, stamped on every label a frame resolves.
    pub(crate) pass: u64,
    pub(crate) picked: Vec<FeatureHit>,
}

impl Default for Labels {
    fn default() -> Self {
        Self::from_valid(LabelsConfig::default())
    }
}

impl Labels {
    /// A manager with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with `config`, after validating it.
    pub fn with_config(config: LabelsConfig) -> Result<Self, LabelsError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: LabelsConfig) -> Self {
        Self {
            index: SpatialIndex::new(
                (config.grid_cols, config.grid_rows),
                kurbo::Size::ZERO,
            ),
            config,
            stats: FrameStats::default(),
            debug_boxes: Vec::new(),
            pass: 0,
            picked: Vec::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &LabelsConfig {
        &self.config
    }

    /// Replace the debug switches.
    pub fn set_debug_flags(&mut self, flags: DebugFlags) {
        self.config.debug = flags;
    }

    /// Counts from the last frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Candidate boxes tested in the last frame, when [`DebugFlags::LABELS`] is set.
    pub fn debug_boxes(&self) -> &[DebugBox] {
        &self.debug_boxes
    }

    /// Run one frame of placement.
    ///
    /// Labels of `tiles` whose style is in `styles` and whose tile zoom window
    /// holds the view's zoom are projected and resolved; each collected label
    /// then advances its fade by `dt` seconds. Identical inputs always give
    /// identical results.
    pub fn update_labels<T: LabelTile>(
        &mut self,
        view: &View,
        dt: f32,
        styles: &[StyleId],
        tiles: &mut [T],
    ) {
        self.pass = self.pass.wrapping_add(1);
        let mut frame = Frame::build(view, styles, tiles);

        let dims = (self.config.grid_cols, self.config.grid_rows);
        if self.index.dims() != dims || self.index.screen() != view.size() {
            self.index.resize(dims, view.size());
        } else {
            self.index.clear();
        }
        self.debug_boxes.clear();

        self.handle_occlusions(&mut frame, view, tiles);

        let mut stats = FrameStats {
            collected: frame.entries.len(),
            ..FrameStats::default()
        };
        for (rank, &ei) in frame.order.iter().enumerate() {
            let entry = frame.entries[ei];
            let Some(label) = label_at_mut(tiles, &entry) else {
                continue;
            };
            label.resolve(
                entry.occluded,
                u32::try_from(rank).unwrap_or(u32::MAX),
                self.pass,
            );
            label.eval_state(dt, &self.config.fade);
            if entry.occluded {
                stats.occluded += 1;
            } else {
                stats.visible += 1;
            }
        }
        self.stats = stats;
        log::debug!(
            "labels: {} collected, {} visible, {} occluded",
            stats.collected,
            stats.visible,
            stats.occluded
        );
    }

    fn handle_occlusions<T: LabelTile>(&mut self, frame: &mut Frame, view: &View, tiles: &mut [T]) {
        let all_labels = self.config.debug.contains(DebugFlags::ALL_LABELS);
        let record = self.config.debug.contains(DebugFlags::LABELS);
        let viewport = Rect::from_origin_size(kurbo::Point::ZERO, view.size());

        for pos in 0..frame.order.len() {
            let ei = frame.order[pos];
            let entry = frame.entries[ei];
            let parent = entry.parent.map(|pi| {
                let p = &frame.entries[pi];
                ParentState {
                    entry: pi,
                    occluded: p.occluded,
                    obb: label_at(&*tiles, p).map(Label::screen_box),
                }
            });
            let Some(label) = label_at_mut(tiles, &entry) else {
                continue;
            };

            let accepted = if view.is_empty() {
                None
            } else if all_labels {
                label.attach(None);
                label.set_anchor_index(0);
                Some(0)
            } else {
                let debug = if record {
                    Some(&mut self.debug_boxes)
                } else {
                    None
                };
                place(&self.index, frame, ei, parent, label, viewport, debug)
            };

            match accepted {
                Some(anchor) => {
                    label.set_anchor_index(anchor);
                    let obb = label.collision_box();
                    let origin = label.screen_origin();
                    let group = label.options().repeat_group;
                    if record {
                        log::debug!("label {:?} placed at {:?}", entry.handle, label.anchor());
                    }
                    frame.entries[ei].key = Some(self.index.insert(obb, ei));
                    frame.entries[ei].occluded = false;
                    if let Some(group) = group {
                        frame.record_repeat(group, ei, origin);
                    }
                }
                None => {
                    frame.entries[ei].occluded = true;
                    if record {
                        log::debug!("label {:?} occluded", entry.handle);
                    }
                    if entry.required
                        && let Some(p) = parent
                        && !p.occluded
                    {
                        // The pair is all or nothing: a required child that
                        // cannot be placed takes its parent down.
                        self.take_down(frame, p.entry);
                    }
                }
            }
        }
    }

    /// Hide an accepted label and everything hanging off it, freeing their
    /// boxes and repeat positions for the labels that come later.
    ///
    /// A required label going down takes its own parent with it.
    fn take_down(&mut self, frame: &mut Frame, ei: usize) {
        let mut cursor = Some(ei);
        while let Some(top) = cursor {
            for e in 0..frame.entries.len() {
                if e == top || frame.descends_from(e, top) {
                    frame.entries[e].occluded = true;
                    if let Some(key) = frame.entries[e].key.take() {
                        self.index.remove(key);
                    }
                    frame.forget_repeat(e);
                }
            }
            let entry = &frame.entries[top];
            cursor = entry
                .parent
                .filter(|&p| entry.required && !frame.entries[p].occluded);
        }
    }
}

/// Whether any part of `obb` is on a screen-sized `viewport`.
fn on_screen(obb: &Obb, viewport: Rect) -> bool {
    let b = obb.bounding_box();
    b.x1 >= viewport.x0 && b.x0 <= viewport.x1 && b.y1 >= viewport.y0 && b.y0 <= viewport.y1
}

/// Find the anchor a label can be accepted at, or `None` if it is occluded.
fn place(
    index: &SpatialIndex<usize>,
    frame: &Frame,
    ei: usize,
    parent: Option<ParentState>,
    label: &mut Label,
    viewport: Rect,
    mut debug: Option<&mut Vec<DebugBox>>,
) -> Option<usize> {
    let entry = &frame.entries[ei];
    let link = entry.link;
    match parent {
        Some(p) if p.occluded => return None,
        Some(p) => label.attach(if link.is_some_and(|l| l.inherit_position) {
            p.obb
        } else {
            None
        }),
        None => label.attach(None),
    }
    label.set_anchor_index(0);
    if !label.fits() {
        return None;
    }

    let opts = label.options();
    let anchors = opts.anchors;
    let required = opts.required;
    if !opts.collide || anchors.is_empty() {
        if anchors.is_empty() {
            log::trace!("label {:?} has no anchors; placing it without collision", entry.handle);
        }
        return on_screen(&label.screen_box(), viewport).then_some(0);
    }
    if let Some(group) = opts.repeat_group
        && frame.repeats_near(group, label.screen_origin(), opts.repeat_distance)
    {
        return None;
    }
    if parent.is_some() && link.is_some_and(|l| l.inherit_visibility) {
        return Some(0);
    }

    let own_parent = parent.map(|p| p.entry);
    for i in 0..anchors.len() {
        label.set_anchor_index(i);
        let obb = label.collision_box();
        let free = on_screen(&obb, viewport)
            && index
                .find_intersecting(&obb, |_, &other| Some(other) != own_parent)
                .is_none();
        if let Some(debug) = debug.as_deref_mut() {
            debug.push(DebugBox {
                handle: entry.handle,
                obb,
                anchor: label.anchor(),
                accepted: free,
            });
        }
        if free {
            return Some(i);
        }
    }

    // A parentless required label only yields to earlier required labels.
    if required && parent.is_none() {
        for i in 0..anchors.len() {
            label.set_anchor_index(i);
            let obb = label.collision_box();
            if on_screen(&obb, viewport)
                && index
                    .find_intersecting(&obb, |_, &other| frame.entries[other].required)
                    .is_none()
            {
                return Some(i);
            }
        }
    }
    None
}
