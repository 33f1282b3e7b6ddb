// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single label: geometry, options, screen placement and lifecycle.

use alloc::sync::Arc;
use alloc::vec::Vec;

use glam::DMat4;
use kurbo::{Point, Size, Vec2};
use understory_isect::Obb;

use crate::state::Fade;
use crate::{Anchor, AnchorCandidates, FadeParams, LabelHandle, LabelState, Properties};

/// Kind of geometry a label follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LabelType {
    /// Placed at a point.
    Point,
    /// Placed along a straight segment.
    Line,
    /// Placed along a polyline.
    Curve,
}

/// Tile-local geometry a label is placed on.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelGeometry {
    /// A single point.
    Point(Point),
    /// A straight segment. The label sits at its midpoint, rotated along it.
    Line {
        /// First endpoint.
        start: Point,
        /// Second endpoint.
        end: Point,
    },
    /// A polyline. The label sits at half its screen length.
    Curve(Vec<Point>),
}

impl LabelGeometry {
    /// The kind of geometry.
    pub fn label_type(&self) -> LabelType {
        match self {
            Self::Point(_) => LabelType::Point,
            Self::Line { .. } => LabelType::Line,
            Self::Curve(_) => LabelType::Curve,
        }
    }
}

/// Placement options for a label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelOptions {
    /// Placement precedence. Lower values are placed first.
    pub priority: f32,
    /// Whether the label must be shown.
    ///
    /// A required label without a parent is accepted over any collision with
    /// non-required labels. A required child that cannot be placed takes its
    /// parent down with it.
    pub required: bool,
    /// Whether the label takes part in collision at all.
    pub collide: bool,
    /// Whether picking queries may report the label when asked for
    /// interactive labels only.
    pub interactive: bool,
    /// Screen-space offset in pixels, in the label's own frame.
    pub offset: Vec2,
    /// Anchor candidates, tried in order.
    pub anchors: AnchorCandidates,
    /// Extra padding in pixels around the collision box. Picking ignores it.
    pub buffer: f64,
    /// Labels sharing a group keep at least `repeat_distance` apart.
    pub repeat_group: Option<u64>,
    /// Minimum screen distance between labels of the same repeat group.
    pub repeat_distance: f64,
    /// Properties of the source feature.
    pub properties: Option<Arc<Properties>>,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            priority: f32::MAX,
            required: false,
            collide: true,
            interactive: false,
            offset: Vec2::ZERO,
            anchors: AnchorCandidates::default(),
            buffer: 0.0,
            repeat_group: None,
            repeat_distance: 0.0,
            properties: None,
        }
    }
}

/// A label's link to its parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParentLink {
    /// The parent label.
    pub handle: LabelHandle,
    /// Accept the child whenever the parent is accepted, without testing it.
    pub inherit_visibility: bool,
    /// Place the child relative to the parent's accepted box.
    pub inherit_position: bool,
}

/// Screen placement derived from the geometry each frame.
#[derive(Copy, Clone, Debug, PartialEq)]
struct ScreenFrame {
    origin: Point,
    axis: Vec2,
    fits: bool,
}

impl Default for ScreenFrame {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            axis: Vec2::new(1.0, 0.0),
            fits: false,
        }
    }
}

/// Direction of `d` flipped, if needed, so text along it reads left to right.
fn upright(d: Vec2) -> Vec2 {
    if d.x < 0.0 || (d.x == 0.0 && d.y > 0.0) {
        -d
    } else {
        d
    }
}

/// A label placed by [`Labels`](crate::Labels).
///
/// Labels are created by tile builders and owned by a [`LabelSet`](crate::LabelSet).
/// The manager updates their screen placement, resolves their occlusion, and
/// advances their state each frame; renderers read [`screen_box`](Self::screen_box),
/// [`alpha`](Self::alpha) and [`state`](Self::state).
#[derive(Clone, Debug)]
pub struct Label {
    geometry: LabelGeometry,
    dimensions: Size,
    options: LabelOptions,
    parent: Option<ParentLink>,
    frame: ScreenFrame,
    attached: Option<Obb>,
    anchor_index: usize,
    screen_box: Obb,
    occluded: bool,
    resolved: bool,
    rank: Option<u32>,
    pass: Option<u64>,
    fade: Fade,
}

impl Label {
    /// A new label with its text box of `dimensions` pixels.
    pub fn new(geometry: LabelGeometry, dimensions: Size, options: LabelOptions) -> Self {
        Self {
            geometry,
            dimensions,
            options,
            parent: None,
            frame: ScreenFrame::default(),
            attached: None,
            anchor_index: 0,
            screen_box: Obb::axis_aligned(Point::ZERO, Vec2::ZERO),
            occluded: true,
            resolved: false,
            rank: None,
            pass: None,
            fade: Fade::default(),
        }
    }

    /// Geometry the label follows.
    pub fn geometry(&self) -> &LabelGeometry {
        &self.geometry
    }

    /// Replace the geometry. The label is occluded until the next resolution.
    pub fn set_geometry(&mut self, geometry: LabelGeometry) {
        self.geometry = geometry;
        self.occlude();
    }

    /// Kind of geometry.
    pub fn label_type(&self) -> LabelType {
        self.geometry.label_type()
    }

    /// Text box size in pixels.
    pub fn dimensions(&self) -> Size {
        self.dimensions
    }

    /// Placement options.
    pub fn options(&self) -> &LabelOptions {
        &self.options
    }

    /// Source feature properties.
    pub fn properties(&self) -> Option<&Arc<Properties>> {
        self.options.properties.as_ref()
    }

    /// Parent link, if any.
    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    /// Link this label to `parent`.
    ///
    /// The parent's handle is only a weak reference; if it stops resolving
    /// the label is placed as if it had no parent.
    pub fn set_parent(
        &mut self,
        parent: LabelHandle,
        inherit_visibility: bool,
        inherit_position: bool,
    ) {
        self.parent = Some(ParentLink {
            handle: parent,
            inherit_visibility,
            inherit_position,
        });
        self.occlude();
    }

    /// Remove the parent link.
    pub fn clear_parent(&mut self) {
        self.parent = None;
        self.attached = None;
        self.occlude();
    }

    /// Project the geometry through `mvp` onto a screen of `screen` pixels.
    ///
    /// Returns whether the label can be placed: its reference point projects
    /// and, for line and curve labels, the text fits along the geometry.
    pub fn update(&mut self, mvp: &DMat4, screen: Size) -> bool {
        self.frame = self.project(mvp, screen);
        self.refresh_box();
        self.frame.fits
    }

    fn project(&self, mvp: &DMat4, screen: Size) -> ScreenFrame {
        let project = |p: Point| crate::project_to_screen(mvp, p, screen);
        let placed = |origin: Point, axis: Vec2, length: f64| {
            let perp = Vec2::new(-axis.y, axis.x);
            let offset = axis * self.options.offset.x + perp * self.options.offset.y;
            ScreenFrame {
                origin: origin + offset,
                axis,
                fits: length >= self.dimensions.width,
            }
        };
        let unplaceable = ScreenFrame::default();
        match &self.geometry {
            LabelGeometry::Point(p) => match project(*p) {
                Some(origin) => ScreenFrame {
                    origin: origin + self.options.offset,
                    axis: Vec2::new(1.0, 0.0),
                    fits: true,
                },
                None => unplaceable,
            },
            LabelGeometry::Line { start, end } => {
                let (Some(a), Some(b)) = (project(*start), project(*end)) else {
                    return unplaceable;
                };
                let d = b - a;
                let length = d.hypot();
                if length.is_nan() || length <= 0.0 {
                    return unplaceable;
                }
                placed(a.midpoint(b), upright(d / length), length)
            }
            LabelGeometry::Curve(points) => {
                let mut screen_pts = Vec::with_capacity(points.len());
                for p in points {
                    match project(*p) {
                        Some(s) => screen_pts.push(s),
                        None => return unplaceable,
                    }
                }
                let length: f64 = screen_pts.windows(2).map(|w| (w[1] - w[0]).hypot()).sum();
                if length.is_nan() || length <= 0.0 {
                    return unplaceable;
                }
                let mut remaining = 0.5 * length;
                for w in screen_pts.windows(2) {
                    let d = w[1] - w[0];
                    let seg = d.hypot();
                    if seg <= 0.0 {
                        continue;
                    }
                    if remaining <= seg {
                        let origin = w[0] + d * (remaining / seg);
                        return placed(origin, upright(d / seg), length);
                    }
                    remaining -= seg;
                }
                unplaceable
            }
        }
    }

    /// Unpadded box for `anchor` in the current screen frame.
    fn box_for(&self, anchor: Anchor) -> Obb {
        let half = Vec2::new(0.5 * self.dimensions.width, 0.5 * self.dimensions.height);
        let dir = anchor.direction();
        match self.attached {
            Some(parent) => {
                let ph = parent.half_extents();
                let along = dir.x * (ph.x + half.x) + self.options.offset.x;
                let across = dir.y * (ph.y + half.y) + self.options.offset.y;
                let center = parent.center() + parent.axis() * along + parent.perp() * across;
                Obb::new(center, half, parent.axis())
            }
            None => {
                let axis = self.frame.axis;
                let perp = Vec2::new(-axis.y, axis.x);
                let center = self.frame.origin + axis * (dir.x * half.x) + perp * (dir.y * half.y);
                Obb::new(center, half, axis)
            }
        }
    }

    fn refresh_box(&mut self) {
        self.screen_box = self.box_for(self.anchor());
    }

    /// Whether the last [`update`](Self::update) found the label placeable.
    pub fn fits(&self) -> bool {
        self.frame.fits
    }

    /// Screen point the label hangs off, after its offset.
    pub fn screen_origin(&self) -> Point {
        self.frame.origin
    }

    /// Box at the current anchor, in screen pixels.
    pub fn screen_box(&self) -> Obb {
        self.screen_box
    }

    /// Box used for collision: the screen box grown by the buffer.
    pub fn collision_box(&self) -> Obb {
        let b = self.options.buffer.max(0.0);
        self.screen_box.inflated(b, b)
    }

    /// Index of the current anchor candidate.
    pub fn anchor_index(&self) -> usize {
        self.anchor_index
    }

    /// The current anchor. A label without candidates sits centered.
    pub fn anchor(&self) -> Anchor {
        self.options
            .anchors
            .get(self.anchor_index)
            .unwrap_or(Anchor::Center)
    }

    /// Move to anchor candidate `index` and recompute the screen box.
    pub fn set_anchor_index(&mut self, index: usize) {
        debug_assert!(
            index < self.options.anchors.len().max(1),
            "anchor index {index} out of range"
        );
        self.anchor_index = index;
        self.refresh_box();
    }

    /// Place relative to a parent's box, or detach with `None`.
    pub(crate) fn attach(&mut self, parent: Option<Obb>) {
        self.attached = parent;
        self.refresh_box();
    }

    /// Mark occluded and reset to the first anchor.
    ///
    /// Used when something upstream of the placement changed; the next frame
    /// resolves the label from scratch.
    pub fn occlude(&mut self) {
        self.occluded = true;
        self.anchor_index = 0;
        self.refresh_box();
    }

    /// Whether the last resolution hid the label.
    pub fn is_occluded(&self) -> bool {
        self.occluded
    }

    /// Record the outcome of a resolution pass.
    pub(crate) fn resolve(&mut self, occluded: bool, rank: u32, pass: u64) {
        if occluded && self.anchor_index != 0 {
            self.anchor_index = 0;
            self.refresh_box();
        }
        self.occluded = occluded;
        self.resolved = true;
        self.rank = Some(rank);
        self.pass = Some(pass);
    }

    /// Manager frame count of the last resolution.
    pub(crate) fn resolved_in(&self) -> Option<u64> {
        self.pass
    }

    /// Position in the last resolution order.
    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    /// Advance the lifecycle by `dt` seconds.
    pub fn eval_state(&mut self, dt: f32, fade: &FadeParams) {
        let (fade_in, fade_out) = if self.options.required && !fade.fade_required {
            (0.0, 0.0)
        } else {
            (fade.fade_in, fade.fade_out)
        };
        self.fade
            .advance(self.occluded, self.resolved, dt, fade_in, fade_out);
    }

    /// Lifecycle state.
    pub fn state(&self) -> LabelState {
        self.fade.state
    }

    /// Opacity in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.fade.alpha
    }

    /// Retire the label. Dead labels are never collected again.
    pub fn kill(&mut self) {
        self.fade.kill();
        self.occluded = true;
    }

    /// Whether the label has been retired.
    pub fn is_dead(&self) -> bool {
        self.fade.state == LabelState::Dead
    }
}
