// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera view, tiles, and the projection from tile space to screen pixels.

use alloc::vec::Vec;
use core::ops::Range;

use glam::{DMat4, DVec3, DVec4};
use kurbo::{Point, Size};

use crate::{Label, LabelHandle, LabelSet, StyleId};

/// Clip-space `w` at or below this is behind the camera.
const MIN_CLIP_W: f64 = 1e-9;

/// Project a tile-local point to screen pixels (y down).
///
/// Returns `None` when the point lies at or behind the camera plane.
///
/// ```
/// use glam::DMat4;
/// use kurbo::{Point, Size};
/// use understory_labels::project_to_screen;
///
/// let screen = Size::new(256.0, 256.0);
/// let center = project_to_screen(&DMat4::IDENTITY, Point::ZERO, screen);
/// assert_eq!(center, Some(Point::new(128.0, 128.0)));
/// ```
pub fn project_to_screen(mvp: &DMat4, pt: Point, screen: Size) -> Option<Point> {
    let clip = *mvp * DVec4::new(pt.x, pt.y, 0.0, 1.0);
    if clip.w.is_nan() || clip.w <= MIN_CLIP_W {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let p = Point::new(
        (ndc_x + 1.0) * 0.5 * screen.width,
        (1.0 - ndc_y) * 0.5 * screen.height,
    );
    p.is_finite().then_some(p)
}

/// The camera for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    view_projection: DMat4,
    size: Size,
    zoom: f64,
}

impl View {
    /// A view from a world-to-clip matrix, a screen size in pixels and a zoom level.
    pub fn new(view_projection: DMat4, size: Size, zoom: f64) -> Self {
        Self {
            view_projection,
            size,
            zoom,
        }
    }

    /// A flat view where world `[0, 1]²` fills the screen, `y = 1` at the top.
    ///
    /// ```
    /// use kurbo::{Point, Size};
    /// use understory_labels::View;
    ///
    /// let view = View::unit_square(Size::new(256.0, 256.0));
    /// assert_eq!(view.project(Point::new(0.5, 0.5)), Some(Point::new(128.0, 128.0)));
    /// assert_eq!(view.project(Point::new(1.0, 1.0)), Some(Point::new(256.0, 0.0)));
    /// ```
    pub fn unit_square(size: Size) -> Self {
        let vp = DMat4::from_translation(DVec3::new(-1.0, -1.0, 0.0))
            * DMat4::from_scale(DVec3::new(2.0, 2.0, 1.0));
        Self::new(vp, size, 0.0)
    }

    /// The same view at another zoom level.
    pub fn with_zoom(self, zoom: f64) -> Self {
        Self { zoom, ..self }
    }

    /// World-to-clip matrix.
    pub fn view_projection(&self) -> &DMat4 {
        &self.view_projection
    }

    /// Screen size in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Whether the screen has no area.
    pub fn is_empty(&self) -> bool {
        !(self.size.width > 0.0 && self.size.height > 0.0)
    }

    /// Project a world point to screen pixels.
    pub fn project(&self, pt: Point) -> Option<Point> {
        project_to_screen(&self.view_projection, pt, self.size)
    }

    /// Model-view-projection matrix for a tile.
    pub fn tile_mvp(&self, model: &DMat4) -> DMat4 {
        self.view_projection * *model
    }
}

/// Tile address.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Zoom level.
    pub z: u8,
}

impl TileId {
    /// A tile address.
    pub const fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// A tile the label manager can collect from.
///
/// Tiles own their label sets. The manager borrows them mutably for the
/// duration of a frame and never keeps references across frames.
pub trait LabelTile {
    /// Tile address, reported with picking results.
    fn id(&self) -> TileId;

    /// Tile-to-world matrix.
    fn model_matrix(&self) -> DMat4;

    /// Label sets, one per style.
    fn label_sets(&self) -> &[LabelSet];

    /// Mutable label sets.
    fn label_sets_mut(&mut self) -> &mut [LabelSet];

    /// Zoom levels at which the tile's labels are collected.
    fn zoom_window(&self) -> Range<f64> {
        f64::NEG_INFINITY..f64::INFINITY
    }
}

/// A plain [`LabelTile`] holding its sets in a vector.
#[derive(Debug)]
pub struct Tile {
    id: TileId,
    model: DMat4,
    zoom_window: Range<f64>,
    sets: Vec<LabelSet>,
}

impl Tile {
    /// An empty tile.
    pub fn new(id: TileId, model: DMat4) -> Self {
        Self {
            id,
            model,
            zoom_window: f64::NEG_INFINITY..f64::INFINITY,
            sets: Vec::new(),
        }
    }

    /// Restrict label collection to zoom levels in `window`.
    pub fn with_zoom_window(mut self, window: Range<f64>) -> Self {
        self.zoom_window = window;
        self
    }

    /// Add a label set.
    pub fn push_set(&mut self, set: LabelSet) {
        self.sets.push(set);
    }

    /// Builder form of [`push_set`](Self::push_set).
    pub fn with_set(mut self, set: LabelSet) -> Self {
        self.push_set(set);
        self
    }

    /// The set produced by `style`.
    pub fn set_for_style(&self, style: StyleId) -> Option<&LabelSet> {
        self.sets.iter().find(|s| s.style() == style)
    }

    /// Mutable set produced by `style`.
    pub fn set_for_style_mut(&mut self, style: StyleId) -> Option<&mut LabelSet> {
        self.sets.iter_mut().find(|s| s.style() == style)
    }

    /// Kill the labels of `style`, e.g. after a style change.
    pub fn retire_style(&mut self, style: StyleId) {
        for set in self.sets.iter_mut().filter(|s| s.style() == style) {
            set.retire();
        }
    }

    /// The label behind `handle`, in any of the tile's sets.
    pub fn label(&self, handle: LabelHandle) -> Option<&Label> {
        self.sets.iter().find_map(|s| s.get(handle))
    }

    /// Mutable label behind `handle`.
    pub fn label_mut(&mut self, handle: LabelHandle) -> Option<&mut Label> {
        self.sets.iter_mut().find_map(|s| s.get_mut(handle))
    }
}

impl LabelTile for Tile {
    fn id(&self) -> TileId {
        self.id
    }

    fn model_matrix(&self) -> DMat4 {
        self.model
    }

    fn label_sets(&self) -> &[LabelSet] {
        &self.sets
    }

    fn label_sets_mut(&mut self) -> &mut [LabelSet] {
        &mut self.sets
    }

    fn zoom_window(&self) -> Range<f64> {
        self.zoom_window.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let mut m = DMat4::IDENTITY;
        m.w_axis.w = 0.0;
        assert_eq!(project_to_screen(&m, Point::ZERO, Size::new(10.0, 10.0)), None);
    }

    #[test]
    fn unit_square_maps_exactly() {
        let view = View::unit_square(Size::new(256.0, 256.0));
        let p = view.project(Point::new(0.5 - 1.0 / 256.0, 0.5 + 10.0 / 256.0));
        assert_eq!(p, Some(Point::new(127.0, 118.0)));
        assert_eq!(view.project(Point::new(1.0, 0.0)), Some(Point::new(256.0, 256.0)));
    }

    #[test]
    fn perspective_divides_by_w() {
        let mut m = DMat4::IDENTITY;
        m.w_axis.w = 2.0;
        let p = project_to_screen(&m, Point::new(1.0, 1.0), Size::new(100.0, 100.0));
        assert_eq!(p, Some(Point::new(75.0, 25.0)));
    }

    #[test]
    fn tile_default_window_is_unbounded() {
        let tile = Tile::new(TileId::new(0, 0, 0), DMat4::IDENTITY);
        assert!(tile.zoom_window().contains(&22.0));
        let limited = tile.with_zoom_window(2.0..4.0);
        assert!(!LabelTile::zoom_window(&limited).contains(&4.0));
    }

    #[test]
    fn zoom_is_carried_by_the_view() {
        let view = View::unit_square(Size::new(256.0, 256.0)).with_zoom(3.5);
        assert_eq!(view.zoom(), 3.5);
        assert_eq!(view.size(), Size::new(256.0, 256.0));
    }

    #[test]
    fn retire_style_kills_only_that_style() {
        use crate::{LabelGeometry, LabelOptions};
        let label = || {
            Label::new(
                LabelGeometry::Point(Point::new(0.5, 0.5)),
                Size::new(10.0, 10.0),
                LabelOptions::default(),
            )
        };
        let mut roads = LabelSet::new(StyleId(0));
        roads.push(label());
        let mut pois = LabelSet::new(StyleId(1));
        pois.push(label());
        let mut tile = Tile::new(TileId::new(0, 0, 0), DMat4::IDENTITY)
            .with_set(roads)
            .with_set(pois);
        tile.retire_style(StyleId(0));
        let dead = |style| {
            tile.set_for_style(style)
                .is_some_and(|s| s.labels().iter().all(Label::is_dead))
        };
        assert!(dead(StyleId(0)));
        assert!(!dead(StyleId(1)));
    }
}
