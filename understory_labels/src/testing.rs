// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures: a 256 px square screen showing the unit square.

use glam::DMat4;
use kurbo::{Point, Size};

use crate::{
    Anchor, AnchorCandidates, Label, LabelGeometry, LabelHandle, LabelOptions, LabelSet, Tile,
    TileId, View,
};

pub(crate) const FALLBACKS: [Anchor; 4] = [Anchor::Right, Anchor::Bottom, Anchor::Left, Anchor::Top];

pub(crate) fn view() -> View {
    View::unit_square(Size::new(256.0, 256.0))
}

/// Tile-local point that projects to screen pixel `(x, y)`.
pub(crate) fn at(x: f64, y: f64) -> Point {
    Point::new(x / 256.0, 1.0 - y / 256.0)
}

pub(crate) fn point_label(pt: Point, priority: f32, anchors: &[Anchor]) -> Label {
    Label::new(
        LabelGeometry::Point(pt),
        Size::new(10.0, 10.0),
        LabelOptions {
            priority,
            anchors: AnchorCandidates::new(anchors).unwrap(),
            ..LabelOptions::default()
        },
    )
}

pub(crate) fn required_label(pt: Point, priority: f32) -> Label {
    Label::new(
        LabelGeometry::Point(pt),
        Size::new(10.0, 10.0),
        LabelOptions {
            priority,
            required: true,
            ..LabelOptions::default()
        },
    )
}

pub(crate) fn tile(set: LabelSet) -> Tile {
    Tile::new(TileId::default(), DMat4::IDENTITY).with_set(set)
}

pub(crate) fn lookup(tiles: &[Tile], handle: LabelHandle) -> &Label {
    tiles
        .iter()
        .find_map(|t| t.label(handle))
        .expect("label should be in a tile")
}
