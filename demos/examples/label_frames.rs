// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A few frames of label placement over one tile, followed by a pick.
//!
//! This example shows how to:
//! - build label sets with point, line and parent/child labels,
//! - run `Labels::update_labels` while a road label moves,
//! - read placement and fade results back from the labels,
//! - find the feature under the cursor with `Labels::features_at_point`.
//!
//! Run:
//! - `cargo run -p understory_demos --example label_frames`

use std::sync::Arc;

use glam::DMat4;
use kurbo::{Point, Size};
use understory_labels::{
    Anchor, AnchorCandidates, FadeParams, Label, LabelGeometry, LabelHandle, LabelOptions,
    LabelSet, Labels, LabelsConfig, Properties, StyleId, Tile, TileId, View,
};

const POIS: StyleId = StyleId(0);
const ROADS: StyleId = StyleId(1);

/// Tile-local point shown at screen pixel `(x, y)` on a 256 px screen.
fn px(x: f64, y: f64) -> Point {
    Point::new(x / 256.0, 1.0 - y / 256.0)
}

fn road(y: f64) -> LabelGeometry {
    LabelGeometry::Line {
        start: px(110.0, y),
        end: px(146.0, y),
    }
}

fn describe(tile: &Tile, name: &str, handle: LabelHandle) {
    let Some(label) = tile.label(handle) else {
        return;
    };
    let b = label.screen_box().bounding_box();
    println!(
        "  {name:<6} {:<13} anchor={:<7} alpha={:.2} box=({:.0},{:.0})-({:.0},{:.0})",
        format!("{:?}", label.state()),
        format!("{:?}", label.anchor()),
        label.alpha(),
        b.x0,
        b.y0,
        b.x1,
        b.y1,
    );
}

fn main() {
    let mut pois = LabelSet::new(POIS);
    let icon = pois.push(Label::new(
        LabelGeometry::Point(px(128.0, 128.0)),
        Size::new(10.0, 10.0),
        LabelOptions {
            priority: 0.0,
            interactive: true,
            properties: Some(Arc::new(
                Properties::new().with("name", "Fountain").with("kind", "poi"),
            )),
            ..LabelOptions::default()
        },
    ));
    // The caption must show with its icon or not at all.
    let caption = pois.push(Label::new(
        LabelGeometry::Point(px(128.0, 128.0)),
        Size::new(40.0, 10.0),
        LabelOptions {
            priority: 2.0,
            required: true,
            anchors: AnchorCandidates::single(Anchor::Bottom),
            ..LabelOptions::default()
        },
    ));
    pois.set_parent(caption, icon, false, true);

    let mut roads = LabelSet::new(ROADS);
    let street = roads.push(Label::new(
        road(128.0),
        Size::new(14.0, 2.0),
        LabelOptions {
            priority: 1.0,
            properties: Some(Arc::new(Properties::new().with("name", "Main Street"))),
            ..LabelOptions::default()
        },
    ));

    let mut tiles = [Tile::new(TileId::new(0, 0, 0), DMat4::IDENTITY)
        .with_set(pois)
        .with_set(roads)];
    let config = LabelsConfig {
        fade: FadeParams {
            fade_in: 0.1,
            fade_out: 0.1,
            fade_required: true,
        },
        ..LabelsConfig::default()
    };
    let Ok(mut labels) = Labels::with_config(config) else {
        eprintln!("invalid label configuration");
        return;
    };
    let view = View::unit_square(Size::new(256.0, 256.0));
    let styles = [POIS, ROADS];

    for frame in 0..4 {
        // The street label slides under the caption on odd frames.
        let y = if frame % 2 == 1 { 140.0 } else { 128.0 };
        if let Some(label) = tiles[0].label_mut(street) {
            label.set_geometry(road(y));
        }
        labels.update_labels(&view, 0.05, &styles, &mut tiles);
        let stats = labels.stats();
        println!(
            "frame {frame}: {} collected, {} visible, {} occluded",
            stats.collected, stats.visible, stats.occluded
        );
        describe(&tiles[0], "icon", icon);
        describe(&tiles[0], "caption", caption);
        describe(&tiles[0], "street", street);
    }

    let hits = labels.features_at_point(&view, view.zoom(), &styles, &mut tiles, 120.0, 140.0, false);
    println!("features at (120, 140):");
    for hit in hits {
        println!(
            "  {:?} in tile {:?}: {:?}",
            hit.handle,
            hit.tile,
            hit.properties.get_str("name")
        );
    }
}
