// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen-point queries over placed labels.

use alloc::sync::Arc;

use kurbo::Point;

use crate::{LabelHandle, LabelTile, Labels, Properties, StyleId, TileId, View};

/// A label found under a screen point.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureHit {
    /// Properties of the label's source feature.
    pub properties: Arc<Properties>,
    /// The label.
    pub handle: LabelHandle,
    /// Tile the label belongs to.
    pub tile: TileId,
    /// Distance from the query point to the label's box; zero inside it.
    pub distance: f64,
    rank: u32,
}

impl Labels {
    /// Labels whose screen box contains `(x, y)`, within the pick tolerance.
    ///
    /// Only labels the last frame accepted are reported, and only those
    /// carrying properties. With `interactive_only`, non-interactive labels
    /// are skipped. Labels are re-projected with `view`, and tiles are
    /// filtered by `zoom` against their zoom window. Hits come in the order
    /// the last frame placed them, so the label that won placement comes
    /// first.
    ///
    /// The result is valid until the next call.
    pub fn features_at_point<T: LabelTile>(
        &mut self,
        view: &View,
        zoom: f64,
        styles: &[StyleId],
        tiles: &mut [T],
        x: f64,
        y: f64,
        interactive_only: bool,
    ) -> &[FeatureHit] {
        self.picked.clear();
        if view.is_empty() {
            return &self.picked;
        }
        let pt = Point::new(x, y);
        let tolerance = self.config().pick_tolerance;
        let screen = view.size();

        for tile in tiles.iter_mut() {
            if !tile.zoom_window().contains(&zoom) {
                continue;
            }
            let mvp = view.tile_mvp(&tile.model_matrix());
            let tile_id = tile.id();
            for set in tile.label_sets_mut().iter_mut() {
                if !styles.contains(&set.style()) {
                    continue;
                }
                let set_id = set.id();
                for (li, label) in set.labels_mut().iter_mut().enumerate() {
                    if label.is_dead()
                        || label.is_occluded()
                        || label.resolved_in() != Some(self.pass)
                    {
                        continue;
                    }
                    if interactive_only && !label.options().interactive {
                        continue;
                    }
                    let Some(properties) = label.properties().cloned() else {
                        continue;
                    };
                    label.update(&mvp, screen);
                    let obb = label.screen_box();
                    if !obb.inflated(tolerance, tolerance).contains(pt) {
                        continue;
                    }
                    self.picked.push(FeatureHit {
                        properties,
                        handle: LabelHandle::new(set_id, li),
                        tile: tile_id,
                        distance: obb.distance_to(pt),
                        rank: label.rank().unwrap_or(u32::MAX),
                    });
                }
            }
        }
        self.picked.sort_by_key(|hit| hit.rank);
        &self.picked
    }
}
