// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_labels --heading-base-level=0

//! Understory Labels: per-frame placement of screen-space map labels.
//!
//! Tiles carry [`LabelSet`]s, one per style, each holding [`Label`]s built
//! from point, line or curve geometry. Every frame, [`Labels::update_labels`]
//! decides which labels are shown and where:
//!
//! 1. Collect the live labels of the visible tiles for the active styles.
//! 2. Project each one to screen pixels through the tile's model matrix and
//!    the [`View`].
//! 3. Sort by priority (lower values first), keeping children after their
//!    parents. Ties keep encounter order, so results are deterministic.
//! 4. Accept labels greedily: each one tries its anchor candidates in order
//!    against a screen-space grid of already accepted boxes
//!    ([`understory_isect::SpatialIndex`]), and is occluded if none is free.
//! 5. Advance every label's fade state by the frame's `dt`.
//!
//! After a frame, renderers read [`Label::screen_box`], [`Label::alpha`] and
//! [`Label::state`]; [`Labels::features_at_point`] finds the visible labels
//! under a screen point and returns their feature [`Properties`].
//!
//! ## Parents and required labels
//!
//! A label can follow a parent, for example an icon's text. A child is never
//! shown without its parent and never collides with it. A required child that
//! cannot be placed hides its parent too. A required label without a parent
//! is shown over any collision with optional labels and gives way to earlier
//! required labels only.
//!
//! # Example
//!
//! ```rust
//! use glam::DMat4;
//! use kurbo::{Point, Size};
//! use understory_labels::{
//!     Anchor, AnchorCandidates, Label, LabelGeometry, LabelOptions, LabelSet, Labels, StyleId,
//!     Tile, TileId, View,
//! };
//!
//! let style = StyleId(0);
//! let anchors = AnchorCandidates::new(&[Anchor::Right, Anchor::Left]).unwrap();
//! let text = |x: f64, priority: f32| {
//!     Label::new(
//!         LabelGeometry::Point(Point::new(x, 0.5)),
//!         Size::new(10.0, 10.0),
//!         LabelOptions { priority, anchors, ..LabelOptions::default() },
//!     )
//! };
//!
//! let mut set = LabelSet::new(style);
//! let first = set.push(text(0.5, 0.0));
//! // One pixel further left: its right side is taken, its left side is free.
//! let second = set.push(text(0.5 - 1.0 / 256.0, 1.0));
//! let mut tiles = [Tile::new(TileId::new(0, 0, 0), DMat4::IDENTITY).with_set(set)];
//!
//! let mut labels = Labels::new();
//! let view = View::unit_square(Size::new(256.0, 256.0));
//! labels.update_labels(&view, 0.016, &[style], &mut tiles);
//!
//! assert_eq!(tiles[0].label(first).unwrap().anchor(), Anchor::Right);
//! let second = tiles[0].label(second).unwrap();
//! assert!(!second.is_occluded());
//! assert_eq!(second.anchor(), Anchor::Left);
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: a `debug` summary per frame,
//! per-label decisions when [`DebugFlags::LABELS`] is set, and `trace` notes
//! for broken parent links.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod anchor;
mod config;
mod error;
mod frame;
mod label;
mod label_set;
mod labels;
mod picking;
mod properties;
mod state;
mod tile;

#[cfg(test)]
mod testing;

pub use anchor::{Anchor, AnchorCandidates, MAX_ANCHORS};
pub use config::{DebugFlags, FadeParams, LabelsConfig};
pub use error::{LabelError, LabelsError};
pub use label::{Label, LabelGeometry, LabelOptions, LabelType, ParentLink};
pub use label_set::{LabelHandle, LabelSet, LabelSetId, StyleId};
pub use labels::{DebugBox, FrameStats, Labels};
pub use picking::FeatureHit;
pub use properties::{Properties, Value};
pub use state::LabelState;
pub use tile::{LabelTile, Tile, TileId, View, project_to_screen};

pub use understory_isect::Obb;
