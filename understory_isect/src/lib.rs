// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_isect --heading-base-level=0

//! Understory Isect: screen-space collision detection for placed boxes.
//!
//! Understory Isect answers one question quickly and exactly: does a candidate
//! box overlap anything that has already been placed on screen this frame?
//!
//! - [`Obb`] is an oriented bounding box with an exact separating-axis
//!   intersection test and point containment.
//! - [`SpatialIndex`] is a uniform grid sized to the viewport. Boxes are
//!   inserted into every cell their bounds touch; queries visit only the cells
//!   under the query box and confirm candidates with the exact test.
//!
//! The grid is meant to be rebuilt every frame: [`SpatialIndex::resize`] when
//! the viewport changes and [`SpatialIndex::clear`] otherwise. Per-cell lists
//! are small vectors, so a few thousand boxes per frame stay cheap without any
//! global scan.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Size, Vec2};
//! use understory_isect::{Obb, SpatialIndex};
//!
//! let mut index = SpatialIndex::new((4, 4), Size::new(256.0, 256.0));
//!
//! // A label placed to the right of (128, 128).
//! let placed = Obb::axis_aligned(Point::new(133.0, 128.0), Vec2::new(5.0, 5.0));
//! index.insert(placed, 0_usize);
//!
//! // The same label placed to the left of a point one pixel further left is free.
//! let left = Obb::axis_aligned(Point::new(122.0, 128.0), Vec2::new(5.0, 5.0));
//! assert!(!index.intersects(&left));
//!
//! // Boxes sharing an edge intersect.
//! let above = Obb::axis_aligned(Point::new(133.0, 118.0), Vec2::new(5.0, 5.0));
//! assert!(index.intersects(&above));
//! ```
//!
//! ### Float semantics
//!
//! Coordinates are assumed finite. Non-finite bounds are clamped into the
//! border cells and never panic.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod grid;
mod obb;

pub use grid::{Key, SpatialIndex};
pub use obb::Obb;
