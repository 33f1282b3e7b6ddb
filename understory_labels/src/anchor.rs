// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor positions and the per-label candidate list.

use kurbo::Vec2;

use crate::LabelError;

/// Maximum number of anchor candidates a label can try.
pub const MAX_ANCHORS: usize = 4;

/// Where a label box sits relative to its reference point.
///
/// The name describes the side of the point the box ends up on: a label
/// anchored [`Right`](Anchor::Right) has its left edge on the point, one
/// anchored [`Top`](Anchor::Top) has its bottom edge on the point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Anchor {
    /// Centered on the point.
    #[default]
    Center,
    /// Left of the point.
    Left,
    /// Right of the point.
    Right,
    /// Above the point.
    Top,
    /// Below the point.
    Bottom,
    /// Above and left of the point.
    TopLeft,
    /// Above and right of the point.
    TopRight,
    /// Below and left of the point.
    BottomLeft,
    /// Below and right of the point.
    BottomRight,
}

impl Anchor {
    /// Unit offset of the box center, in half extents, on a y-down screen.
    ///
    /// ```
    /// use kurbo::Vec2;
    /// use understory_labels::Anchor;
    ///
    /// assert_eq!(Anchor::Right.direction(), Vec2::new(1.0, 0.0));
    /// assert_eq!(Anchor::Top.direction(), Vec2::new(0.0, -1.0));
    /// ```
    pub const fn direction(self) -> Vec2 {
        match self {
            Self::Center => Vec2::new(0.0, 0.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Top => Vec2::new(0.0, -1.0),
            Self::Bottom => Vec2::new(0.0, 1.0),
            Self::TopLeft => Vec2::new(-1.0, -1.0),
            Self::TopRight => Vec2::new(1.0, -1.0),
            Self::BottomLeft => Vec2::new(-1.0, 1.0),
            Self::BottomRight => Vec2::new(1.0, 1.0),
        }
    }
}

/// An ordered list of up to [`MAX_ANCHORS`] anchor candidates.
///
/// Placement tries the candidates in order and keeps the first one that does
/// not collide. An empty list disables collision for the label.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnchorCandidates {
    anchors: [Anchor; MAX_ANCHORS],
    len: u8,
}

impl AnchorCandidates {
    /// No candidates.
    pub const EMPTY: Self = Self {
        anchors: [Anchor::Center; MAX_ANCHORS],
        len: 0,
    };

    /// A list holding a single anchor.
    pub const fn single(anchor: Anchor) -> Self {
        let mut anchors = [Anchor::Center; MAX_ANCHORS];
        anchors[0] = anchor;
        Self { anchors, len: 1 }
    }

    /// Build a list from `anchors`, in priority order.
    ///
    /// ```
    /// use understory_labels::{Anchor, AnchorCandidates, LabelError};
    ///
    /// let c = AnchorCandidates::new(&[Anchor::Right, Anchor::Left]).unwrap();
    /// assert_eq!(c.get(1), Some(Anchor::Left));
    ///
    /// let too_many = [Anchor::Center; 5];
    /// assert!(matches!(
    ///     AnchorCandidates::new(&too_many),
    ///     Err(LabelError::TooManyAnchors { count: 5, .. })
    /// ));
    /// ```
    pub fn new(anchors: &[Anchor]) -> Result<Self, LabelError> {
        if anchors.len() > MAX_ANCHORS {
            return Err(LabelError::TooManyAnchors {
                count: anchors.len(),
                max: MAX_ANCHORS,
            });
        }
        let mut out = Self::EMPTY;
        out.anchors[..anchors.len()].copy_from_slice(anchors);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "bounded by MAX_ANCHORS above"
        )]
        let len = anchors.len() as u8;
        out.len = len;
        Ok(out)
    }

    /// Number of candidates.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the list is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Candidate at `index`.
    pub fn get(&self, index: usize) -> Option<Anchor> {
        self.as_slice().get(index).copied()
    }

    /// The candidates as a slice.
    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors[..self.len()]
    }

    /// Iterate candidates in priority order.
    pub fn iter(&self) -> impl Iterator<Item = Anchor> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for AnchorCandidates {
    fn default() -> Self {
        Self::single(Anchor::Center)
    }
}

impl TryFrom<&[Anchor]> for AnchorCandidates {
    type Error = LabelError;

    fn try_from(anchors: &[Anchor]) -> Result<Self, Self::Error> {
        Self::new(anchors)
    }
}
