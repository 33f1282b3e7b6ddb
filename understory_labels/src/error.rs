// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

/// Rejected [`LabelsConfig`](crate::LabelsConfig) values.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LabelsError {
    /// The collision grid needs at least one cell along each axis.
    #[error("collision grid must have at least one cell per axis, got {cols}x{rows}")]
    InvalidGrid {
        /// Requested column count.
        cols: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Fade durations must be finite and non-negative.
    #[error("fade durations must be finite and non-negative, got in={fade_in} out={fade_out}")]
    InvalidFade {
        /// Requested fade-in duration in seconds.
        fade_in: f32,
        /// Requested fade-out duration in seconds.
        fade_out: f32,
    },
    /// The pick tolerance must be finite and non-negative.
    #[error("pick tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}

/// Rejected per-label options.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// More anchor candidates than a label can hold.
    #[error("at most {max} anchor candidates are supported, got {count}")]
    TooManyAnchors {
        /// Number of candidates supplied.
        count: usize,
        /// Capacity of the candidate list.
        max: usize,
    },
}
