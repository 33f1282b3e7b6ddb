// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Manager configuration: collision grid, fades, picking and debug switches.

use crate::LabelsError;

bitflags::bitflags! {
    /// Debug switches for the label manager.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DebugFlags: u8 {
        /// Record every tested candidate box and log each placement decision.
        const LABELS     = 0b0000_0001;
        /// Skip occlusion: every collected label is accepted at its first anchor.
        const ALL_LABELS = 0b0000_0010;
    }
}

/// Fade durations driving the label state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FadeParams {
    /// Seconds to go from invisible to fully visible. Zero is instant.
    pub fade_in: f32,
    /// Seconds to go from fully visible to invisible. Zero is instant.
    pub fade_out: f32,
    /// Whether required labels fade too. When false they switch instantly.
    pub fade_required: bool,
}

impl Default for FadeParams {
    fn default() -> Self {
        Self {
            fade_in: 0.2,
            fade_out: 0.2,
            fade_required: true,
        }
    }
}

impl FadeParams {
    /// Instant transitions in both directions.
    pub const INSTANT: Self = Self {
        fade_in: 0.0,
        fade_out: 0.0,
        fade_required: false,
    };
}

/// Configuration for [`Labels`](crate::Labels).
///
/// ```
/// use understory_labels::{Labels, LabelsConfig, LabelsError};
///
/// let cfg = LabelsConfig { grid_cols: 0, ..LabelsConfig::default() };
/// assert_eq!(
///     Labels::with_config(cfg).unwrap_err(),
///     LabelsError::InvalidGrid { cols: 0, rows: 4 }
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LabelsConfig {
    /// Collision grid columns.
    pub grid_cols: u32,
    /// Collision grid rows.
    pub grid_rows: u32,
    /// Fade durations.
    pub fade: FadeParams,
    /// Extra screen distance, in pixels, within which a pick still hits a label.
    pub pick_tolerance: f64,
    /// Debug switches.
    pub debug: DebugFlags,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            grid_cols: 4,
            grid_rows: 4,
            fade: FadeParams::default(),
            pick_tolerance: 0.0,
            debug: DebugFlags::empty(),
        }
    }
}

impl LabelsConfig {
    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), LabelsError> {
        if self.grid_cols == 0 || self.grid_rows == 0 {
            return Err(LabelsError::InvalidGrid {
                cols: self.grid_cols,
                rows: self.grid_rows,
            });
        }
        let FadeParams {
            fade_in, fade_out, ..
        } = self.fade;
        if !(fade_in.is_finite() && fade_in >= 0.0 && fade_out.is_finite() && fade_out >= 0.0) {
            return Err(LabelsError::InvalidFade { fade_in, fade_out });
        }
        if !(self.pick_tolerance.is_finite() && self.pick_tolerance >= 0.0) {
            return Err(LabelsError::InvalidTolerance(self.pick_tolerance));
        }
        Ok(())
    }
}
