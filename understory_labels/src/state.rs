// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label visibility lifecycle.

/// Lifecycle state of a label.
///
/// A fresh label starts in [`WaitOcclusion`](LabelState::WaitOcclusion) and
/// leaves it after its first resolution, either fading in or going to sleep.
/// From then on it alternates between the visible and sleeping branches as
/// its occlusion result changes. [`Dead`](LabelState::Dead) is terminal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LabelState {
    /// Not yet resolved against other labels.
    #[default]
    WaitOcclusion,
    /// Occluded and invisible.
    Sleep,
    /// Becoming visible.
    FadingIn,
    /// Fully visible.
    Visible,
    /// Becoming invisible.
    FadingOut,
    /// Retired; never collected again.
    Dead,
}

impl LabelState {
    /// Whether a label in this state should be drawn.
    pub const fn is_drawn(self) -> bool {
        matches!(self, Self::FadingIn | Self::Visible | Self::FadingOut)
    }
}

/// State plus the alpha ramp it drives.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct Fade {
    pub(crate) state: LabelState,
    pub(crate) alpha: f32,
}

impl Fade {
    /// Advance by `dt` seconds toward the visibility given by `occluded`.
    ///
    /// `fade_in` and `fade_out` are durations in seconds; zero switches
    /// immediately. Nothing moves until the label has been resolved once.
    pub(crate) fn advance(
        &mut self,
        occluded: bool,
        resolved: bool,
        dt: f32,
        fade_in: f32,
        fade_out: f32,
    ) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match self.state {
            LabelState::Dead => {}
            LabelState::WaitOcclusion => {
                if !resolved {
                    return;
                }
                if occluded {
                    self.state = LabelState::Sleep;
                    self.alpha = 0.0;
                } else {
                    self.ramp_in(dt, fade_in);
                }
            }
            LabelState::Sleep | LabelState::FadingIn | LabelState::Visible
                if !occluded =>
            {
                if self.state != LabelState::Visible {
                    self.ramp_in(dt, fade_in);
                }
            }
            LabelState::FadingOut if !occluded => self.ramp_in(dt, fade_in),
            LabelState::Sleep => {}
            LabelState::FadingIn | LabelState::Visible | LabelState::FadingOut => {
                self.ramp_out(dt, fade_out);
            }
        }
    }

    fn ramp_in(&mut self, dt: f32, duration: f32) {
        if duration <= 0.0 {
            self.alpha = 1.0;
        } else {
            self.alpha = (self.alpha + dt / duration).min(1.0);
        }
        self.state = if self.alpha >= 1.0 {
            LabelState::Visible
        } else {
            LabelState::FadingIn
        };
    }

    fn ramp_out(&mut self, dt: f32, duration: f32) {
        if duration <= 0.0 {
            self.alpha = 0.0;
        } else {
            self.alpha = (self.alpha - dt / duration).max(0.0);
        }
        self.state = if self.alpha <= 0.0 {
            LabelState::Sleep
        } else {
            LabelState::FadingOut
        };
    }

    pub(crate) fn kill(&mut self) {
        self.state = LabelState::Dead;
        self.alpha = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_until_resolved() {
        let mut f = Fade::default();
        f.advance(false, false, 1.0, 0.2, 0.2);
        assert_eq!(f.state, LabelState::WaitOcclusion);
        f.advance(true, true, 1.0, 0.2, 0.2);
        assert_eq!(f.state, LabelState::Sleep);
        assert_eq!(f.alpha, 0.0);
    }

    #[test]
    fn fades_in_then_out() {
        let mut f = Fade::default();
        f.advance(false, true, 0.25, 0.5, 0.5);
        assert_eq!(f.state, LabelState::FadingIn);
        assert_eq!(f.alpha, 0.5);
        f.advance(false, true, 0.25, 0.5, 0.5);
        assert_eq!(f.state, LabelState::Visible);
        assert_eq!(f.alpha, 1.0);

        f.advance(true, true, 0.25, 0.5, 0.5);
        assert_eq!(f.state, LabelState::FadingOut);
        assert_eq!(f.alpha, 0.5);
        f.advance(true, true, 1.0, 0.5, 0.5);
        assert_eq!(f.state, LabelState::Sleep);
        assert_eq!(f.alpha, 0.0);
    }

    #[test]
    fn reverses_mid_fade() {
        let mut f = Fade::default();
        f.advance(false, true, 0.25, 1.0, 1.0);
        assert_eq!(f.state, LabelState::FadingIn);
        f.advance(true, true, 0.125, 1.0, 1.0);
        assert_eq!(f.state, LabelState::FadingOut);
        assert_eq!(f.alpha, 0.125);
        f.advance(false, true, 0.125, 1.0, 1.0);
        assert_eq!(f.state, LabelState::FadingIn);
        assert_eq!(f.alpha, 0.25);
    }

    #[test]
    fn zero_duration_is_instant() {
        let mut f = Fade::default();
        f.advance(false, true, 0.0, 0.0, 0.0);
        assert_eq!(f.state, LabelState::Visible);
        f.advance(true, true, 0.0, 0.0, 0.0);
        assert_eq!(f.state, LabelState::Sleep);
    }

    #[test]
    fn dead_is_terminal() {
        let mut f = Fade::default();
        f.advance(false, true, 0.0, 0.0, 0.0);
        f.kill();
        f.advance(false, true, 1.0, 0.0, 0.0);
        assert_eq!(f.state, LabelState::Dead);
        assert!(!f.state.is_drawn());
    }
}
