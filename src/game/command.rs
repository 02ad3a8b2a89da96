//! Events into and commands out of the session

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::verdict::Verdict;
use crate::audio::Clip;
use crate::layout::{Geometry, Viewport};

/// Handle of a scheduled timer, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timer {
    /// Plate has finished flying to its corner
    FadeIn,
    /// Nobody dismissed the plate in time
    AutoDismiss,
}

/// CSS timing function of a plate transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
}

/// A timed plate transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub duration_ms: u32,
    pub easing: Easing,
}

impl Transition {
    pub fn linear(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            easing: Easing::Linear,
        }
    }

    pub fn ease_in(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            easing: Easing::EaseIn,
        }
    }

    /// Value for the CSS `transition` property
    pub fn css(&self) -> String {
        let secs = self.duration_ms as f32 / 1000.0;
        match self.easing {
            Easing::Linear => format!("{}s", secs),
            Easing::EaseIn => format!("{}s ease-in", secs),
        }
    }
}

/// Plate transform to apply along with a move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlateTransform {
    /// Leave the current transform alone
    Keep,
    /// Back to the stylesheet transform (collapsed)
    Reset,
    /// Spin by this many degrees at full scale
    Spin(f32),
}

/// Where the plate should be and how it looks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatePose {
    /// Bottom-left offset; `None` falls back to the stylesheet position
    pub position: Option<Vec2>,
    /// Centre the plate on `position` (negative half-size margins)
    pub centered: bool,
    pub transform: PlateTransform,
}

impl PlatePose {
    /// Resting pose while nobody has tapped: stylesheet spot, shrunk away
    pub fn parked() -> Self {
        Self {
            position: None,
            centered: true,
            transform: PlateTransform::Reset,
        }
    }
}

/// Everything the session reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Assets are ready, begin the welcome
    Start,
    /// A clip played with `notify` finished (or was skipped)
    ClipEnded(Clip),
    /// Pointer went down on a barrel
    Tap(usize),
    /// Key or pointer went down anywhere on the board
    Dismiss,
    PointerOver(usize),
    PointerOut(usize),
    TimerFired { id: TimerId, timer: Timer },
    Resize(Viewport),
}

/// Everything the session asks the outside world to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Size and position all barrels and the plate
    Reflow(Geometry),
    RotateBarrel { index: usize, degrees: f32 },
    SetHighlight { index: usize, opacity: f32 },
    PlacePlate(PlatePose),
    /// `None` clears the transition so the next move is instant
    SetPlateTransition(Option<Transition>),
    ShowVerdict(Verdict),
    /// Swap the startup screen for the board and focus it
    ShowBoard,
    /// Play a clip; `notify` asks for a `ClipEnded` when it finishes
    Play { clip: Clip, notify: bool },
    StartTimer { id: TimerId, timer: Timer, delay_ms: u32 },
    CancelTimer(TimerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_css() {
        assert_eq!(Transition::linear(1000).css(), "1s");
        assert_eq!(Transition::ease_in(1500).css(), "1.5s ease-in");
    }
}
