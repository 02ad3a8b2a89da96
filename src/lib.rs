//! Barrels - find the barrel that tells the time
//!
//! Core modules:
//! - `layout`: Row packing of barrels and viewport geometry
//! - `game`: Session state machine (phases, target, verdicts)
//! - `audio`: Clip bookkeeping and browser playback
//! - `settings`: Tunables with LocalStorage persistence
//! - `platform`: Headless runtime and the browser stage

pub mod audio;
pub mod game;
pub mod layout;
pub mod platform;
pub mod settings;

pub use audio::Clip;
pub use game::{Command, Event, Phase, Session, dispatch};
pub use layout::{Geometry, RowPlan, Viewport};
pub use settings::{Settings, TargetRule};

/// Game configuration constants
pub mod consts {
    /// Default number of barrels on the wall
    pub const NUM_BARRELS: usize = 19;

    /// Hours on the clock face
    pub const HOURS: u32 = 12;
    /// Degrees in a full turn
    pub const CIRCLE: f32 = 360.0;
    /// Degrees between two clock hours
    pub const HOUR_ANGLE: f32 = CIRCLE / HOURS as f32;

    /// Vertical distance between row centres, in radii (sin 60°)
    pub const ROW_HEIGHT: f32 = 0.866_025_4;

    /// Opacity of a hovered barrel's highlight
    pub const HIGHLIGHT: f32 = 0.33;

    /// Plate transition duration (ms)
    pub const TRANSITION_MS: u32 = 1000;
    /// Plate auto-dismiss timeout (ms)
    pub const PLATE_TIMEOUT_MS: u32 = 30 * 1000;

    /// Media readiness polling interval (ms)
    pub const MEDIA_POLL_MS: u32 = 100;
    /// Pause between media ready and the welcome clip (ms)
    pub const STARTUP_DELAY_MS: u32 = 200;

    /// Plate width / height
    pub const PLATE_ASPECT: f32 = 4.0 / 3.0;
    /// Plate width relative to the usable field
    pub const PLATE_SIZE: f32 = 0.7;
    /// Margin around the plate relative to the shorter viewport side
    pub const PLATE_FIELD: f32 = 0.05;
    /// Horizontal content padding relative to plate width
    pub const PLATE_PADDING: f32 = 0.23;
    /// Message font size relative to plate width
    pub const FONT_SIZE: f32 = 0.035;
    /// Success message font size relative to plate width
    pub const SUCCESS_FONT_SIZE: f32 = 0.07;
}

/// Normalized angle to [0, 360) degrees
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(consts::CIRCLE);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= consts::CIRCLE { 0.0 } else { a }
}

/// Whether an angle sits on one of the twelve clock positions
#[inline]
pub fn is_clock_angle(angle: f32) -> bool {
    const EPSILON: f32 = 1e-3;
    let r = normalize_degrees(angle).rem_euclid(consts::HOUR_ANGLE);
    r < EPSILON || consts::HOUR_ANGLE - r < EPSILON
}

/// Clock hour (1..=12) shown by an angle, if it sits on a clock position
#[inline]
pub fn clock_hour(angle: f32) -> Option<u32> {
    if !is_clock_angle(angle) {
        return None;
    }
    let hour = (normalize_degrees(angle) / consts::HOUR_ANGLE).round() as u32 % consts::HOURS;
    Some(if hour == 0 { consts::HOURS } else { hour })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-30.0), 330.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
    }

    #[test]
    fn test_clock_hour() {
        assert_eq!(clock_hour(30.0), Some(1));
        assert_eq!(clock_hour(360.0), Some(12));
        assert_eq!(clock_hour(0.0), Some(12));
        // Spun by a full turn, still the same hour
        assert_eq!(clock_hour(90.0 + 360.0), Some(3));
        assert_eq!(clock_hour(91.5), None);
        assert!(!is_clock_angle(15.0));
    }
}
