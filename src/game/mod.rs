//! Game session module
//!
//! The whole game is one `Session` driven by `dispatch`. This module must stay
//! free of platform calls:
//! - Inputs, clip completions and timer expiries arrive as `Event`s
//! - Every side effect leaves as a `Command`
//! - Deferred events re-check the phase they were scheduled for
//! - Seeded RNG only

pub mod command;
pub mod machine;
pub mod state;
pub mod verdict;

pub use command::{Command, Easing, Event, PlatePose, PlateTransform, Timer, TimerId, Transition};
pub use machine::dispatch;
pub use state::{Barrel, Phase, Session, Timing};
pub use verdict::Verdict;
