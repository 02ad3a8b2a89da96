//! Platform abstraction layer
//!
//! Executes the session's commands against the outside world:
//! - `hover`: pointer tracking shared by every front end
//! - `headless`: virtual clock, simulated clip playback, recorded stage state
//! - `web`: DOM stage for the browser (wasm32 only)

pub mod headless;
pub mod hover;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::{Headless, StageState};
pub use hover::Hover;
