//! Barrel layout module
//!
//! Pure geometry, no DOM:
//! - `rows`: near-hexagonal packing of barrels into rows
//! - `geometry`: radius, pixel offsets, plate placement and hit testing

pub mod geometry;
pub mod rows;

pub use geometry::{Geometry, PlateGeometry, Viewport};
pub use rows::{RowPlan, Slot};
