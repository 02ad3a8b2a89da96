//! Viewport geometry
//!
//! All positions use a bottom-left origin, matching the `left`/`bottom` CSS
//! offsets the stage writes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rows::RowPlan;
use crate::consts::*;

/// Size of the playing surface in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Size and resting place of the verdict plate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlateGeometry {
    pub width: f32,
    pub height: f32,
    /// Margin kept between the plate and the viewport edge
    pub field: f32,
    /// Bottom-left corner of the plate when showing a verdict
    pub corner: Vec2,
    /// Horizontal padding of the message text
    pub padding: f32,
    pub font_size: f32,
    pub success_font_size: f32,
}

impl PlateGeometry {
    pub fn new(viewport: Viewport) -> Self {
        let Viewport { width: w, height: h } = viewport;
        let field = w.min(h) * PLATE_FIELD;
        let s = (w - 2.0 * field).min((h - 2.0 * field) * PLATE_ASPECT);
        let width = (s * PLATE_SIZE).max(0.0);
        let height = width / PLATE_ASPECT;
        Self {
            width,
            height,
            field,
            corner: Vec2::new(w - width - field, h - height - field),
            padding: width * PLATE_PADDING,
            font_size: width * FONT_SIZE,
            success_font_size: width * SUCCESS_FONT_SIZE,
        }
    }
}

/// Pixel layout of the whole board for one viewport
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub viewport: Viewport,
    /// Barrel radius; every barrel box is `2 * radius` square
    pub radius: f32,
    /// Bottom-left corner of each barrel box, in barrel index order
    pub corners: Vec<Vec2>,
    pub plate: PlateGeometry,
}

impl Geometry {
    /// Largest whole-pixel radius that fits the plan into the viewport
    pub fn radius_for(plan: &RowPlan, viewport: Viewport) -> f32 {
        let by_width = viewport.width / (plan.num_columns() as f32 + 0.5);
        let by_height = viewport.height / ((plan.num_rows() as f32 + 0.5) * ROW_HEIGHT);
        (by_width.min(by_height) / 2.0).floor().max(0.0)
    }

    pub fn new(plan: &RowPlan, viewport: Viewport) -> Self {
        let radius = Self::radius_for(plan, viewport);
        let corners = plan
            .slots()
            .iter()
            .map(|slot| Vec2::new(slot.left() * radius, slot.bottom() * radius))
            .collect();
        Self {
            viewport,
            radius,
            corners,
            plate: PlateGeometry::new(viewport),
        }
    }

    /// Centre of a barrel's hit circle
    pub fn center(&self, index: usize) -> Option<Vec2> {
        self.corners
            .get(index)
            .map(|corner| *corner + Vec2::splat(self.radius))
    }

    /// Where the plate pops out of a tapped barrel
    pub fn plate_anchor(&self, index: usize) -> Option<Vec2> {
        self.center(index)
    }

    /// Plate position once it has slid off the right edge
    pub fn plate_offscreen(&self) -> Vec2 {
        Vec2::new(self.viewport.width, self.plate.corner.y)
    }

    /// Barrel under a point (bottom-left origin), if any
    pub fn hit_test(&self, point: Vec2) -> Option<usize> {
        if self.radius <= 0.0 {
            return None;
        }
        let r2 = self.radius * self.radius;
        (0..self.corners.len()).find(|&i| {
            self.center(i)
                .map(|c| c.distance_squared(point) <= r2)
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_default_wall() {
        let plan = RowPlan::new(19);
        // Width-bound: 1000 / 7.5 / 2 = 66.6
        let g = Geometry::new(&plan, Viewport::new(1000.0, 2000.0));
        assert_eq!(g.radius, 66.0);
        // Height-bound: 600 / (4.5 * 0.866) / 2 = 76.98
        let g = Geometry::new(&plan, Viewport::new(4000.0, 600.0));
        assert_eq!(g.radius, 76.0);
    }

    #[test]
    fn test_corners_scale_with_radius() {
        let plan = RowPlan::new(19);
        let g = Geometry::new(&plan, Viewport::new(1000.0, 2000.0));
        assert_eq!(g.corners.len(), 19);
        assert_eq!(g.corners[0], Vec2::ZERO);
        assert_eq!(g.corners[1], Vec2::new(132.0, 0.0));
        let second_row = g.corners[7];
        assert_eq!(second_row.x, 66.0);
        assert!((second_row.y - 2.0 * ROW_HEIGHT * 66.0).abs() < 1e-3);
    }

    #[test]
    fn test_hit_test() {
        let plan = RowPlan::new(19);
        let g = Geometry::new(&plan, Viewport::new(1000.0, 2000.0));
        let c = g.center(8).unwrap();
        assert_eq!(g.hit_test(c), Some(8));
        assert_eq!(g.hit_test(c + Vec2::new(g.radius - 1.0, 0.0)), Some(8));
        // Far top-right corner is empty
        assert_eq!(g.hit_test(Vec2::new(999.0, 1999.0)), None);
    }

    #[test]
    fn test_degenerate_viewport() {
        let plan = RowPlan::new(19);
        let g = Geometry::new(&plan, Viewport::default());
        assert_eq!(g.radius, 0.0);
        assert_eq!(g.hit_test(Vec2::ZERO), None);
    }

    #[test]
    fn test_plate_geometry() {
        let plate = PlateGeometry::new(Viewport::new(1000.0, 800.0));
        // field = 40, s = min(920, 720 * 4/3 = 960) = 920
        assert!((plate.field - 40.0).abs() < 1e-3);
        assert!((plate.width - 644.0).abs() < 1e-3);
        assert!((plate.height - 483.0).abs() < 1e-3);
        assert!((plate.corner.x - 316.0).abs() < 1e-3);
        assert!((plate.corner.y - 277.0).abs() < 1e-3);
        assert!(plate.success_font_size > plate.font_size);
    }
}
