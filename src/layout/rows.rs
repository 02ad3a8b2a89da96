//! Row packing
//!
//! Barrels are stacked in rows that shrink by two per level, each row shifted
//! by one radius so neighbours nest into the gaps below (hexagonal close
//! packing, cut to a triangle). The packing is computed for `N + 1` slots: the
//! bottom row is emitted one barrel short, which keeps the wall centred.

use serde::{Deserialize, Serialize};

use crate::consts::ROW_HEIGHT;

/// Grid position of one barrel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Row index, 0 at the bottom
    pub row: usize,
    /// Column offset in radii (`row + 2 * index_in_row`)
    pub column: usize,
}

impl Slot {
    /// Distance of the barrel box from the bottom edge, in radii
    #[inline]
    pub fn bottom(&self) -> f32 {
        2.0 * self.row as f32 * ROW_HEIGHT
    }

    /// Distance of the barrel box from the left edge, in radii
    #[inline]
    pub fn left(&self) -> f32 {
        self.column as f32
    }
}

/// Row layout for a fixed number of barrels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPlan {
    /// Widths as allocated against `N + 1` slots
    nominal: Vec<usize>,
    /// Widths actually populated with barrels
    rows: Vec<usize>,
    /// Horizontal extent in barrel diameters, used for sizing
    columns: usize,
    /// Barrel slots in index order (bottom row first, left to right)
    slots: Vec<Slot>,
}

impl RowPlan {
    /// Width of the widest row: the even `n` with `n/2 * (n/2 + 1) >= N + 1`
    pub fn central_width(count: usize) -> usize {
        let slots = (count + 1) as f64;
        let half = (((4.0 * slots + 1.0).sqrt() - 1.0) / 2.0).ceil() as usize;
        2 * half
    }

    /// Pack `count` barrels (at least one)
    pub fn new(count: usize) -> Self {
        let count = count.max(1);
        let mut n = Self::central_width(count) as i64;
        let columns = (n - 1) as usize;

        let mut nominal = Vec::new();
        let mut rows = Vec::new();
        let mut remaining = (count + 1) as i64;
        while remaining > 0 {
            n = if n > 0 { n.min(remaining) } else { remaining };
            nominal.push(n as usize);
            rows.push(if rows.is_empty() { n as usize - 1 } else { n as usize });
            remaining -= n;
            n -= 2;
        }

        let slots = rows
            .iter()
            .enumerate()
            .flat_map(|(row, &width)| {
                (0..width).map(move |j| Slot {
                    row,
                    column: row + 2 * j,
                })
            })
            .collect();

        Self {
            nominal,
            rows,
            columns,
            slots,
        }
    }

    /// Populated row widths, bottom first
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Allocated row widths, bottom first (sums to `N + 1`)
    pub fn nominal(&self) -> &[usize] {
        &self.nominal
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of barrels
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
