//! Pure pricing over an order's current line items.
//!
//! The calculator has no state and no I/O; callers re-run it after every line
//! mutation and treat the order's stored `subtotal`/`total` purely as the
//! cache of the last result.

use serde::{Deserialize, Serialize};

use crate::garment::GarmentLine;
use crate::impression::ImpressionLine;

/// Result of one pricing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Compute order totals from the current line items.
///
/// `subtotal` is the sum of every garment line value plus every impression
/// price; `tax = subtotal × iva / 100`; `total` is subtotal plus tax minus
/// the absolute discount, floored at zero so an oversized discount can never
/// drive it negative.
pub fn compute_totals(
    garments: &[GarmentLine],
    impressions: &[ImpressionLine],
    iva: f64,
    discount: f64,
) -> Totals {
    let garment_value: f64 = garments.iter().map(GarmentLine::line_value).sum();
    let impression_value: f64 = impressions.iter().map(|i| i.price).sum();
    totals_from_subtotal(garment_value + impression_value, iva, discount)
}

/// Apply tax and discount to an already-summed subtotal.
pub fn totals_from_subtotal(subtotal: f64, iva: f64, discount: f64) -> Totals {
    let tax = subtotal * iva / 100.0;
    let total = (subtotal + tax - discount).max(0.0);
    Totals {
        subtotal,
        tax,
        total,
    }
}
