//! `estampa-orders` — order, garment-line and impression-line records,
//! their DTOs and validation, and the pure pricing calculator.

pub mod garment;
pub mod impression;
pub mod order;
pub mod pricing;

pub use garment::{
    CreateServiceCharge, GarmentKind, GarmentLine, GarmentLineDraft, Placement, ServiceCharge,
    ServiceKind, SizeMap,
};
pub use impression::{ImpressionLine, ImpressionLineDraft, ImpressionMaterial, UpdateImpressionLine};
pub use order::{CreateOrder, Order, OrderStatus, UpdateOrder, DEFAULT_IVA};
pub use pricing::{compute_totals, totals_from_subtotal, Totals};
