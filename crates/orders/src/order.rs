use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estampa_core::{ClientId, DomainError, DomainResult, Entity, OrderId};

/// Default IVA percentage applied to new orders.
pub const DEFAULT_IVA: f64 = 16.0;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    InProduction,
    Ready,
    Delivered,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Received
    }
}

/// Order record as returned by the command API.
///
/// `subtotal` and `total` are a cache of the last pricing run over the
/// order's line items; whenever line items are known to have changed locally
/// they must be recomputed, never read back as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub client_id: ClientId,
    pub due_date: NaiveDate,
    /// Tax percentage (0–100).
    pub iva: f64,
    /// Absolute discount in MZN, never negative.
    pub discount: f64,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub total: f64,
    /// Amount still owed (total minus payments, tracked externally).
    pub debt: f64,
    /// Set on draft orders created before the user entered any real data.
    pub is_placeholder: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The total implied by the cached subtotal and the order's tax/discount
    /// parameters, floored at zero.
    pub fn expected_total(&self) -> f64 {
        (self.subtotal + self.subtotal * self.iva / 100.0 - self.discount).max(0.0)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// DTO: create an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub name: String,
    pub client_id: ClientId,
    pub due_date: NaiveDate,
    pub iva: f64,
    pub discount: f64,
    pub status: OrderStatus,
    pub is_placeholder: bool,
}

impl CreateOrder {
    pub fn validate(&self) -> DomainResult<()> {
        if !(0.0..=100.0).contains(&self.iva) {
            return Err(DomainError::validation("iva must be between 0 and 100"));
        }
        if self.discount < 0.0 {
            return Err(DomainError::validation("discount must not be negative"));
        }
        Ok(())
    }
}

/// DTO: partial order update (every field optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrder {
    pub name: Option<String>,
    pub client_id: Option<ClientId>,
    pub due_date: Option<NaiveDate>,
    pub iva: Option<f64>,
    pub discount: Option<f64>,
    pub subtotal: Option<f64>,
    pub total: Option<f64>,
    pub status: Option<OrderStatus>,
    pub is_placeholder: Option<bool>,
}

impl UpdateOrder {
    /// Patch carrying only recomputed financial values.
    pub fn totals(subtotal: f64, total: f64) -> Self {
        Self {
            subtotal: Some(subtotal),
            total: Some(total),
            ..Self::default()
        }
    }
}
