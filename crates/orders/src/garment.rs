use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estampa_core::{DomainError, DomainResult, Entity, GarmentLineId, OrderId, ServiceChargeId};

/// Kind of garment on a line.
///
/// Closed set of shop staples plus a free-text escape for anything else; the
/// label is required exactly when the kind is `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GarmentKind {
    WithCollar,
    WithoutCollar,
    ThickCap,
    SimpleCap,
    Reflectors,
    Uniform,
    Custom { label: String },
}

impl GarmentKind {
    pub fn is_custom(&self) -> bool {
        matches!(self, GarmentKind::Custom { .. })
    }

    pub fn custom_label(&self) -> Option<&str> {
        match self {
            GarmentKind::Custom { label } => Some(label),
            _ => None,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        if let GarmentKind::Custom { label } = self {
            if label.trim().is_empty() {
                return Err(DomainError::validation(
                    "custom garment kind requires a label",
                ));
            }
        }
        Ok(())
    }
}

/// Decoration/finishing service applied to a garment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Embroidery,
    Stamping,
    Dtf,
    Transfer,
}

/// Placement of a service on the garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    FrontRight,
    FrontLeft,
    Back,
    SleeveLeft,
    SleeveRight,
    CenterFront,
    CenterBack,
    LeftSide,
    RightSide,
    Top,
    Bottom,
}

/// Per-size quantities for a garment line. Keys are fixed; quantities are
/// non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeMap {
    #[serde(rename = "S")]
    pub s: u32,
    #[serde(rename = "M")]
    pub m: u32,
    #[serde(rename = "L")]
    pub l: u32,
    #[serde(rename = "XL")]
    pub xl: u32,
    #[serde(rename = "XXL")]
    pub xxl: u32,
    #[serde(rename = "XXXL")]
    pub xxxl: u32,
}

impl SizeMap {
    /// Total quantity across all sizes. Always derived from the map; the
    /// stored `total_quantity` on a line is a copy of this, never maintained
    /// independently.
    pub fn total(&self) -> u32 {
        self.s + self.m + self.l + self.xl + self.xxl + self.xxxl
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Persisted service charge attached to a garment line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCharge {
    pub id: ServiceChargeId,
    pub garment_line_id: GarmentLineId,
    pub kind: ServiceKind,
    pub placement: Placement,
    pub description: Option<String>,
    pub unit_price: f64,
}

/// DTO: service charge submitted together with a garment line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateServiceCharge {
    pub kind: ServiceKind,
    pub placement: Placement,
    pub description: Option<String>,
    pub unit_price: f64,
}

impl CreateServiceCharge {
    pub fn validate(&self) -> DomainResult<()> {
        if self.unit_price <= 0.0 {
            return Err(DomainError::validation(
                "service unit price must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Persisted garment line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentLine {
    pub id: GarmentLineId,
    pub order_id: OrderId,
    pub kind: GarmentKind,
    /// Base price per piece, before services.
    pub unit_price: f64,
    pub sizes: SizeMap,
    pub color: String,
    /// Derived: `sizes.total()` at write time.
    pub total_quantity: u32,
    pub services: Vec<ServiceCharge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GarmentLine {
    /// Sum of the per-piece service prices on this line.
    pub fn services_total(&self) -> f64 {
        self.services.iter().map(|s| s.unit_price).sum()
    }

    /// Value this line contributes to the order subtotal:
    /// `(unit_price + services) × quantity`.
    pub fn line_value(&self) -> f64 {
        (self.unit_price + self.services_total()) * f64::from(self.total_quantity)
    }
}

impl Entity for GarmentLine {
    type Id = GarmentLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// DTO: garment line being assembled in the editor before persistence.
///
/// Service charges are attached here, on the not-yet-persisted draft, via
/// [`GarmentLineDraft::add_service`]; the whole draft is submitted in one
/// create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentLineDraft {
    pub kind: GarmentKind,
    pub unit_price: f64,
    pub sizes: SizeMap,
    pub color: String,
    pub services: Vec<CreateServiceCharge>,
}

impl GarmentLineDraft {
    pub fn new(kind: GarmentKind, unit_price: f64, sizes: SizeMap, color: impl Into<String>) -> Self {
        Self {
            kind,
            unit_price,
            sizes,
            color: color.into(),
            services: Vec::new(),
        }
    }

    /// Append a service charge, rejecting non-positive prices and duplicate
    /// `(kind, placement)` slots. On rejection the charge list is unchanged.
    pub fn add_service(&mut self, charge: CreateServiceCharge) -> DomainResult<()> {
        charge.validate()?;
        if self.has_service_slot(charge.kind, charge.placement) {
            return Err(DomainError::invariant(
                "a service of this kind already occupies this placement",
            ));
        }
        self.services.push(charge);
        Ok(())
    }

    pub fn has_service_slot(&self, kind: ServiceKind, placement: Placement) -> bool {
        self.services
            .iter()
            .any(|s| s.kind == kind && s.placement == placement)
    }

    /// Remove the service occupying a slot. Idempotent: removing an absent
    /// slot is a no-op (the UI may issue a stale removal).
    pub fn remove_service(&mut self, kind: ServiceKind, placement: Placement) {
        self.services
            .retain(|s| !(s.kind == kind && s.placement == placement));
    }

    /// Value this draft would contribute to the order subtotal once
    /// persisted; same formula as [`GarmentLine::line_value`].
    pub fn line_value(&self) -> f64 {
        let services: f64 = self.services.iter().map(|s| s.unit_price).sum();
        (self.unit_price + services) * f64::from(self.sizes.total())
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.color.trim().is_empty() {
            return Err(DomainError::validation("color is required"));
        }
        self.kind.validate()?;
        if self.unit_price < 0.0 {
            return Err(DomainError::validation("unit price must not be negative"));
        }
        if self.sizes.is_empty() {
            return Err(DomainError::validation(
                "at least one size quantity is required",
            ));
        }
        for (idx, service) in self.services.iter().enumerate() {
            service.validate()?;
            let duplicate = self.services[..idx]
                .iter()
                .any(|s| s.kind == service.kind && s.placement == service.placement);
            if duplicate {
                return Err(DomainError::invariant(
                    "a service of this kind already occupies this placement",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sizes(s: u32, m: u32) -> SizeMap {
        SizeMap {
            s,
            m,
            ..SizeMap::default()
        }
    }

    fn stamping_front_right(price: f64) -> CreateServiceCharge {
        CreateServiceCharge {
            kind: ServiceKind::Stamping,
            placement: Placement::FrontRight,
            description: None,
            unit_price: price,
        }
    }

    #[test]
    fn size_map_total_sums_all_sizes() {
        let map = SizeMap {
            s: 2,
            m: 3,
            xl: 1,
            ..SizeMap::default()
        };
        assert_eq!(map.total(), 6);
    }

    #[test]
    fn draft_with_empty_color_is_rejected() {
        let draft = GarmentLineDraft::new(GarmentKind::WithCollar, 100.0, sizes(2, 3), "  ");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn custom_kind_requires_label() {
        let draft = GarmentLineDraft::new(
            GarmentKind::Custom {
                label: String::new(),
            },
            50.0,
            sizes(1, 0),
            "Preto",
        );
        assert!(draft.validate().is_err());

        let draft = GarmentLineDraft::new(
            GarmentKind::Custom {
                label: "Cachecol".to_string(),
            },
            50.0,
            sizes(1, 0),
            "Preto",
        );
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn zero_total_quantity_is_rejected() {
        let draft = GarmentLineDraft::new(GarmentKind::Uniform, 100.0, SizeMap::default(), "Azul");
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_unit_price_is_rejected() {
        let draft = GarmentLineDraft::new(GarmentKind::Uniform, -1.0, sizes(1, 0), "Azul");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn duplicate_service_slot_is_rejected_and_list_unchanged() {
        let mut draft = GarmentLineDraft::new(GarmentKind::WithCollar, 100.0, sizes(2, 3), "Azul");
        draft.add_service(stamping_front_right(50.0)).unwrap();

        let err = draft.add_service(stamping_front_right(30.0)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(draft.services.len(), 1);
        assert_eq!(draft.services[0].unit_price, 50.0);
    }

    #[test]
    fn same_kind_different_placement_is_allowed() {
        let mut draft = GarmentLineDraft::new(GarmentKind::WithCollar, 100.0, sizes(2, 3), "Azul");
        draft.add_service(stamping_front_right(50.0)).unwrap();
        draft
            .add_service(CreateServiceCharge {
                kind: ServiceKind::Stamping,
                placement: Placement::Back,
                description: None,
                unit_price: 70.0,
            })
            .unwrap();
        assert_eq!(draft.services.len(), 2);
    }

    #[test]
    fn removing_a_service_slot_is_idempotent() {
        let mut draft = GarmentLineDraft::new(GarmentKind::WithCollar, 100.0, sizes(2, 3), "Azul");
        draft.add_service(stamping_front_right(50.0)).unwrap();

        draft.remove_service(ServiceKind::Stamping, Placement::FrontRight);
        assert!(draft.services.is_empty());

        // Already gone; nothing happens.
        draft.remove_service(ServiceKind::Stamping, Placement::FrontRight);
        assert!(draft.services.is_empty());

        // The slot is free again.
        assert!(draft.add_service(stamping_front_right(40.0)).is_ok());
    }

    #[test]
    fn non_positive_service_price_is_rejected() {
        let mut draft = GarmentLineDraft::new(GarmentKind::WithCollar, 100.0, sizes(2, 3), "Azul");
        assert!(draft.add_service(stamping_front_right(0.0)).is_err());
        assert!(draft.services.is_empty());
    }

    #[test]
    fn garment_kind_serializes_with_kind_tag() {
        let json = serde_json::to_string(&GarmentKind::WithCollar).unwrap();
        assert_eq!(json, "{\"kind\":\"with_collar\"}");

        let json = serde_json::to_string(&GarmentKind::Custom {
            label: "Cachecol".to_string(),
        })
        .unwrap();
        assert_eq!(json, "{\"kind\":\"custom\",\"label\":\"Cachecol\"}");
    }

    proptest! {
        /// Property: the derived total always equals the sum of the six
        /// per-size quantities.
        #[test]
        fn size_map_total_equals_field_sum(
            s in 0u32..1000,
            m in 0u32..1000,
            l in 0u32..1000,
            xl in 0u32..1000,
            xxl in 0u32..1000,
            xxxl in 0u32..1000,
        ) {
            let map = SizeMap { s, m, l, xl, xxl, xxxl };
            prop_assert_eq!(map.total(), s + m + l + xl + xxl + xxxl);
        }

        /// Property: a map summing to zero never passes draft validation.
        #[test]
        fn empty_size_map_never_validates(price in 0.0f64..10_000.0) {
            let draft = GarmentLineDraft::new(
                GarmentKind::Uniform,
                price,
                SizeMap::default(),
                "Azul",
            );
            prop_assert!(draft.validate().is_err());
        }
    }
}
