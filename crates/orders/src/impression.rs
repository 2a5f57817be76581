use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estampa_core::{DomainError, DomainResult, Entity, ImpressionLineId, OrderId};

/// Print material for an impression line.
///
/// Closed set plus a free-text escape; the label is required exactly when the
/// material is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImpressionMaterial {
    VinylWhite,
    VinylTransparent,
    VinylPerforated,
    VinylCut,
    BannerBlackWhite,
    Backlite,
    FlagFabric,
    Other { label: String },
}

impl ImpressionMaterial {
    pub fn is_other(&self) -> bool {
        matches!(self, ImpressionMaterial::Other { .. })
    }

    fn validate(&self) -> DomainResult<()> {
        if let ImpressionMaterial::Other { label } = self {
            if label.trim().is_empty() {
                return Err(DomainError::validation(
                    "custom material requires a label",
                ));
            }
        }
        Ok(())
    }
}

/// Persisted impression (print job) line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpressionLine {
    pub id: ImpressionLineId,
    pub order_id: OrderId,
    pub name: String,
    /// Free-text dimensions, e.g. "2m x 1m".
    pub size: String,
    pub material: ImpressionMaterial,
    pub description: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ImpressionLine {
    type Id = ImpressionLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// DTO: impression line submitted by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpressionLineDraft {
    pub name: String,
    pub size: String,
    pub material: ImpressionMaterial,
    pub description: Option<String>,
    pub price: f64,
}

impl ImpressionLineDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("impression name is required"));
        }
        if self.size.trim().is_empty() {
            return Err(DomainError::validation("impression size is required"));
        }
        self.material.validate()?;
        if self.price <= 0.0 {
            return Err(DomainError::validation(
                "impression price must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// DTO: partial impression update (every field optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateImpressionLine {
    pub name: Option<String>,
    pub size: Option<String>,
    pub material: Option<ImpressionMaterial>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> ImpressionLineDraft {
        ImpressionLineDraft {
            name: "Banner entrada".to_string(),
            size: "2m x 1m".to_string(),
            material: ImpressionMaterial::VinylWhite,
            description: None,
            price: 350.0,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn blank_name_or_size_is_rejected() {
        let mut draft = valid_draft();
        draft.name = " ".to_string();
        assert!(draft.validate().is_err());

        let mut draft = valid_draft();
        draft.size = String::new();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut draft = valid_draft();
        draft.price = 0.0;
        assert!(draft.validate().is_err());
    }

    #[test]
    fn other_material_requires_label() {
        let mut draft = valid_draft();
        draft.material = ImpressionMaterial::Other {
            label: String::new(),
        };
        assert!(draft.validate().is_err());

        draft.material = ImpressionMaterial::Other {
            label: "Lona".to_string(),
        };
        assert!(draft.validate().is_ok());
    }
}
