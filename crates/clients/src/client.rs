use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estampa_core::{ClientId, DomainError, DomainResult, Entity};

/// Category marker carried by auto-created placeholder clients.
///
/// A placeholder client exists only to satisfy a draft order's required
/// client reference; the marker keeps it recognizable (and filterable) in
/// client listings until the draft is committed or discarded.
pub const PLACEHOLDER_CATEGORY: &str = "placeholder";

/// Client (customer) record as returned by the command API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    /// Tax identification number (NUIT). Required, free text.
    pub nuit: String,
    pub contact: String,
    pub category: String,
    pub observations: String,
    /// Outstanding amount owed across this client's orders (MZN).
    pub debt: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Whether this record is an auto-created placeholder rather than a
    /// client the user registered.
    pub fn is_placeholder(&self) -> bool {
        self.category == PLACEHOLDER_CATEGORY
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// DTO: create a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub nuit: String,
    pub contact: String,
    pub category: String,
    pub observations: String,
}

impl CreateClient {
    /// Validate required fields (name, NUIT and contact must be non-empty).
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("client name is required"));
        }
        if self.nuit.trim().is_empty() {
            return Err(DomainError::validation("client NUIT is required"));
        }
        if self.contact.trim().is_empty() {
            return Err(DomainError::validation("client contact is required"));
        }
        Ok(())
    }

    /// A synthetic client satisfying required-field constraints, created only
    /// so a draft order has something to reference.
    pub fn placeholder() -> Self {
        Self {
            name: "Novo Cliente".to_string(),
            nuit: "0".to_string(),
            contact: "-".to_string(),
            category: PLACEHOLDER_CATEGORY.to_string(),
            observations: "auto-created for a draft order".to_string(),
        }
    }
}

/// DTO: partial client update (every field optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub nuit: Option<String>,
    pub contact: Option<String>,
    pub category: Option<String>,
    pub observations: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateClient {
        CreateClient {
            name: "Transportes Maputo Lda".to_string(),
            nuit: "400123456".to_string(),
            contact: "+258 84 000 0000".to_string(),
            category: "empresa".to_string(),
            observations: String::new(),
        }
    }

    #[test]
    fn create_with_required_fields_passes_validation() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut dto = valid_create();
        dto.name = "   ".to_string();
        let err = dto.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_nuit_is_rejected() {
        let mut dto = valid_create();
        dto.nuit = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn placeholder_dto_satisfies_required_fields() {
        let dto = CreateClient::placeholder();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.category, PLACEHOLDER_CATEGORY);
    }

    #[test]
    fn placeholder_marker_is_recognized_on_records() {
        let now = Utc::now();
        let dto = CreateClient::placeholder();
        let client = Client {
            id: ClientId::new(),
            name: dto.name,
            nuit: dto.nuit,
            contact: dto.contact,
            category: dto.category,
            observations: dto.observations,
            debt: 0.0,
            created_at: now,
            updated_at: now,
        };
        assert!(client.is_placeholder());
    }
}
