use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use estampa_clients::{Client, CreateClient, UpdateClient};
use estampa_core::{ClientId, GarmentLineId, ImpressionLineId, OrderId, ServiceChargeId};
use estampa_orders::{
    CreateOrder, GarmentLine, GarmentLineDraft, ImpressionLine, ImpressionLineDraft, Order,
    ServiceCharge, UpdateImpressionLine, UpdateOrder,
};

use crate::error::{ApiError, ApiResult};
use crate::port::ShopBackend;

#[derive(Debug, Default)]
struct Tables {
    clients: HashMap<ClientId, Client>,
    orders: HashMap<OrderId, Order>,
    garments: HashMap<GarmentLineId, GarmentLine>,
    impressions: HashMap<ImpressionLineId, ImpressionLine>,
}

/// In-memory command backend.
///
/// Intended for tests/dev. Assigns identifiers and timestamps on create,
/// never cascades deletes, and keeps every write atomic under one lock.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ApiResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| ApiError::command("lock poisoned"))
    }

    fn write(&self) -> ApiResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| ApiError::command("lock poisoned"))
    }
}

#[async_trait]
impl ShopBackend for InMemoryBackend {
    async fn create_client(&self, dto: CreateClient) -> ApiResult<Client> {
        let now = Utc::now();
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
        self.write()?.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(&self, id: ClientId, dto: UpdateClient) -> ApiResult<Option<Client>> {
        let mut tables = self.write()?;
        let Some(client) = tables.clients.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = dto.name {
            client.name = name;
        }
        if let Some(nuit) = dto.nuit {
            client.nuit = nuit;
        }
        if let Some(contact) = dto.contact {
            client.contact = contact;
        }
        if let Some(category) = dto.category {
            client.category = category;
        }
        if let Some(observations) = dto.observations {
            client.observations = observations;
        }
        client.updated_at = Utc::now();
        Ok(Some(client.clone()))
    }

    async fn delete_client(&self, id: ClientId) -> ApiResult<bool> {
        Ok(self.write()?.clients.remove(&id).is_some())
    }

    async fn get_client_by_id(&self, id: ClientId) -> ApiResult<Option<Client>> {
        Ok(self.read()?.clients.get(&id).cloned())
    }

    async fn list_clients(&self) -> ApiResult<Vec<Client>> {
        let mut clients: Vec<Client> = self.read()?.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(clients)
    }

    async fn create_order(&self, dto: CreateOrder) -> ApiResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            name: dto.name,
            client_id: dto.client_id,
            due_date: dto.due_date,
            iva: dto.iva,
            discount: dto.discount,
            status: dto.status,
            subtotal: 0.0,
            total: 0.0,
            debt: 0.0,
            is_placeholder: dto.is_placeholder,
            created_at: now,
            updated_at: now,
        };
        self.write()?.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update_order(&self, id: OrderId, dto: UpdateOrder) -> ApiResult<Order> {
        let mut tables = self.write()?;
        let order = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| ApiError::command(format!("order {id} not found")))?;
        if let Some(name) = dto.name {
            order.name = name;
        }
        if let Some(client_id) = dto.client_id {
            order.client_id = client_id;
        }
        if let Some(due_date) = dto.due_date {
            order.due_date = due_date;
        }
        if let Some(iva) = dto.iva {
            order.iva = iva;
        }
        if let Some(discount) = dto.discount {
            order.discount = discount;
        }
        if let Some(subtotal) = dto.subtotal {
            order.subtotal = subtotal;
        }
        if let Some(total) = dto.total {
            order.total = total;
        }
        if let Some(status) = dto.status {
            order.status = status;
        }
        if let Some(is_placeholder) = dto.is_placeholder {
            order.is_placeholder = is_placeholder;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> ApiResult<bool> {
        Ok(self.write()?.orders.remove(&id).is_some())
    }

    async fn get_order_by_id(&self, id: OrderId) -> ApiResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> ApiResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.read()?.orders.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    async fn garment_lines_by_order(&self, order_id: OrderId) -> ApiResult<Vec<GarmentLine>> {
        let mut lines: Vec<GarmentLine> = self
            .read()?
            .garments
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect();
        lines.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(lines)
    }

    async fn create_garment_line(
        &self,
        order_id: OrderId,
        draft: GarmentLineDraft,
    ) -> ApiResult<GarmentLine> {
        let now = Utc::now();
        let id = GarmentLineId::new();
        let line = GarmentLine {
            id,
            order_id,
            kind: draft.kind,
            unit_price: draft.unit_price,
            total_quantity: draft.sizes.total(),
            sizes: draft.sizes,
            color: draft.color,
            services: draft
                .services
                .into_iter()
                .map(|s| ServiceCharge {
                    id: ServiceChargeId::new(),
                    garment_line_id: id,
                    kind: s.kind,
                    placement: s.placement,
                    description: s.description,
                    unit_price: s.unit_price,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.write()?.garments.insert(line.id, line.clone());
        Ok(line)
    }

    async fn delete_garment_line(&self, id: GarmentLineId) -> ApiResult<bool> {
        Ok(self.write()?.garments.remove(&id).is_some())
    }

    async fn impression_lines_by_order(
        &self,
        order_id: OrderId,
    ) -> ApiResult<Vec<ImpressionLine>> {
        let mut lines: Vec<ImpressionLine> = self
            .read()?
            .impressions
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect();
        lines.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(lines)
    }

    async fn create_impression_line(
        &self,
        order_id: OrderId,
        draft: ImpressionLineDraft,
    ) -> ApiResult<ImpressionLine> {
        let now = Utc::now();
        let line = ImpressionLine {
            id: ImpressionLineId::new(),
            order_id,
            name: draft.name,
            size: draft.size,
            material: draft.material,
            description: draft.description,
            price: draft.price,
            created_at: now,
            updated_at: now,
        };
        self.write()?.impressions.insert(line.id, line.clone());
        Ok(line)
    }

    async fn update_impression_line(
        &self,
        id: ImpressionLineId,
        dto: UpdateImpressionLine,
    ) -> ApiResult<Option<ImpressionLine>> {
        let mut tables = self.write()?;
        let Some(line) = tables.impressions.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = dto.name {
            line.name = name;
        }
        if let Some(size) = dto.size {
            line.size = size;
        }
        if let Some(material) = dto.material {
            line.material = material;
        }
        if let Some(description) = dto.description {
            line.description = Some(description);
        }
        if let Some(price) = dto.price {
            line.price = price;
        }
        line.updated_at = Utc::now();
        Ok(Some(line.clone()))
    }

    async fn delete_impression_line(&self, id: ImpressionLineId) -> ApiResult<bool> {
        Ok(self.write()?.impressions.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use estampa_orders::{
        CreateServiceCharge, GarmentKind, OrderStatus, Placement, ServiceKind, SizeMap,
        DEFAULT_IVA,
    };

    fn create_order_dto(client_id: ClientId) -> CreateOrder {
        CreateOrder {
            name: "Pedido".to_string(),
            client_id,
            due_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            iva: DEFAULT_IVA,
            discount: 0.0,
            status: OrderStatus::Received,
            is_placeholder: false,
        }
    }

    #[tokio::test]
    async fn client_crud_round_trip() {
        let backend = InMemoryBackend::new();
        let created = backend
            .create_client(CreateClient::placeholder())
            .await
            .unwrap();

        let fetched = backend.get_client_by_id(created.id).await.unwrap();
        assert_eq!(fetched.as_ref(), Some(&created));
        assert_eq!(backend.list_clients().await.unwrap().len(), 1);

        assert!(backend.delete_client(created.id).await.unwrap());
        assert!(!backend.delete_client(created.id).await.unwrap());
        assert!(backend.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_order_patches_only_given_fields() {
        let backend = InMemoryBackend::new();
        let client = backend
            .create_client(CreateClient::placeholder())
            .await
            .unwrap();
        let order = backend
            .create_order(create_order_dto(client.id))
            .await
            .unwrap();

        let updated = backend
            .update_order(
                order.id,
                UpdateOrder {
                    name: Some("Fardas".to_string()),
                    ..UpdateOrder::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Fardas");
        assert_eq!(updated.iva, order.iva);
        assert_eq!(updated.client_id, order.client_id);
    }

    #[tokio::test]
    async fn update_of_missing_order_is_a_command_error() {
        let backend = InMemoryBackend::new();
        let err = backend
            .update_order(OrderId::new(), UpdateOrder::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Command(_)));
    }

    #[tokio::test]
    async fn garment_line_create_derives_quantity_and_service_ids() {
        let backend = InMemoryBackend::new();
        let client = backend
            .create_client(CreateClient::placeholder())
            .await
            .unwrap();
        let order = backend
            .create_order(create_order_dto(client.id))
            .await
            .unwrap();

        let mut draft = GarmentLineDraft::new(
            GarmentKind::WithCollar,
            100.0,
            SizeMap {
                s: 2,
                m: 3,
                ..SizeMap::default()
            },
            "Azul",
        );
        draft
            .add_service(CreateServiceCharge {
                kind: ServiceKind::Stamping,
                placement: Placement::FrontRight,
                description: None,
                unit_price: 50.0,
            })
            .unwrap();

        let line = backend.create_garment_line(order.id, draft).await.unwrap();
        assert_eq!(line.total_quantity, 5);
        assert_eq!(line.services.len(), 1);
        assert_eq!(line.services[0].garment_line_id, line.id);

        let listed = backend.garment_lines_by_order(order.id).await.unwrap();
        assert_eq!(listed, vec![line]);
    }

    #[tokio::test]
    async fn deleting_an_order_leaves_its_lines_in_place() {
        let backend = InMemoryBackend::new();
        let client = backend
            .create_client(CreateClient::placeholder())
            .await
            .unwrap();
        let order = backend
            .create_order(create_order_dto(client.id))
            .await
            .unwrap();
        let draft = GarmentLineDraft::new(
            GarmentKind::Uniform,
            80.0,
            SizeMap {
                m: 1,
                ..SizeMap::default()
            },
            "Verde",
        );
        backend.create_garment_line(order.id, draft).await.unwrap();

        assert!(backend.delete_order(order.id).await.unwrap());
        // No cascade: the line survives until deleted explicitly.
        assert_eq!(
            backend.garment_lines_by_order(order.id).await.unwrap().len(),
            1
        );
    }
}
