use async_trait::async_trait;

use estampa_clients::{Client, CreateClient, UpdateClient};
use estampa_core::{ClientId, GarmentLineId, ImpressionLineId, OrderId};
use estampa_orders::{
    CreateOrder, GarmentLine, GarmentLineDraft, ImpressionLine, ImpressionLineDraft, Order,
    UpdateImpressionLine, UpdateOrder,
};

use crate::error::ApiResult;

/// The command API consumed by the editor.
///
/// Semantics the editor relies on:
/// - records are plain serializable values; the backend assigns identifiers
///   and timestamps on create;
/// - single-record writes are atomic;
/// - deletes return `false` for an absent id instead of failing;
/// - deleting an order does NOT cascade into its lines; callers delete the
///   lines first.
#[async_trait]
pub trait ShopBackend: Send + Sync {
    async fn create_client(&self, dto: CreateClient) -> ApiResult<Client>;
    async fn update_client(&self, id: ClientId, dto: UpdateClient) -> ApiResult<Option<Client>>;
    async fn delete_client(&self, id: ClientId) -> ApiResult<bool>;
    async fn get_client_by_id(&self, id: ClientId) -> ApiResult<Option<Client>>;
    async fn list_clients(&self) -> ApiResult<Vec<Client>>;

    async fn create_order(&self, dto: CreateOrder) -> ApiResult<Order>;
    async fn update_order(&self, id: OrderId, dto: UpdateOrder) -> ApiResult<Order>;
    async fn delete_order(&self, id: OrderId) -> ApiResult<bool>;
    async fn get_order_by_id(&self, id: OrderId) -> ApiResult<Option<Order>>;
    async fn list_orders(&self) -> ApiResult<Vec<Order>>;

    async fn garment_lines_by_order(&self, order_id: OrderId) -> ApiResult<Vec<GarmentLine>>;
    async fn create_garment_line(
        &self,
        order_id: OrderId,
        draft: GarmentLineDraft,
    ) -> ApiResult<GarmentLine>;
    async fn delete_garment_line(&self, id: GarmentLineId) -> ApiResult<bool>;

    async fn impression_lines_by_order(&self, order_id: OrderId)
        -> ApiResult<Vec<ImpressionLine>>;
    async fn create_impression_line(
        &self,
        order_id: OrderId,
        draft: ImpressionLineDraft,
    ) -> ApiResult<ImpressionLine>;
    async fn update_impression_line(
        &self,
        id: ImpressionLineId,
        dto: UpdateImpressionLine,
    ) -> ApiResult<Option<ImpressionLine>>;
    async fn delete_impression_line(&self, id: ImpressionLineId) -> ApiResult<bool>;
}
