//! Process-scoped read cache for the order and client lists.
//!
//! One owned instance is shared (by `&mut`) between the list views and the
//! editor session; there is no ambient global state. Reloads are explicit:
//! the editor invalidates/reloads after lifecycle steps that change what the
//! lists should show (a committed draft appears, a discarded one vanishes).

use estampa_api::{ApiResult, ShopBackend};
use estampa_clients::Client;
use estampa_orders::Order;

#[derive(Debug, Default)]
pub struct ShopCache {
    orders: Option<Vec<Order>>,
    clients: Option<Vec<Client>>,
}

impl ShopCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached orders; empty until the first reload.
    pub fn orders(&self) -> &[Order] {
        self.orders.as_deref().unwrap_or(&[])
    }

    /// Cached clients; empty until the first reload.
    pub fn clients(&self) -> &[Client] {
        self.clients.as_deref().unwrap_or(&[])
    }

    pub fn has_orders(&self) -> bool {
        self.orders.is_some()
    }

    pub fn invalidate_orders(&mut self) {
        self.orders = None;
    }

    pub fn invalidate_clients(&mut self) {
        self.clients = None;
    }

    pub async fn reload_orders(&mut self, backend: &dyn ShopBackend) -> ApiResult<&[Order]> {
        let orders = backend.list_orders().await?;
        self.orders = Some(orders);
        Ok(self.orders.as_deref().unwrap_or(&[]))
    }

    pub async fn reload_clients(&mut self, backend: &dyn ShopBackend) -> ApiResult<&[Client]> {
        let clients = backend.list_clients().await?;
        self.clients = Some(clients);
        Ok(self.clients.as_deref().unwrap_or(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estampa_api::InMemoryBackend;
    use estampa_clients::CreateClient;

    #[tokio::test]
    async fn reload_replaces_the_cached_snapshot() {
        let backend = InMemoryBackend::new();
        let mut cache = ShopCache::new();

        assert!(cache.clients().is_empty());
        backend
            .create_client(CreateClient::placeholder())
            .await
            .unwrap();

        let clients = cache.reload_clients(&backend).await.unwrap();
        assert_eq!(clients.len(), 1);

        cache.invalidate_clients();
        assert!(cache.clients().is_empty());
    }
}
