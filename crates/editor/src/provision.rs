//! Draft order provisioning and teardown.
//!
//! Line items carry a foreign key to an order, and an order carries one to a
//! client, so neither can exist before both parent rows do. The provisioner
//! creates that scaffolding up front (a placeholder client and a draft
//! order), hands back a [`DraftHandle`], and later either commits the draft
//! into a real order or tears the scaffolding down again.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use estampa_api::{ApiError, ShopBackend};
use estampa_clients::CreateClient;
use estampa_core::{ClientId, OrderId};
use estampa_orders::{CreateOrder, Order, OrderStatus, UpdateOrder, DEFAULT_IVA};

/// Name given to a draft order before the user has typed a real one.
const DRAFT_ORDER_NAME: &str = "Novo Pedido";

/// State of one provisioned draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftHandle {
    pub order_id: OrderId,
    pub client_id: ClientId,
    /// Whether `client_id` points at the auto-created placeholder (and may
    /// therefore be deleted on discard) rather than a client the user chose.
    pub client_is_placeholder: bool,
}

/// `begin_draft` failed; no usable draft exists.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("placeholder client creation failed: {0}")]
    Client(#[source] ApiError),

    #[error("draft order creation failed: {0}")]
    Order(#[source] ApiError),
}

/// A discard-path delete failed.
///
/// Logged and dropped, never returned: cleanup is best-effort and an
/// orphaned placeholder row is an accepted inconsistency.
#[derive(Debug, Error)]
#[error("cleanup failed deleting {target} {id}: {source}")]
pub struct CleanupError {
    target: &'static str,
    id: String,
    #[source]
    source: ApiError,
}

pub struct DraftProvisioner<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ShopBackend + ?Sized> DraftProvisioner<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Create the placeholder client, then the draft order referencing it.
    ///
    /// If the client create fails nothing is left behind. If the order
    /// create fails the just-created client is deleted again (best-effort)
    /// before the error is returned. After a successful create the order is
    /// read back once to surface visibility problems immediately; a failed
    /// read-back is logged and does not block the handle.
    pub async fn begin_draft(&self) -> Result<DraftHandle, ProvisionError> {
        let client = self
            .backend
            .create_client(CreateClient::placeholder())
            .await
            .map_err(ProvisionError::Client)?;

        let dto = CreateOrder {
            name: DRAFT_ORDER_NAME.to_string(),
            client_id: client.id,
            due_date: Utc::now().date_naive(),
            iva: DEFAULT_IVA,
            discount: 0.0,
            status: OrderStatus::Received,
            is_placeholder: true,
        };

        let order = match self.backend.create_order(dto).await {
            Ok(order) => order,
            Err(err) => {
                if let Err(cleanup) = self.delete_client(client.id).await {
                    log_cleanup_failure(&cleanup);
                }
                return Err(ProvisionError::Order(err));
            }
        };

        match self.backend.get_order_by_id(order.id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(order_id = %order.id, "draft order not visible after create")
            }
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "draft order read-back failed")
            }
        }

        tracing::debug!(order_id = %order.id, client_id = %client.id, "draft provisioned");

        Ok(DraftHandle {
            order_id: order.id,
            client_id: client.id,
            client_is_placeholder: true,
        })
    }

    /// Finalize a draft: write the user's fields, point the order at the
    /// chosen client and clear the placeholder flag.
    ///
    /// The placeholder client is NOT deleted here, even when
    /// `chosen_client_id` differs from the one in the handle; callers that
    /// want no orphan call [`discard_placeholder_client`](Self::discard_placeholder_client)
    /// explicitly.
    pub async fn commit_draft(
        &self,
        handle: &DraftHandle,
        mut fields: UpdateOrder,
        chosen_client_id: ClientId,
    ) -> Result<Order, ApiError> {
        fields.client_id = Some(chosen_client_id);
        fields.is_placeholder = Some(false);

        let order = self.backend.update_order(handle.order_id, fields).await?;
        tracing::debug!(order_id = %order.id, client_id = %chosen_client_id, "draft committed");
        Ok(order)
    }

    /// Tear a draft down: delete the order first (it references the
    /// client), then the client if it is still the placeholder.
    ///
    /// Idempotent: a slot already cleared to `None` short-circuits. Each
    /// delete is independently best-effort: one failing does not stop the
    /// other, and failures are logged, never returned.
    pub async fn discard_draft(&self, slot: &mut Option<DraftHandle>) {
        let Some(handle) = slot.take() else {
            return;
        };

        if let Err(err) = self.delete_order(handle.order_id).await {
            log_cleanup_failure(&err);
        }

        if handle.client_is_placeholder {
            if let Err(err) = self.delete_client(handle.client_id).await {
                log_cleanup_failure(&err);
            }
        }

        tracing::debug!(order_id = %handle.order_id, "draft discarded");
    }

    /// Delete the handle's placeholder client (used after a commit that
    /// chose a different client, when the caller wants no orphan row).
    pub async fn discard_placeholder_client(&self, handle: &DraftHandle) {
        if !handle.client_is_placeholder {
            return;
        }
        if let Err(err) = self.delete_client(handle.client_id).await {
            log_cleanup_failure(&err);
        }
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), CleanupError> {
        self.backend
            .delete_order(id)
            .await
            .map(|_| ())
            .map_err(|source| CleanupError {
                target: "order",
                id: id.to_string(),
                source,
            })
    }

    async fn delete_client(&self, id: ClientId) -> Result<(), CleanupError> {
        self.backend
            .delete_client(id)
            .await
            .map(|_| ())
            .map_err(|source| CleanupError {
                target: "client",
                id: id.to_string(),
                source,
            })
    }
}

fn log_cleanup_failure(err: &CleanupError) {
    tracing::warn!(error = %err, "best-effort cleanup failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use estampa_api::InMemoryBackend;

    #[tokio::test]
    async fn begin_draft_creates_placeholder_client_and_draft_order() {
        let backend = Arc::new(InMemoryBackend::new());
        let provisioner = DraftProvisioner::new(Arc::clone(&backend));

        let handle = provisioner.begin_draft().await.unwrap();
        assert!(handle.client_is_placeholder);

        let order = backend
            .get_order_by_id(handle.order_id)
            .await
            .unwrap()
            .unwrap();
        assert!(order.is_placeholder);
        assert_eq!(order.client_id, handle.client_id);
        assert_eq!(order.iva, DEFAULT_IVA);
        assert_eq!(order.discount, 0.0);
        assert_eq!(order.status, OrderStatus::Received);
        assert_eq!(order.due_date, Utc::now().date_naive());

        let client = backend
            .get_client_by_id(handle.client_id)
            .await
            .unwrap()
            .unwrap();
        assert!(client.is_placeholder());
    }

    #[tokio::test]
    async fn discard_removes_order_then_placeholder_client() {
        let backend = Arc::new(InMemoryBackend::new());
        let provisioner = DraftProvisioner::new(Arc::clone(&backend));

        let handle = provisioner.begin_draft().await.unwrap();
        let mut slot = Some(handle);
        provisioner.discard_draft(&mut slot).await;

        assert!(slot.is_none());
        assert!(backend.list_orders().await.unwrap().is_empty());
        assert!(backend.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn discard_is_idempotent() {
        let backend = Arc::new(InMemoryBackend::new());
        let provisioner = DraftProvisioner::new(Arc::clone(&backend));

        let handle = provisioner.begin_draft().await.unwrap();
        let mut slot = Some(handle);
        provisioner.discard_draft(&mut slot).await;
        provisioner.discard_draft(&mut slot).await;

        assert!(slot.is_none());
    }

    #[tokio::test]
    async fn discard_keeps_a_real_client() {
        let backend = Arc::new(InMemoryBackend::new());
        let provisioner = DraftProvisioner::new(Arc::clone(&backend));

        let handle = provisioner.begin_draft().await.unwrap();
        let mut slot = Some(DraftHandle {
            client_is_placeholder: false,
            ..handle
        });
        provisioner.discard_draft(&mut slot).await;

        assert!(backend.list_orders().await.unwrap().is_empty());
        // The client was not ours to delete.
        assert_eq!(backend.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commit_clears_placeholder_flag_and_reassigns_client() {
        let backend = Arc::new(InMemoryBackend::new());
        let provisioner = DraftProvisioner::new(Arc::clone(&backend));

        let handle = provisioner.begin_draft().await.unwrap();
        let chosen = backend
            .create_client(estampa_clients::CreateClient {
                name: "Escola Central".to_string(),
                nuit: "400000001".to_string(),
                contact: "+258 84 111 1111".to_string(),
                category: "escola".to_string(),
                observations: String::new(),
            })
            .await
            .unwrap();

        let order = provisioner
            .commit_draft(
                &handle,
                UpdateOrder {
                    name: Some("Fardamento 2025".to_string()),
                    ..UpdateOrder::default()
                },
                chosen.id,
            )
            .await
            .unwrap();

        assert!(!order.is_placeholder);
        assert_eq!(order.client_id, chosen.id);
        assert_eq!(order.name, "Fardamento 2025");

        // Commit does not delete the placeholder client.
        let clients = backend.list_clients().await.unwrap();
        assert_eq!(clients.len(), 2);

        provisioner.discard_placeholder_client(&handle).await;
        let clients = backend.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, chosen.id);
    }
}
