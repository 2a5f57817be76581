//! Line-item collections scoped to one order id.
//!
//! The aggregator is the only path the editor uses to attach or detach
//! garment and impression lines. It validates locally before every backend
//! call, caches the per-order collections after the first fetch, and
//! invalidates the cache on every mutation so a known-stale list is never
//! served back to the pricing pass.

use std::collections::HashMap;
use std::sync::Arc;

use estampa_api::ShopBackend;
use estampa_core::{DomainResult, GarmentLineId, ImpressionLineId, OrderId};
use estampa_orders::{
    CreateServiceCharge, GarmentLine, GarmentLineDraft, ImpressionLine, ImpressionLineDraft,
    Placement, ServiceKind,
};

use crate::error::EditorError;

pub struct LineItemAggregator<B: ?Sized> {
    backend: Arc<B>,
    garments: HashMap<OrderId, Vec<GarmentLine>>,
    impressions: HashMap<OrderId, Vec<ImpressionLine>>,
}

impl<B: ShopBackend + ?Sized> LineItemAggregator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            garments: HashMap::new(),
            impressions: HashMap::new(),
        }
    }

    /// Garment lines for the order, fetched lazily on first access and
    /// cached until the next mutation for that order id.
    pub async fn garment_lines(&mut self, order_id: OrderId) -> Result<Vec<GarmentLine>, EditorError> {
        if let Some(cached) = self.garments.get(&order_id) {
            return Ok(cached.clone());
        }
        let lines = self.backend.garment_lines_by_order(order_id).await?;
        self.garments.insert(order_id, lines.clone());
        Ok(lines)
    }

    /// Impression lines for the order, same caching contract as
    /// [`garment_lines`](Self::garment_lines).
    pub async fn impression_lines(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<ImpressionLine>, EditorError> {
        if let Some(cached) = self.impressions.get(&order_id) {
            return Ok(cached.clone());
        }
        let lines = self.backend.impression_lines_by_order(order_id).await?;
        self.impressions.insert(order_id, lines.clone());
        Ok(lines)
    }

    pub fn cached_garment_lines(&self, order_id: OrderId) -> Option<&[GarmentLine]> {
        self.garments.get(&order_id).map(Vec::as_slice)
    }

    pub fn cached_impression_lines(&self, order_id: OrderId) -> Option<&[ImpressionLine]> {
        self.impressions.get(&order_id).map(Vec::as_slice)
    }

    /// Drop the cached collections for an order, forcing the next read to
    /// hit the backend.
    pub fn invalidate(&mut self, order_id: OrderId) {
        self.garments.remove(&order_id);
        self.impressions.remove(&order_id);
    }

    /// Drop the cache and fetch fresh collections (used when a tab may have
    /// been opened before the first round trip completed).
    pub async fn reload_garment_lines(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<GarmentLine>, EditorError> {
        self.garments.remove(&order_id);
        self.garment_lines(order_id).await
    }

    pub async fn reload_impression_lines(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<ImpressionLine>, EditorError> {
        self.impressions.remove(&order_id);
        self.impression_lines(order_id).await
    }

    /// Validate and persist a garment line, invalidating the cached list.
    pub async fn add_garment_line(
        &mut self,
        order_id: OrderId,
        draft: GarmentLineDraft,
    ) -> Result<GarmentLine, EditorError> {
        draft.validate()?;
        let line = self.backend.create_garment_line(order_id, draft).await?;
        self.invalidate(order_id);
        Ok(line)
    }

    /// Attach a service charge to a garment line still being assembled.
    ///
    /// Rejects non-positive prices and duplicate `(kind, placement)` slots;
    /// on rejection the draft's charge list is left unchanged.
    pub fn add_service_charge(
        &self,
        draft: &mut GarmentLineDraft,
        charge: CreateServiceCharge,
    ) -> DomainResult<()> {
        draft.add_service(charge)
    }

    /// Detach a service charge from a draft line. Idempotent for slots that
    /// are already empty.
    pub fn remove_service_charge(
        &self,
        draft: &mut GarmentLineDraft,
        kind: ServiceKind,
        placement: Placement,
    ) {
        draft.remove_service(kind, placement);
    }

    /// Remove a garment line. Idempotent: removing an id the backend no
    /// longer knows is a no-op success (the UI may issue a stale removal
    /// after a reload).
    pub async fn remove_garment_line(
        &mut self,
        order_id: OrderId,
        line_id: GarmentLineId,
    ) -> Result<(), EditorError> {
        let removed = self.backend.delete_garment_line(line_id).await?;
        if !removed {
            tracing::debug!(%order_id, %line_id, "garment line already absent on removal");
        }
        self.invalidate(order_id);
        Ok(())
    }

    /// Validate and persist an impression line, invalidating the cached list.
    pub async fn add_impression_line(
        &mut self,
        order_id: OrderId,
        draft: ImpressionLineDraft,
    ) -> Result<ImpressionLine, EditorError> {
        draft.validate()?;
        let line = self.backend.create_impression_line(order_id, draft).await?;
        self.invalidate(order_id);
        Ok(line)
    }

    /// Remove an impression line. Same idempotency contract as
    /// [`remove_garment_line`](Self::remove_garment_line).
    pub async fn remove_impression_line(
        &mut self,
        order_id: OrderId,
        line_id: ImpressionLineId,
    ) -> Result<(), EditorError> {
        let removed = self.backend.delete_impression_line(line_id).await?;
        if !removed {
            tracing::debug!(%order_id, %line_id, "impression line already absent on removal");
        }
        self.invalidate(order_id);
        Ok(())
    }

    /// Delete every line attached to an order.
    ///
    /// The store does not cascade, so this runs before an order delete.
    /// Best-effort: individual failures are logged and skipped, since this
    /// only runs on the discard path.
    pub async fn discard_lines_for(&mut self, order_id: OrderId) {
        match self.backend.garment_lines_by_order(order_id).await {
            Ok(lines) => {
                for line in lines {
                    if let Err(err) = self.backend.delete_garment_line(line.id).await {
                        tracing::warn!(%order_id, line_id = %line.id, error = %err,
                            "failed to delete garment line during discard");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%order_id, error = %err,
                    "failed to list garment lines during discard");
            }
        }

        match self.backend.impression_lines_by_order(order_id).await {
            Ok(lines) => {
                for line in lines {
                    if let Err(err) = self.backend.delete_impression_line(line.id).await {
                        tracing::warn!(%order_id, line_id = %line.id, error = %err,
                            "failed to delete impression line during discard");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%order_id, error = %err,
                    "failed to list impression lines during discard");
            }
        }

        self.invalidate(order_id);
    }
}
