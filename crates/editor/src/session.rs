//! Lifecycle coordination for one order-editor session.
//!
//! The session binds UI intent (open, tab switch, save, cancel, teardown) to
//! the provisioner and the aggregator, and re-runs the pricing pass after
//! every line mutation. At most one draft exists per session; all backend
//! calls are awaited sequentially and a busy flag guards the begin/discard
//! pair against overlap.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use estampa_api::ShopBackend;
use estampa_core::{ClientId, DomainError, GarmentLineId, ImpressionLineId, OrderId};
use estampa_orders::{
    compute_totals, totals_from_subtotal, CreateOrder, GarmentLineDraft, ImpressionLineDraft,
    Order, OrderStatus, Totals, UpdateOrder, DEFAULT_IVA,
};

use crate::cache::ShopCache;
use crate::error::EditorError;
use crate::lines::LineItemAggregator;
use crate::provision::{DraftHandle, DraftProvisioner};

/// Where the session is in the draft lifecycle.
///
/// `Committed` and `Discarded` are terminal for the current handle; a
/// subsequent `open` starts a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    NoDraft,
    Provisioning,
    Draft,
    Committing,
    Committed,
    Discarding,
    Discarded,
}

/// Editor tab currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Details,
    Garments,
    Impressions,
}

/// The details form being edited. The chosen client is tracked separately
/// because selecting one is an explicit act the save gate checks for.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderForm {
    pub name: String,
    pub due_date: NaiveDate,
    pub iva: f64,
    pub discount: f64,
    pub status: OrderStatus,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            due_date: Utc::now().date_naive(),
            iva: DEFAULT_IVA,
            discount: 0.0,
            status: OrderStatus::Received,
        }
    }
}

const ZERO_TOTALS: Totals = Totals {
    subtotal: 0.0,
    tax: 0.0,
    total: 0.0,
};

pub struct EditorSession<B: ShopBackend> {
    backend: Arc<B>,
    provisioner: DraftProvisioner<B>,
    lines: LineItemAggregator<B>,
    phase: DraftPhase,
    handle: Option<DraftHandle>,
    /// Whether the current handle was provisioned by this session (and is
    /// therefore ours to discard). Editing an existing order sets a handle
    /// without owning it.
    provisioned: bool,
    busy: bool,
    cancel_requested: bool,
    active_tab: Tab,
    form: OrderForm,
    chosen_client: Option<ClientId>,
    /// Provisioning failed; order creation happens at save time and line
    /// drafts queue locally until then.
    deferred: bool,
    pending_garments: Vec<GarmentLineDraft>,
    pending_impressions: Vec<ImpressionLineDraft>,
    totals: Totals,
}

impl<B: ShopBackend> EditorSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            provisioner: DraftProvisioner::new(Arc::clone(&backend)),
            lines: LineItemAggregator::new(Arc::clone(&backend)),
            backend,
            phase: DraftPhase::NoDraft,
            handle: None,
            provisioned: false,
            busy: false,
            cancel_requested: false,
            active_tab: Tab::Details,
            form: OrderForm::default(),
            chosen_client: None,
            deferred: false,
            pending_garments: Vec::new(),
            pending_impressions: Vec::new(),
            totals: ZERO_TOTALS,
        }
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn handle(&self) -> Option<DraftHandle> {
        self.handle
    }

    pub fn draft_order_id(&self) -> Option<OrderId> {
        self.handle.map(|h| h.order_id)
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    pub fn form(&self) -> &OrderForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut OrderForm {
        &mut self.form
    }

    pub fn choose_client(&mut self, id: ClientId) {
        self.chosen_client = Some(id);
    }

    pub fn chosen_client(&self) -> Option<ClientId> {
        self.chosen_client
    }

    pub fn pending_garments(&self) -> &[GarmentLineDraft] {
        &self.pending_garments
    }

    pub fn pending_impressions(&self) -> &[ImpressionLineDraft] {
        &self.pending_impressions
    }

    /// Open the editor for a new order.
    ///
    /// Provisions a draft so line items have an order id to attach to. A
    /// second call while already provisioning or holding a draft is ignored
    /// (at most one draft per session). If provisioning fails the editor
    /// still opens, in deferred mode: order creation moves entirely to the
    /// final save.
    pub async fn open(&mut self, cache: &mut ShopCache) {
        if self.busy || matches!(self.phase, DraftPhase::Provisioning | DraftPhase::Draft) {
            tracing::debug!("open ignored: a draft session is already active");
            return;
        }

        self.reset_form_state();
        self.busy = true;
        self.phase = DraftPhase::Provisioning;

        match self.provisioner.begin_draft().await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.provisioned = true;
                self.phase = DraftPhase::Draft;
                self.deferred = false;
            }
            Err(err) => {
                tracing::warn!(error = %err,
                    "draft provisioning failed; deferring order creation to save");
                self.handle = None;
                self.provisioned = false;
                self.phase = DraftPhase::NoDraft;
                self.deferred = true;
            }
        }

        self.busy = false;

        // A cancel that arrived while provisioning was in flight is acted on
        // now, never before the handle resolved.
        if self.cancel_requested {
            self.cancel_requested = false;
            self.cancel(cache).await;
        }
    }

    /// Open the editor on an existing order. No provisioning happens and the
    /// order is not ours to delete on cancel.
    pub fn open_existing(&mut self, order: &Order) {
        if self.busy || matches!(self.phase, DraftPhase::Provisioning | DraftPhase::Draft) {
            tracing::debug!("open ignored: a draft session is already active");
            return;
        }

        self.reset_form_state();
        self.handle = Some(DraftHandle {
            order_id: order.id,
            client_id: order.client_id,
            client_is_placeholder: false,
        });
        self.provisioned = false;
        self.phase = DraftPhase::Draft;
        self.form = OrderForm {
            name: order.name.clone(),
            due_date: order.due_date,
            iva: order.iva,
            discount: order.discount,
            status: order.status,
        };
        self.chosen_client = Some(order.client_id);
        // Cached figures until the first recompute.
        self.totals = Totals {
            subtotal: order.subtotal,
            tax: order.subtotal * order.iva / 100.0,
            total: order.total,
        };
    }

    /// Queue a cancel to run as soon as the in-flight provisioning resolves.
    /// An in-flight `begin_draft` cannot be aborted mid-flight.
    pub fn request_cancel(&mut self) {
        if matches!(self.phase, DraftPhase::NoDraft | DraftPhase::Provisioning) {
            self.cancel_requested = true;
        }
    }

    /// Switch tabs. Entering the garments/impressions tab with an empty
    /// local list triggers a reload, tolerating a tab opened before the
    /// first round trip completed.
    pub async fn select_tab(&mut self, tab: Tab) -> Result<(), EditorError> {
        self.active_tab = tab;

        if self.phase != DraftPhase::Draft {
            return Ok(());
        }
        let Some(handle) = self.handle else {
            return Ok(());
        };

        match tab {
            Tab::Garments => {
                let empty = self
                    .lines
                    .cached_garment_lines(handle.order_id)
                    .is_none_or(|l| l.is_empty());
                if empty {
                    self.lines.reload_garment_lines(handle.order_id).await?;
                }
            }
            Tab::Impressions => {
                let empty = self
                    .lines
                    .cached_impression_lines(handle.order_id)
                    .is_none_or(|l| l.is_empty());
                if empty {
                    self.lines.reload_impression_lines(handle.order_id).await?;
                }
            }
            Tab::Details => {}
        }
        Ok(())
    }

    /// Attach a garment line and re-price the order.
    pub async fn add_garment_line(&mut self, draft: GarmentLineDraft) -> Result<(), EditorError> {
        draft.validate()?;

        if self.phase == DraftPhase::Draft {
            let handle = self.require_handle()?;
            self.lines.add_garment_line(handle.order_id, draft).await?;
            self.refresh_totals().await?;
            return Ok(());
        }

        if self.deferred {
            self.pending_garments.push(draft);
            self.totals = self.local_totals();
            return Ok(());
        }

        Err(DomainError::invariant("no active draft to attach lines to").into())
    }

    /// Detach a garment line and re-price the order. Idempotent for ids the
    /// backend no longer knows.
    pub async fn remove_garment_line(&mut self, line_id: GarmentLineId) -> Result<(), EditorError> {
        let handle = self.require_handle()?;
        self.lines.remove_garment_line(handle.order_id, line_id).await?;
        self.refresh_totals().await?;
        Ok(())
    }

    /// Drop a queued garment draft (deferred mode has no line ids yet).
    pub fn remove_pending_garment(&mut self, index: usize) {
        if index < self.pending_garments.len() {
            self.pending_garments.remove(index);
            self.totals = self.local_totals();
        }
    }

    /// Attach an impression line and re-price the order.
    pub async fn add_impression_line(
        &mut self,
        draft: ImpressionLineDraft,
    ) -> Result<(), EditorError> {
        draft.validate()?;

        if self.phase == DraftPhase::Draft {
            let handle = self.require_handle()?;
            self.lines.add_impression_line(handle.order_id, draft).await?;
            self.refresh_totals().await?;
            return Ok(());
        }

        if self.deferred {
            self.pending_impressions.push(draft);
            self.totals = self.local_totals();
            return Ok(());
        }

        Err(DomainError::invariant("no active draft to attach lines to").into())
    }

    pub async fn remove_impression_line(
        &mut self,
        line_id: ImpressionLineId,
    ) -> Result<(), EditorError> {
        let handle = self.require_handle()?;
        self.lines
            .remove_impression_line(handle.order_id, line_id)
            .await?;
        self.refresh_totals().await?;
        Ok(())
    }

    pub fn remove_pending_impression(&mut self, index: usize) {
        if index < self.pending_impressions.len() {
            self.pending_impressions.remove(index);
            self.totals = self.local_totals();
        }
    }

    /// Recompute totals from the current line items and write the new
    /// figures through the command API. The order's stored subtotal/total
    /// are only ever the cache of the last run of this.
    pub async fn refresh_totals(&mut self) -> Result<Totals, EditorError> {
        let totals = if self.phase == DraftPhase::Draft {
            let handle = self.require_handle()?;
            let garments = self.lines.garment_lines(handle.order_id).await?;
            let impressions = self.lines.impression_lines(handle.order_id).await?;
            let totals =
                compute_totals(&garments, &impressions, self.form.iva, self.form.discount);
            self.backend
                .update_order(
                    handle.order_id,
                    UpdateOrder::totals(totals.subtotal, totals.total),
                )
                .await?;
            totals
        } else if self.deferred {
            self.local_totals()
        } else {
            ZERO_TOTALS
        };

        self.totals = totals;
        Ok(totals)
    }

    /// Save the order.
    ///
    /// Gate: an explicitly chosen client and a non-empty name. With a live
    /// draft this commits it (final fields, chosen client, recomputed
    /// totals, placeholder flag cleared). In deferred mode the order is
    /// created directly and the queued line drafts are flushed onto it.
    pub async fn save(&mut self, cache: &mut ShopCache) -> Result<Order, EditorError> {
        if self.form.name.trim().is_empty() {
            return Err(DomainError::validation("order name is required").into());
        }
        let Some(client_id) = self.chosen_client else {
            return Err(DomainError::validation("a client must be selected").into());
        };

        match self.phase {
            DraftPhase::Draft => self.commit_current_draft(client_id, cache).await,
            DraftPhase::NoDraft if self.deferred => {
                self.save_deferred(client_id, cache).await
            }
            _ => Err(DomainError::invariant("nothing to save in this state").into()),
        }
    }

    async fn commit_current_draft(
        &mut self,
        client_id: ClientId,
        cache: &mut ShopCache,
    ) -> Result<Order, EditorError> {
        let handle = self.require_handle()?;

        // Line drafts left over from an interrupted deferred save land on
        // the order before it is finalized.
        self.flush_pending(handle.order_id).await?;

        self.busy = true;
        self.phase = DraftPhase::Committing;

        let result = async {
            let garments = self.lines.garment_lines(handle.order_id).await?;
            let impressions = self.lines.impression_lines(handle.order_id).await?;
            let totals =
                compute_totals(&garments, &impressions, self.form.iva, self.form.discount);

            let fields = UpdateOrder {
                name: Some(self.form.name.clone()),
                due_date: Some(self.form.due_date),
                iva: Some(self.form.iva),
                discount: Some(self.form.discount),
                status: Some(self.form.status),
                subtotal: Some(totals.subtotal),
                total: Some(totals.total),
                ..UpdateOrder::default()
            };

            let order = self
                .provisioner
                .commit_draft(&handle, fields, client_id)
                .await?;
            Ok::<(Order, Totals), EditorError>((order, totals))
        }
        .await;

        self.busy = false;

        match result {
            Ok((order, totals)) => {
                self.totals = totals;
                self.phase = DraftPhase::Committed;
                self.reload_orders_best_effort(cache).await;
                Ok(order)
            }
            Err(err) => {
                // The draft is still intact; the user repeats the action.
                self.phase = DraftPhase::Draft;
                Err(err)
            }
        }
    }

    async fn save_deferred(
        &mut self,
        client_id: ClientId,
        cache: &mut ShopCache,
    ) -> Result<Order, EditorError> {
        let create = CreateOrder {
            name: self.form.name.clone(),
            client_id,
            due_date: self.form.due_date,
            iva: self.form.iva,
            discount: self.form.discount,
            status: self.form.status,
            is_placeholder: false,
        };
        create.validate()?;

        self.busy = true;
        self.phase = DraftPhase::Committing;
        let created = self.backend.create_order(create).await;
        self.busy = false;

        let order = match created {
            Ok(order) => order,
            Err(err) => {
                self.phase = DraftPhase::NoDraft;
                return Err(err.into());
            }
        };

        // From here on there is a real order; if a flush step fails the
        // session drops back to a live draft so the user can retry.
        self.handle = Some(DraftHandle {
            order_id: order.id,
            client_id,
            client_is_placeholder: false,
        });
        self.provisioned = false;
        self.deferred = false;
        self.phase = DraftPhase::Draft;

        self.flush_pending(order.id).await?;

        let totals = self.refresh_totals().await?;
        let order = self
            .backend
            .update_order(order.id, UpdateOrder::totals(totals.subtotal, totals.total))
            .await?;

        self.phase = DraftPhase::Committed;
        self.reload_orders_best_effort(cache).await;
        Ok(order)
    }

    /// Abandon the session. A provisioned draft is deleted (lines, order,
    /// placeholder client); an existing order being edited is left alone.
    pub async fn cancel(&mut self, cache: &mut ShopCache) {
        match self.phase {
            DraftPhase::Provisioning => {
                self.cancel_requested = true;
            }
            DraftPhase::Draft if self.provisioned => {
                self.busy = true;
                self.phase = DraftPhase::Discarding;
                if let Some(handle) = self.handle {
                    self.lines.discard_lines_for(handle.order_id).await;
                }
                self.provisioner.discard_draft(&mut self.handle).await;
                self.provisioned = false;
                self.phase = DraftPhase::Discarded;
                self.busy = false;
                self.reload_orders_best_effort(cache).await;
            }
            DraftPhase::Draft => {
                self.handle = None;
                self.phase = DraftPhase::NoDraft;
            }
            DraftPhase::NoDraft if self.deferred => {
                self.pending_garments.clear();
                self.pending_impressions.clear();
                self.deferred = false;
                self.totals = ZERO_TOTALS;
            }
            _ => {}
        }
    }

    /// Component teardown: same cleanup as [`cancel`](Self::cancel),
    /// best-effort. If the process dies before the deletes land the store
    /// keeps an orphaned draft; that risk is accepted and logged.
    pub async fn teardown(&mut self, cache: &mut ShopCache) {
        self.cancel(cache).await;
        self.pending_garments.clear();
        self.pending_impressions.clear();
        self.deferred = false;
    }

    /// Delete the placeholder client after a commit that chose a different
    /// client. Commit itself never does this; the cleanup is a separate,
    /// explicit call.
    pub async fn discard_placeholder_client(&mut self) {
        if self.phase != DraftPhase::Committed {
            return;
        }
        let Some(handle) = self.handle else {
            return;
        };
        if Some(handle.client_id) == self.chosen_client {
            return;
        }
        self.provisioner.discard_placeholder_client(&handle).await;
    }

    /// Persist queued line drafts one by one; a draft stays queued until its
    /// create succeeds, so a failed flush can simply be retried.
    async fn flush_pending(&mut self, order_id: OrderId) -> Result<(), EditorError> {
        while let Some(draft) = self.pending_garments.first().cloned() {
            self.lines.add_garment_line(order_id, draft).await?;
            self.pending_garments.remove(0);
        }
        while let Some(draft) = self.pending_impressions.first().cloned() {
            self.lines.add_impression_line(order_id, draft).await?;
            self.pending_impressions.remove(0);
        }
        Ok(())
    }

    fn require_handle(&self) -> Result<DraftHandle, EditorError> {
        self.handle
            .ok_or_else(|| DomainError::invariant("no active draft").into())
    }

    fn local_totals(&self) -> Totals {
        let garment_value: f64 = self
            .pending_garments
            .iter()
            .map(GarmentLineDraft::line_value)
            .sum();
        let impression_value: f64 = self.pending_impressions.iter().map(|d| d.price).sum();
        totals_from_subtotal(
            garment_value + impression_value,
            self.form.iva,
            self.form.discount,
        )
    }

    fn reset_form_state(&mut self) {
        self.form = OrderForm::default();
        self.chosen_client = None;
        self.pending_garments.clear();
        self.pending_impressions.clear();
        self.deferred = false;
        self.active_tab = Tab::Details;
        self.handle = None;
        self.provisioned = false;
        self.totals = ZERO_TOTALS;
    }

    async fn reload_orders_best_effort(&self, cache: &mut ShopCache) {
        if let Err(err) = cache.reload_orders(self.backend.as_ref()).await {
            tracing::warn!(error = %err, "order list refresh failed after lifecycle step");
        }
    }
}

impl<B: ShopBackend> Drop for EditorSession<B> {
    fn drop(&mut self) {
        if self.provisioned && self.phase == DraftPhase::Draft {
            if let Some(handle) = self.handle {
                tracing::warn!(order_id = %handle.order_id,
                    "editor dropped with a live draft; the draft may be orphaned in the store");
            }
        }
    }
}
