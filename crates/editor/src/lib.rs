//! `estampa-editor` — order editing core.
//!
//! Everything the order editor does between "user opened the panel" and
//! "order saved or abandoned" lives here: provisioning a draft order (and a
//! placeholder client) so line items have something to attach to, mediating
//! line-item writes through the command API, recomputing financial totals
//! after every mutation, and committing or discarding the draft at the end.

pub mod cache;
pub mod error;
pub mod lines;
pub mod provision;
pub mod session;

pub use cache::ShopCache;
pub use error::EditorError;
pub use lines::LineItemAggregator;
pub use provision::{DraftHandle, DraftProvisioner, ProvisionError};
pub use session::{DraftPhase, EditorSession, OrderForm, Tab};
