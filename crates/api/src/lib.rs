//! `estampa-api` — the command API the shop frontend consumes.
//!
//! The editor never touches storage directly; every read and write goes
//! through [`ShopBackend`]. Errors crossing this boundary are opaque
//! [`ApiError`] values; all domain validation happens before a call is made.

pub mod error;
pub mod memory;
pub mod port;

pub use error::{ApiError, ApiResult};
pub use memory::InMemoryBackend;
pub use port::ShopBackend;
