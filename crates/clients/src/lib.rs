//! `estampa-clients` — client (customer) records and DTOs.

pub mod client;

pub use client::{Client, CreateClient, UpdateClient, PLACEHOLDER_CATEGORY};
