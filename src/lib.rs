//! Bulk editing of Proxmox VPS product configurations.
//!
//! Administrators gather products into named groups, edit one set of
//! settings against the group's template product, preview the exact
//! per-product differences and apply them in one pass. Every applied
//! write is recorded in an append-only change log.

pub mod apply;
pub mod codec;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod export;
pub mod fields;
pub mod preview;
pub mod prom_metrics;
pub mod schema;
pub mod store;
