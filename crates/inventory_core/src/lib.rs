//! Shared inventory pipeline domain primitives.
//!
//! This crate owns CSV import rules, event decoding, low-stock evaluation and
//! resource naming. It intentionally excludes AWS SDK and Lambda runtime
//! concerns, which live in `inventory_lambda` and `inventory_ops`.

pub mod contract;
pub mod csv_import;
pub mod events;
pub mod low_stock;
pub mod naming;
