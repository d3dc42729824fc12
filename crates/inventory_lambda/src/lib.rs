//! AWS-oriented adapters and handlers for the inventory pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers, DynamoDB,
//! S3 and SNS adapters) and exposes a single runtime module boundary for the
//! domain primitives in `inventory_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod runtime;
