//! Domain primitives re-exported for handlers and binaries.

pub use inventory_core::{contract, csv_import, events, low_stock};
