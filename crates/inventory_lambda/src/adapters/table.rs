use crate::runtime::contract::{InventoryItemView, InventoryRecord};

pub trait InventoryWriter {
    /// Writes at most one DynamoDB batch; records overwrite by `(Store, Item)`.
    fn write_batch(&self, records: &[InventoryRecord]) -> Result<(), String>;
}

pub trait InventoryReader {
    fn query_store(&self, store: &str) -> Result<Vec<InventoryItemView>, String>;

    fn scan_all(&self) -> Result<Vec<InventoryItemView>, String>;
}
