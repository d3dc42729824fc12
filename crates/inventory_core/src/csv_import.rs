use std::collections::HashMap;

use crate::contract::{InventoryRecord, ValidationError};

/// Maximum number of put requests DynamoDB accepts in one `BatchWriteItem`.
pub const BATCH_WRITE_LIMIT: usize = 25;

const STORE_COLUMNS: [&str; 2] = ["store", "Store"];
const ITEM_COLUMNS: [&str; 2] = ["item", "Item"];
const COUNT_COLUMNS: [&str; 2] = ["count", "Count"];
const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsvImport {
    pub records: Vec<InventoryRecord>,
    pub skipped: usize,
}

/// Parses an uploaded inventory CSV.
///
/// The header row decides column positions. Both lowercase and capitalised
/// column names are accepted, rows without a store or item are skipped and
/// unparseable counts fall back to zero.
pub fn parse_inventory_csv(body: &[u8]) -> Result<CsvImport, ValidationError> {
    let decoded = String::from_utf8_lossy(body);
    let text = decoded
        .strip_prefix(BYTE_ORDER_MARK)
        .unwrap_or(decoded.as_ref());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| ValidationError::new(format!("Malformed CSV header: {error}")))?;
    let columns = ColumnIndex::from_headers(headers);

    let mut import = CsvImport::default();
    for (row_number, row) in reader.records().enumerate() {
        let row = row.map_err(|error| {
            ValidationError::new(format!("Malformed CSV row {}: {error}", row_number + 1))
        })?;

        let store = columns.lookup(&row, &STORE_COLUMNS).unwrap_or("").trim();
        let item = columns.lookup(&row, &ITEM_COLUMNS).unwrap_or("").trim();
        if store.is_empty() || item.is_empty() {
            import.skipped += 1;
            continue;
        }

        let count = parse_count(columns.lookup(&row, &COUNT_COLUMNS).unwrap_or("0"));
        import.records.push(InventoryRecord::new(store, item, count));
    }

    Ok(import)
}

pub fn parse_count(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

/// Collapses records sharing a `(store, item)` key so the last occurrence
/// wins while the position of the first occurrence is kept.
pub fn dedupe_by_key(records: Vec<InventoryRecord>) -> Vec<InventoryRecord> {
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut unique: Vec<InventoryRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = (record.store.clone(), record.item.clone());
        match positions.get(&key) {
            Some(&position) => unique[position] = record,
            None => {
                positions.insert(key, unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

pub fn write_batches(records: &[InventoryRecord]) -> std::slice::Chunks<'_, InventoryRecord> {
    records.chunks(BATCH_WRITE_LIMIT)
}

struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        // Duplicate header names resolve to the right-most column.
        let positions = headers
            .iter()
            .enumerate()
            .map(|(position, name)| (name.to_string(), position))
            .collect();
        Self { positions }
    }

    /// First non-empty value among `aliases`, in alias order.
    fn lookup<'r>(&self, row: &'r csv::StringRecord, aliases: &[&str]) -> Option<&'r str> {
        aliases.iter().find_map(|alias| {
            self.positions
                .get(*alias)
                .and_then(|&position| row.get(position))
                .filter(|value| !value.is_empty())
        })
    }
}
