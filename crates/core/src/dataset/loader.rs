use crate::domain::stock::StockRecord;
use anyhow::Context;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Load the stock dataset from a CSV file.
///
/// Duplicate rows (same stock symbol) are dropped, keeping the first
/// occurrence. Loading the same file twice returns identical rows.
pub fn load_stock_data(path: impl AsRef<Path>) -> anyhow::Result<Vec<StockRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("stock data file not found: {}", path.display()))?;
    load_from_reader(file).with_context(|| format!("failed to read {}", path.display()))
}

pub fn load_from_reader(rdr: impl Read) -> anyhow::Result<Vec<StockRecord>> {
    let mut reader = csv::Reader::from_reader(rdr);

    let mut seen = HashSet::<String>::new();
    let mut out = Vec::new();
    for (i, row) in reader.deserialize::<StockRecord>().enumerate() {
        let record = row.with_context(|| format!("invalid stock row at data line {}", i + 1))?;
        if seen.insert(record.symbol.clone()) {
            out.push(record);
        }
    }

    Ok(out)
}
