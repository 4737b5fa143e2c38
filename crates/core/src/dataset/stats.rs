use crate::domain::stock::StockRecord;
use anyhow::ensure;
use serde::Serialize;
use std::collections::BTreeMap;

/// Basic dataset statistics shown on the dashboard and in the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct MarketStats {
    pub total_stocks: usize,
    pub average_price: f64,
    pub highest_price_symbol: String,
    pub highest_pe_symbol: String,
    pub sectors: BTreeMap<String, usize>,
    pub avg_performance_pct: f64,
}

impl MarketStats {
    pub fn compute(records: &[StockRecord]) -> anyhow::Result<Self> {
        ensure!(!records.is_empty(), "stock dataset is empty");

        let n = records.len() as f64;
        let average_price = records.iter().map(|r| r.price).sum::<f64>() / n;
        let avg_performance_pct = records.iter().map(|r| r.performance_pct).sum::<f64>() / n;

        let highest_price_symbol = max_by_key(records, |r| r.price).symbol.clone();
        let highest_pe_symbol = max_by_key(records, |r| r.pe_ratio).symbol.clone();

        let mut sectors = BTreeMap::new();
        for r in records {
            *sectors.entry(r.sector.clone()).or_insert(0) += 1;
        }

        Ok(Self {
            total_stocks: records.len(),
            average_price,
            highest_price_symbol,
            highest_pe_symbol,
            sectors,
            avg_performance_pct,
        })
    }
}

fn max_by_key(records: &[StockRecord], key: impl Fn(&StockRecord) -> f64) -> &StockRecord {
    // Callers guarantee a non-empty slice; NaNs would simply lose the comparison.
    records
        .iter()
        .reduce(|best, r| if key(r) > key(best) { r } else { best })
        .unwrap()
}
