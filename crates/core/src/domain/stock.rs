use serde::{Deserialize, Serialize};

/// One row of the stock dataset. Read-only after load.
///
/// Field names map onto the CSV headers of the dataset file
/// (`Stock Symbol`, `Company Name`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "Stock Symbol")]
    pub symbol: String,

    #[serde(rename = "Company Name")]
    pub name: String,

    #[serde(rename = "Sector")]
    pub sector: String,

    #[serde(rename = "Price")]
    pub price: f64,

    #[serde(rename = "P/E Ratio")]
    pub pe_ratio: f64,

    #[serde(rename = "Market Cap (B)")]
    pub market_cap_b: f64,

    #[serde(rename = "Performance (%)")]
    pub performance_pct: f64,
}
