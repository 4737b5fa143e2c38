mod loader;
mod stats;

pub use loader::{load_from_reader, load_stock_data};
pub use stats::MarketStats;
