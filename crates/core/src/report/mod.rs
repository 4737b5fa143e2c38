mod charts;
mod page;

pub use charts::{
    performance_by_sector, price_distribution, sector_counts, sector_distribution,
    top_by_price, top_stocks_by_price, write_chart_files, DEFAULT_TOP_N,
};
pub use page::render_report;
