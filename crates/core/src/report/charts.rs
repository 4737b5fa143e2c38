use crate::domain::stock::StockRecord;
use anyhow::Context;
use plotly::common::Title;
use plotly::layout::{Axis, Layout};
use plotly::{Bar, BoxPlot, Histogram, Pie, Plot};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_TOP_N: usize = 10;
const PRICE_HISTOGRAM_BINS: usize = 20;

pub fn sector_counts(records: &[StockRecord]) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for r in records {
        *out.entry(r.sector.clone()).or_insert(0) += 1;
    }
    out
}

/// Top `n` records by price, highest first. Ties keep dataset order.
pub fn top_by_price(records: &[StockRecord], n: usize) -> Vec<&StockRecord> {
    let mut sorted: Vec<&StockRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

/// Pie chart of stock counts per sector.
pub fn sector_distribution(records: &[StockRecord]) -> Plot {
    let counts = sector_counts(records);
    let labels: Vec<String> = counts.keys().cloned().collect();
    let values: Vec<usize> = counts.values().copied().collect();

    let mut plot = Plot::new();
    plot.add_trace(Pie::new(values).labels(labels));
    plot.set_layout(Layout::new().title(Title::with_text("Stock Distribution by Sector")));
    plot
}

/// Histogram of stock prices.
pub fn price_distribution(records: &[StockRecord]) -> Plot {
    let prices: Vec<f64> = records.iter().map(|r| r.price).collect();

    let mut plot = Plot::new();
    plot.add_trace(Histogram::new(prices).n_bins_x(PRICE_HISTOGRAM_BINS));
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Distribution of Stock Prices"))
            .x_axis(Axis::new().title(Title::with_text("Price ($)")))
            .y_axis(Axis::new().title(Title::with_text("Count"))),
    );
    plot
}

/// Box plot of performance per sector, one trace per sector.
pub fn performance_by_sector(records: &[StockRecord]) -> Plot {
    let mut by_sector: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        by_sector.entry(&r.sector).or_default().push(r.performance_pct);
    }

    let mut plot = Plot::new();
    for (sector, values) in by_sector {
        plot.add_trace(BoxPlot::new(values).name(sector));
    }
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Stock Performance by Sector"))
            .y_axis(Axis::new().title(Title::with_text("Performance (%)"))),
    );
    plot
}

/// Bar chart of the top `n` stocks by price.
pub fn top_stocks_by_price(records: &[StockRecord], n: usize) -> Plot {
    let top = top_by_price(records, n);
    let symbols: Vec<String> = top.iter().map(|r| r.symbol.clone()).collect();
    let prices: Vec<f64> = top.iter().map(|r| r.price).collect();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(symbols, prices));
    plot.set_layout(
        Layout::new()
            .title(Title::with_text(format!("Top {n} Stocks by Price")))
            .y_axis(Axis::new().title(Title::with_text("Price ($)"))),
    );
    plot
}

/// Write the four standalone chart pages plus the combined report into
/// `out_dir`, creating it if needed.
pub fn write_chart_files(
    out_dir: impl AsRef<Path>,
    records: &[StockRecord],
) -> anyhow::Result<()> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let charts = [
        ("sector_distribution.html", sector_distribution(records)),
        ("price_distribution.html", price_distribution(records)),
        ("performance_by_sector.html", performance_by_sector(records)),
        (
            "top_stocks_by_price.html",
            top_stocks_by_price(records, DEFAULT_TOP_N),
        ),
    ];

    for (file_name, plot) in charts {
        let path = out_dir.join(file_name);
        plot.write_html(&path);
        tracing::info!(path = %path.display(), "chart written");
    }

    let stats = crate::dataset::MarketStats::compute(records)?;
    let report_path = out_dir.join("report.html");
    std::fs::write(&report_path, crate::report::render_report(&stats, records))
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    tracing::info!(path = %report_path.display(), "report written");

    Ok(())
}
