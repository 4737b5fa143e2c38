use crate::dataset::MarketStats;
use crate::domain::stock::StockRecord;
use crate::report::charts;
use chrono::Utc;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const PAGE_CSS: &str = "
    body { font-family: Arial, sans-serif; margin: 0; background: #f7f9fc; }
    .banner {
        padding: 20px 30px;
        background: linear-gradient(135deg, #4a90e2, #145da0);
        color: white;
    }
    .banner h1 { margin: 0; font-size: 28px; }
    .banner p { margin: 4px 0 0; opacity: 0.85; }
    .metrics { display: flex; gap: 16px; padding: 20px 30px; flex-wrap: wrap; }
    .metric {
        background: white; border-radius: 8px; padding: 14px 20px;
        box-shadow: 0 1px 3px rgba(0,0,0,0.1); min-width: 160px;
    }
    .metric .label { color: #666; font-size: 13px; }
    .metric .value { font-size: 22px; font-weight: bold; color: #145da0; }
    .chart { background: white; border-radius: 8px; margin: 0 30px 20px;
             padding: 10px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
";

/// Render the full market report page: key metrics plus the four charts,
/// with plotly embedded inline so the page is self-contained apart from the
/// plotly.js CDN script.
pub fn render_report(stats: &MarketStats, records: &[StockRecord]) -> String {
    let generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let chart_divs = [
        charts::sector_distribution(records).to_inline_html(Some("sector-distribution")),
        charts::price_distribution(records).to_inline_html(Some("price-distribution")),
        charts::performance_by_sector(records).to_inline_html(Some("performance-by-sector")),
        charts::top_stocks_by_price(records, charts::DEFAULT_TOP_N)
            .to_inline_html(Some("top-stocks-by-price")),
    ];

    let page: Markup = html! {
        (DOCTYPE)
        html {
            head {
                title { "StockSense Analyzer" }
                script src="https://cdn.plot.ly/plotly-2.27.0.min.js" {}
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                div class="banner" {
                    h1 { "StockSense Analyzer" }
                    p { "Market overview generated on " (generated) }
                }
                div class="metrics" {
                    (metric("Total Stocks", stats.total_stocks.to_string()))
                    (metric("Average Price", format!("${:.2}", stats.average_price)))
                    (metric("Highest Price", stats.highest_price_symbol.clone()))
                    (metric("Avg Performance", format!("{:.2}%", stats.avg_performance_pct)))
                }
                @for div in &chart_divs {
                    div class="chart" { (PreEscaped(div)) }
                }
            }
        }
    };

    page.into_string()
}

fn metric(label: &str, value: String) -> Markup {
    html! {
        div class="metric" {
            div class="label" { (label) }
            div class="value" { (value) }
        }
    }
}
