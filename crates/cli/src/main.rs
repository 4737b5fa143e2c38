use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stocksense_core::config::{Settings, STANDARD_QUERIES};
use stocksense_core::dataset::MarketStats;
use stocksense_core::domain::stock::StockRecord;
use stocksense_core::llm::groq::GroqClient;
use stocksense_core::llm::{AnalysisInput, LlmClient};

mod interactive;

#[derive(Debug, Parser)]
#[command(name = "stocksense", about = "Stock data analysis tool")]
struct Args {
    /// Path to the stock data CSV file (defaults to CSV_FILE_PATH).
    #[arg(long)]
    data: Option<String>,

    /// Path to the append-only results CSV (defaults to RESULTS_FILE_PATH).
    #[arg(long)]
    results: Option<String>,

    /// Groq API key (if not set in the environment).
    #[arg(long)]
    api_key: Option<String>,

    /// Custom query to run; repeatable. Standard queries run when absent.
    #[arg(long)]
    query: Vec<String>,

    /// Write the chart and report HTML files.
    #[arg(long)]
    visualize: bool,

    /// Output directory for charts.
    #[arg(long, default_value = "results/plots")]
    out_dir: String,

    /// Enter interactive mode after the batch run.
    #[arg(long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let data_path = args
        .data
        .clone()
        .unwrap_or_else(|| settings.data_file_path().to_string());
    let results_path = args
        .results
        .clone()
        .unwrap_or_else(|| settings.results_file_path().to_string());

    let records = stocksense_core::dataset::load_stock_data(&data_path)?;
    tracing::info!(path = %data_path, rows = records.len(), "stock dataset loaded");
    println!("Loaded {} stocks from {data_path}", records.len());

    // Chart-only runs do not need an API key; anything that talks to the
    // model does.
    let visualize_only = args.visualize && args.query.is_empty() && !args.interactive;
    let api_key = args.api_key.clone().or(settings.groq_api_key.clone());
    let llm = match api_key {
        Some(key) => Some(GroqClient::with_api_key(key)?),
        None if visualize_only => None,
        None => {
            anyhow::bail!("GROQ_API_KEY is required; set it in the environment or pass --api-key")
        }
    };

    if let Some(llm) = &llm {
        let queries: Vec<String> = if args.query.is_empty() {
            tracing::info!("no custom queries; running standard queries");
            STANDARD_QUERIES.iter().map(|s| s.to_string()).collect()
        } else {
            args.query.clone()
        };

        run_queries(llm, &records, &queries, &results_path).await?;
        println!("Analysis complete. Results saved to {results_path}");
    }

    if args.visualize {
        stocksense_core::report::write_chart_files(&args.out_dir, &records)?;
        println!("Visualizations saved to {}", args.out_dir);
    }

    if args.interactive {
        let llm = llm.as_ref().context("interactive mode needs an API key")?;
        interactive::run(llm, &records, &results_path, &args.out_dir).await?;
    }

    Ok(())
}

async fn run_queries(
    llm: &GroqClient,
    records: &[StockRecord],
    queries: &[String],
    results_path: &str,
) -> anyhow::Result<()> {
    for query in queries {
        tracing::info!(%query, "running query");
        let outcome = ask(llm, records, query).await;
        match outcome {
            Ok(answer) => {
                stocksense_core::storage::results::append_success(results_path, query, &answer)?;
                println!("\nQuery: {query}");
                println!("Response: {answer}");
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(%query, error = %err, "query failed");
                // Keep the raw provider payload when the failure carries one.
                stocksense_core::storage::results::append_failure(
                    results_path,
                    query,
                    &stocksense_core::llm::error::persisted_detail(&err),
                )?;
                println!("\nQuery: {query}");
                println!("Response: Error: {err:#}");
            }
        }
    }
    Ok(())
}

pub(crate) async fn ask(
    llm: &GroqClient,
    records: &[StockRecord],
    query: &str,
) -> anyhow::Result<String> {
    let input = AnalysisInput::new(query, records)?;
    let answer = llm.answer(input).await?;
    Ok(answer.text)
}

pub(crate) fn print_stats(records: &[StockRecord]) -> anyhow::Result<()> {
    let stats = MarketStats::compute(records)?;
    println!("total_stocks: {}", stats.total_stocks);
    println!("average_price: {:.2}", stats.average_price);
    println!("highest_price: {}", stats.highest_price_symbol);
    println!("highest_pe: {}", stats.highest_pe_symbol);
    println!("avg_performance: {:.2}%", stats.avg_performance_pct);
    println!("sectors:");
    for (sector, count) in &stats.sectors {
        println!("  {sector}: {count}");
    }
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
