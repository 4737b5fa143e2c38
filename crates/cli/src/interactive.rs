use std::io::{BufRead, Write};

use stocksense_core::domain::stock::StockRecord;
use stocksense_core::llm::groq::GroqClient;

/// Interactive mode: read queries from stdin until `exit`.
///
/// `stats` prints dataset statistics, `viz` writes the chart files, anything
/// else goes to the model.
pub async fn run(
    llm: &GroqClient,
    records: &[StockRecord],
    results_path: &str,
    out_dir: &str,
) -> anyhow::Result<()> {
    println!("\n=== Stock Analysis Interactive Mode ===");
    println!("Type 'exit' to quit, 'stats' for basic statistics, 'viz' for visualizations");

    let stdin = std::io::stdin();
    loop {
        print!("\nEnter your query: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // stdin closed
            break;
        }
        let query = line.trim();

        match query.to_lowercase().as_str() {
            "" => continue,
            "exit" => break,
            "stats" => crate::print_stats(records)?,
            "viz" => {
                println!("Generating visualizations...");
                stocksense_core::report::write_chart_files(out_dir, records)?;
                println!("Visualizations saved to {out_dir}");
            }
            _ => match crate::ask(llm, records, query).await {
                Ok(answer) => {
                    stocksense_core::storage::results::append_success(
                        results_path,
                        query,
                        &answer,
                    )?;
                    println!("\nQuery: {query}");
                    println!("Response: {answer}");
                }
                Err(err) => {
                    sentry_anyhow::capture_anyhow(&err);
                    stocksense_core::storage::results::append_failure(
                        results_path,
                        query,
                        &stocksense_core::llm::error::persisted_detail(&err),
                    )?;
                    println!("\nQuery: {query}");
                    println!("Response: Error: {err:#}");
                }
            },
        }
    }

    Ok(())
}
