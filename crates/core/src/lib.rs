pub mod dataset;
pub mod domain;
pub mod llm;
pub mod report;
pub mod storage;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_DATA_FILE: &str = "data/stocks.csv";
    pub const DEFAULT_RESULTS_FILE: &str = "results/analysis_results.csv";
    pub const DEFAULT_TEMPERATURE: f64 = 0.5;

    /// Predefined questions used when the caller does not supply any.
    pub const STANDARD_QUERIES: &[&str] = &[
        "What is the stock price of AAPL?",
        "What is the performance of TSLA?",
        "What is the PE ratio of MSFT?",
        "Which stock has the highest price?",
        "What is the average stock price?",
        "Which sector has the most stocks?",
        "What is the market cap of AMZN?",
        "Which technology stock has the lowest P/E ratio?",
    ];

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub groq_api_key: Option<String>,
        pub csv_file_path: Option<String>,
        pub results_file_path: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                groq_api_key: std::env::var("GROQ_API_KEY").ok(),
                csv_file_path: std::env::var("CSV_FILE_PATH").ok(),
                results_file_path: std::env::var("RESULTS_FILE_PATH").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_groq_api_key(&self) -> anyhow::Result<&str> {
            self.groq_api_key
                .as_deref()
                .context("GROQ_API_KEY is required")
        }

        pub fn data_file_path(&self) -> &str {
            self.csv_file_path.as_deref().unwrap_or(DEFAULT_DATA_FILE)
        }

        pub fn results_file_path(&self) -> &str {
            self.results_file_path
                .as_deref()
                .unwrap_or(DEFAULT_RESULTS_FILE)
        }
    }
}
