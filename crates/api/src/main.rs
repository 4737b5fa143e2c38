use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use stocksense_core::dataset::MarketStats;
use stocksense_core::domain::analysis::AnalysisRecord;
use stocksense_core::domain::stock::StockRecord;
use stocksense_core::llm::groq::GroqClient;
use stocksense_core::llm::{AnalysisInput, LlmClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stocksense_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    // The dashboard is useless without the dataset, so a missing or broken
    // CSV is fatal here (unlike the LLM key, which only degrades AI routes).
    let data_path = settings.data_file_path().to_string();
    let records = stocksense_core::dataset::load_stock_data(&data_path)?;
    let stats = MarketStats::compute(&records)?;
    tracing::info!(path = %data_path, rows = records.len(), "stock dataset loaded");

    let llm: Option<Arc<GroqClient>> = match GroqClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "GROQ_API_KEY missing; starting dashboard without AI analysis");
            None
        }
    };

    let state = AppState {
        records: Arc::new(records),
        stats: Arc::new(stats),
        llm,
        results_path: Arc::new(settings.results_file_path().to_string()),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(dashboard))
        .route("/api/stats", get(get_stats))
        .route("/api/stocks", get(get_stocks))
        .route("/api/results", get(get_results))
        .route("/api/analyze", post(post_analyze))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    records: Arc<Vec<StockRecord>>,
    stats: Arc<MarketStats>,
    llm: Option<Arc<GroqClient>>,
    results_path: Arc<String>,
}

async fn dashboard(State(state): State<AppState>) -> Html<String> {
    Html(stocksense_core::report::render_report(
        &state.stats,
        &state.records,
    ))
}

async fn get_stats(State(state): State<AppState>) -> Json<MarketStats> {
    Json(state.stats.as_ref().clone())
}

async fn get_stocks(State(state): State<AppState>) -> Json<Vec<StockRecord>> {
    Json(state.records.as_ref().clone())
}

async fn get_results(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisRecord>>, StatusCode> {
    let rows = stocksense_core::storage::results::load_results(state.results_path.as_str())
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    run_id: Uuid,
    query: String,
    response: String,
}

async fn post_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, StatusCode> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let Some(llm) = &state.llm else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let input = AnalysisInput::new(&query, &state.records).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match llm.answer(input).await {
        Ok(answer) => {
            let record = stocksense_core::storage::results::append_success(
                state.results_path.as_str(),
                &query,
                &answer.text,
            )
            .map_err(|e| {
                sentry_anyhow::capture_anyhow(&e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

            Ok(Json(AnalyzeResponse {
                run_id: record.run_id,
                query: record.query,
                response: record.response,
            }))
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%query, error = %err, "analysis failed");
            // Best effort: the failure still lands in the results history,
            // raw provider payload included when the error carries one.
            if let Err(e) = stocksense_core::storage::results::append_failure(
                state.results_path.as_str(),
                &query,
                &stocksense_core::llm::error::persisted_detail(&err),
            ) {
                tracing::error!(error = %e, "failed to record analysis failure");
            }
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stocksense_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
