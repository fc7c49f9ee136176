use crate::analysis_service::{AnalysisError, AnalysisService};
use crate::config::AppConfig;
use crate::data_structures::{AnalysisOutcome, AnalysisReport};
use crate::render::{render_error, render_index, render_outcome, FormState};
use axum::{
    extract::{FromRef, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument, warn};

pub type SharedAnalysisService = Arc<AnalysisService>;
pub type SharedAppConfig = Arc<AppConfig>;

#[derive(Clone)]
pub struct AppState {
    pub service: SharedAnalysisService,
    pub config: SharedAppConfig,
}

impl FromRef<AppState> for SharedAnalysisService {
    fn from_ref(app_state: &AppState) -> SharedAnalysisService {
        app_state.service.clone()
    }
}

impl FromRef<AppState> for SharedAppConfig {
    fn from_ref(app_state: &AppState) -> SharedAppConfig {
        app_state.config.clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub ticker: Option<String>,
    pub keyword: Option<String>,
}

impl AnalyzeParams {
    fn ticker_or_default<'a>(&'a self, config: &'a AppConfig) -> &'a str {
        self.ticker.as_deref().unwrap_or(&config.default_ticker)
    }

    fn form_state(&self, config: &AppConfig) -> FormState {
        FormState {
            ticker: self.ticker_or_default(config).trim().to_uppercase(),
            keyword: self.keyword.as_deref().unwrap_or_default().trim().to_lowercase(),
        }
    }
}

fn error_status(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::InvalidTicker(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Classifier { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/analyze", get(analyze_json_handler))
        .route("/api/analyze.csv", get(analyze_csv_handler))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(index_handler))
        .route("/analyze", get(analyze_page_handler))
        .route("/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[instrument(skip(config))]
pub async fn index_handler(State(config): State<SharedAppConfig>) -> Html<String> {
    debug!("Rendering input form");
    let form = FormState {
        ticker: config.default_ticker.clone(),
        keyword: config.default_keyword.clone(),
    };
    Html(render_index(&form))
}

#[instrument(skip(service, config))]
pub async fn analyze_page_handler(
    State(service): State<SharedAnalysisService>,
    State(config): State<SharedAppConfig>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    let form = params.form_state(&config);

    match service
        .analyze(params.ticker_or_default(&config), params.keyword.as_deref())
        .await
    {
        Ok(outcome) => Html(render_outcome(&form, &outcome)).into_response(),
        Err(e) => {
            warn!(error = %e, "Analysis request failed");
            (error_status(&e), Html(render_error(&form, &e.to_string()))).into_response()
        }
    }
}

#[instrument(skip(service, config))]
pub async fn analyze_json_handler(
    State(service): State<SharedAnalysisService>,
    State(config): State<SharedAppConfig>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    match service
        .analyze(params.ticker_or_default(&config), params.keyword.as_deref())
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            warn!(error = %e, "Analysis request failed");
            (error_status(&e), Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

#[instrument(skip(service, config))]
pub async fn analyze_csv_handler(
    State(service): State<SharedAnalysisService>,
    State(config): State<SharedAppConfig>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    let outcome = match service
        .analyze(params.ticker_or_default(&config), params.keyword.as_deref())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Analysis request failed");
            return (error_status(&e), e.to_string()).into_response();
        }
    };

    let report = match outcome {
        AnalysisOutcome::Completed(report) => report,
        AnalysisOutcome::NoArticles { ticker, reason, .. } => {
            return (
                StatusCode::NOT_FOUND,
                format!("No articles found for {}. {}", ticker, reason.hint()),
            )
                .into_response();
        }
    };

    match report_to_csv(&report) {
        Ok(body) => {
            info!(ticker = %report.ticker, rows = report.articles.len(), "Exporting analysis as CSV");
            let disposition = format!("attachment; filename=\"{}_sentiment.csv\"", report.ticker);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to encode CSV export");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode CSV").into_response()
        }
    }
}

#[instrument(skip(service))]
pub async fn health_handler(State(service): State<SharedAnalysisService>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "classifier": service.classifier_name() })),
    )
}

/// Encodes the classified table with the same columns as the HTML view.
pub fn report_to_csv(report: &AnalysisReport) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Title", "Sentiment", "Confidence", "Published", "Link"])?;

    for article in &report.articles {
        let confidence = article.display_confidence().to_string();
        writer.write_record([
            article.title.as_str(),
            article.label.as_str(),
            confidence.as_str(),
            article.published.as_str(),
            article.link.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
