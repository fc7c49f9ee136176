use std::{net::SocketAddr, process::ExitCode, sync::Arc};
use ticker_sentiment::{
    analysis_service::AnalysisService,
    api::{self, AppState},
    classifier,
    config::AppConfig,
    data_structures::SharedFeedSource,
    feed::RssFeedClient,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ticker_sentiment=info,tower_http=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if config.log_json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let app_config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&app_config);

    // Set a global span with app name for all subsequent logs
    let _span = tracing::info_span!("app", name = %app_config.app_name).entered();

    tracing::info!("Starting ticker-sentiment");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        backend = ?app_config.classifier.backend,
        "Loaded configuration"
    );

    // Classifier is built once here and shared read-only by every request
    let classifier = match classifier::build_classifier(&app_config.classifier) {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize sentiment classifier");
            return ExitCode::FAILURE;
        }
    };

    let feed_client = match RssFeedClient::new(
        app_config.feed_url_template.clone(),
        app_config.feed_timeout,
        app_config.random_user_agent,
        app_config.display_timezone,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize feed client");
            return ExitCode::FAILURE;
        }
    };
    let feed: SharedFeedSource = Arc::new(feed_client);

    let port = app_config.port;
    let app_state = AppState {
        service: Arc::new(AnalysisService::new(feed, classifier)),
        config: Arc::new(app_config),
    };
    let app = api::router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "Server listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server terminated with error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
