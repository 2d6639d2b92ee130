// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::{get, post, put}, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::chart_view::ChartView;
use crate::application::interval_resolver::IntervalResolver;
use crate::application::measurement_fetcher::MeasurementFetcher;
use crate::application::overview_view::OverviewView;
use crate::application::settings_editor::SettingsEditor;
use crate::infrastructure::api_repository::ApiRepository;
use crate::infrastructure::config::load_monitor_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart, chart_options, edit_setting, health_check, overview, overview_events,
    reload_settings, save_settings, settings_page, update_selection,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_monitor_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(
        ApiRepository::new(config.api.base_url.clone(), config.api.request_timeout())?
            .with_settings_list_path(config.api.settings_list_path.clone()),
    );

    // Create services (application layer)
    let resolver = IntervalResolver::new(
        repository.clone(),
        config.polling.interval_key.clone(),
        config.polling.default_interval(),
    );
    let fetcher = MeasurementFetcher::new(repository.clone());

    let overview_view = OverviewView::new(resolver.clone(), fetcher.clone());
    let chart_view = ChartView::new(resolver, fetcher);
    let settings = SettingsEditor::new(repository);

    overview_view.start();
    chart_view.start();

    // Create application state
    let state = Arc::new(AppState {
        overview: overview_view,
        chart: chart_view,
        settings,
    });

    tokio::spawn({
        let state = state.clone();
        async move {
            if let Err(e) = state.settings.load().await {
                tracing::warn!("Initial settings load skipped: {}", e);
            }
        }
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/overview", get(overview))
        .route("/overview/events", get(overview_events))
        .route("/graph", get(chart))
        .route("/graph/options", get(chart_options))
        .route("/graph/selection", put(update_selection))
        .route("/config", get(settings_page))
        .route("/config/save", post(save_settings))
        .route("/config/reload", post(reload_settings))
        .route("/config/:key", put(edit_setting))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    let addr: SocketAddr = config.server.listen.parse()?;
    tracing::info!("Starting LabREI monitor on {} (API {})", addr, config.api.base_url);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    state.overview.stop();
    state.chart.stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c signal: {}", e);
        std::future::pending::<()>().await;
    }
}
