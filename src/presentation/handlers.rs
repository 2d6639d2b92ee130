// HTTP request handlers
use crate::application::chart_view::ChartPage;
use crate::application::overview_view::BusCard;
use crate::application::polling::PollStatus;
use crate::application::settings_editor::{EditorError, EditorSnapshot};
use crate::domain::bus::BusId;
use crate::domain::selection::Selection;
use crate::domain::settings::SaveReport;
use crate::domain::telemetry::{WINDOW_OPTIONS, format_window};
use crate::infrastructure::event_stream::sse_from_watch;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type HandlerError = (StatusCode, String);

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub interval_seconds: f64,
    pub status: PollStatus,
    pub buses: Vec<BusCard>,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub interval_seconds: f64,
    pub status: PollStatus,
    #[serde(flatten)]
    pub page: ChartPage,
}

#[derive(Debug, Serialize)]
pub struct WindowOption {
    pub minutes: u32,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct ChartOptions {
    pub buses: Vec<u32>,
    pub windows: Vec<WindowOption>,
}

/// Absolute values win over steps; steps mirror the carousel arrows
#[derive(Debug, Default, Deserialize)]
pub struct SelectionRequest {
    pub bus: Option<u32>,
    pub minutes: Option<u32>,
    pub bus_step: Option<i32>,
    pub window_step: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub report: SaveReport,
    pub settings: EditorSnapshot,
}

fn seconds(status: &PollStatus) -> f64 {
    status.interval_ms as f64 / 1000.0
}

fn editor_error(e: EditorError) -> HandlerError {
    let status = match e {
        EditorError::Busy => StatusCode::CONFLICT,
        EditorError::UnknownKey(_) => StatusCode::NOT_FOUND,
    };
    (status, e.to_string())
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest values of every bus
pub async fn overview(State(state): State<Arc<AppState>>) -> Json<OverviewResponse> {
    let status = state.overview.status();
    Json(OverviewResponse {
        interval_seconds: seconds(&status),
        status,
        buses: state.overview.cards(),
    })
}

/// Live overview updates, one event per change of the displayed cards
pub async fn overview_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse_from_watch(state.overview.subscribe(), |snapshots| {
        snapshots.iter().map(BusCard::from_snapshot).collect::<Vec<_>>()
    })
}

/// Chart data for the current selection
pub async fn chart(State(state): State<Arc<AppState>>) -> Json<ChartResponse> {
    let status = state.chart.status();
    Json(ChartResponse {
        interval_seconds: seconds(&status),
        status,
        page: state.chart.page(),
    })
}

pub async fn chart_options() -> Json<ChartOptions> {
    Json(ChartOptions {
        buses: BusId::all().into_iter().map(BusId::get).collect(),
        windows: WINDOW_OPTIONS
            .iter()
            .map(|&minutes| WindowOption {
                minutes,
                label: format_window(minutes),
            })
            .collect(),
    })
}

/// Change the chart selection; polling restarts for the new one
pub async fn update_selection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<Selection>, HandlerError> {
    let chart = &state.chart;
    let mut selection = chart.selection();

    if request.bus.is_some() || request.minutes.is_some() {
        selection = chart
            .select(
                request.bus.unwrap_or(selection.bus.get()),
                request.minutes.unwrap_or(selection.minutes),
            )
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    }
    if let Some(delta) = request.bus_step {
        selection = chart.step_bus(delta);
    }
    if let Some(delta) = request.window_step {
        selection = chart.step_window(delta);
    }

    Ok(Json(selection))
}

pub async fn settings_page(State(state): State<Arc<AppState>>) -> Json<EditorSnapshot> {
    Json(state.settings.snapshot())
}

/// Edit one value locally; nothing is persisted until save
pub async fn edit_setting(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditorSnapshot>, HandlerError> {
    state.settings.edit_raw(&key, request.value).map_err(editor_error)?;
    Ok(Json(state.settings.snapshot()))
}

pub async fn save_settings(State(state): State<Arc<AppState>>) -> Result<Json<SaveResponse>, HandlerError> {
    let report = state.settings.save().await.map_err(editor_error)?;
    Ok(Json(SaveResponse {
        report,
        settings: state.settings.snapshot(),
    }))
}

pub async fn reload_settings(State(state): State<Arc<AppState>>) -> Result<Json<EditorSnapshot>, HandlerError> {
    state.settings.load().await.map_err(editor_error)?;
    Ok(Json(state.settings.snapshot()))
}
