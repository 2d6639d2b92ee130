// Chart view - time series of the selected bus over the selected window
use crate::application::interval_resolver::IntervalResolver;
use crate::application::measurement_fetcher::MeasurementFetcher;
use crate::application::polling::{FetchFn, PollStatus, PollingController};
use crate::domain::selection::{Selection, SelectionError};
use crate::domain::telemetry::{CHART_GROUPS, ChartPoint, format_window};
use futures::FutureExt;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub field: &'static str,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartGroupView {
    pub key: &'static str,
    pub label: &'static str,
    pub series: Vec<SeriesView>,
}

/// Everything the chart page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPage {
    pub bus: u32,
    pub minutes: u32,
    pub window_label: String,
    pub times: Vec<String>,
    pub charts: Vec<ChartGroupView>,
}

impl ChartPage {
    pub fn build(selection: Selection, points: &[ChartPoint]) -> Self {
        let charts = CHART_GROUPS
            .iter()
            .map(|group| ChartGroupView {
                key: group.key,
                label: group.label,
                series: group
                    .fields
                    .iter()
                    .zip(group.colors.iter())
                    .map(|(field, color)| SeriesView {
                        field: *field,
                        color: *color,
                        values: points
                            .iter()
                            .map(|p| p.point.measurements.field(field))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            bus: selection.bus.get(),
            minutes: selection.minutes,
            window_label: format_window(selection.minutes),
            times: points.iter().map(|p| p.time.clone()).collect(),
            charts,
        }
    }
}

pub struct ChartView {
    controller: PollingController<Vec<ChartPoint>>,
    fetcher: MeasurementFetcher,
    selection: Mutex<Selection>,
}

impl ChartView {
    pub fn new(resolver: IntervalResolver, fetcher: MeasurementFetcher) -> Self {
        Self {
            controller: PollingController::new("chart", resolver, Vec::new()),
            fetcher,
            selection: Mutex::new(Selection::default()),
        }
    }

    fn selection_guard(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn selection(&self) -> Selection {
        *self.selection_guard()
    }

    /// (Re)start polling for the current selection
    pub fn start(&self) {
        let selection = self.selection_guard();
        self.restart(*selection);
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    /// Switch bus and window. Data of the old selection is cleared right away
    /// and never shown against the new one.
    pub fn select(&self, bus: u32, minutes: u32) -> Result<Selection, SelectionError> {
        let next = Selection::new(bus, minutes)?;
        Ok(self.apply(|_| next))
    }

    pub fn step_bus(&self, delta: i32) -> Selection {
        self.apply(|current| current.step_bus(delta))
    }

    pub fn step_window(&self, delta: i32) -> Selection {
        self.apply(|current| current.step_window(delta))
    }

    fn apply(&self, change: impl FnOnce(Selection) -> Selection) -> Selection {
        let mut selection = self.selection_guard();
        let next = change(*selection);
        if next != *selection {
            *selection = next;
            tracing::info!("Chart selection changed to {} / {}", next.bus, format_window(next.minutes));
            self.restart(next);
        }
        next
    }

    fn restart(&self, selection: Selection) {
        let fetcher = self.fetcher.clone();
        let fetch: FetchFn<Vec<ChartPoint>> = Arc::new(move || {
            let fetcher = fetcher.clone();
            async move {
                fetcher
                    .series(selection.bus, selection.minutes)
                    .await
                    .into_iter()
                    .map(|point| ChartPoint::new(point, selection.minutes))
                    .collect()
            }
            .boxed()
        });
        self.controller.restart_with(fetch, Some(Vec::new()));
    }

    #[cfg(test)]
    pub fn points(&self) -> Vec<ChartPoint> {
        self.controller.current()
    }

    /// Selection and data are read under the selection lock so they match
    pub fn page(&self) -> ChartPage {
        let selection = self.selection_guard();
        ChartPage::build(*selection, &self.controller.current())
    }

    pub fn status(&self) -> PollStatus {
        self.controller.status()
    }
}
