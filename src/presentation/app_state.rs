// Application state for HTTP handlers
use crate::application::chart_view::ChartView;
use crate::application::overview_view::OverviewView;
use crate::application::settings_editor::SettingsEditor;

pub struct AppState {
    pub overview: OverviewView,
    pub chart: ChartView,
    pub settings: SettingsEditor,
}
