// Application layer - Polling, fetching and editing use cases
pub mod chart_view;
pub mod interval_resolver;
pub mod measurement_fetcher;
pub mod measurement_repository;
pub mod overview_view;
pub mod polling;
pub mod settings_editor;

#[cfg(test)]
pub mod fake_repository;
