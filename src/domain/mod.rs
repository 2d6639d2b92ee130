// Domain layer - Bus telemetry and settings models
pub mod bus;
pub mod selection;
pub mod settings;
pub mod telemetry;
