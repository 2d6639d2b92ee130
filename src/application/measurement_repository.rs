// Repository trait for the measurement API
use crate::domain::bus::{BusId, Measurements};
use crate::domain::telemetry::TimeSeriesPoint;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected payload from {url}: {message}")]
    Payload { url: String, message: String },
}

/// A setting as the backend stores it. Values may arrive as numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSetting {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[async_trait]
pub trait MeasurementRepository: Send + Sync {
    /// Read one setting's value (`Null` when the backend has none)
    async fn get_setting(&self, key: &str) -> Result<serde_json::Value, ApiError>;

    /// Read every stored setting
    async fn list_settings(&self) -> Result<Vec<RawSetting>, ApiError>;

    /// Persist one setting
    async fn put_setting(&self, key: &str, value: &str) -> Result<(), ApiError>;

    /// Latest reading of a bus
    async fn last_measurement(&self, bus: BusId) -> Result<Measurements, ApiError>;

    /// Readings of a bus over the trailing window, oldest first
    async fn last_minutes(&self, bus: BusId, minutes: u32) -> Result<Vec<TimeSeriesPoint>, ApiError>;
}
