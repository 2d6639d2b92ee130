// LabREI measurement API repository implementation
use crate::application::measurement_repository::{ApiError, MeasurementRepository, RawSetting};
use crate::domain::bus::{BusId, Measurements};
use crate::domain::telemetry::TimeSeriesPoint;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiRepository {
    base_url: String,
    settings_list_path: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SettingResponse {
    #[serde(default)]
    value: serde_json::Value,
}

impl ApiRepository {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            settings_list_path: "/settings".to_string(),
            client,
        })
    }

    /// Some backend versions list settings under another path (e.g. `/settings/all`)
    pub fn with_settings_list_path(mut self, path: impl Into<String>) -> Self {
        self.settings_list_path = path.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn setting_url(&self, key: &str) -> String {
        self.url(&format!("/settings/{}", urlencoding::encode(key)))
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.send(self.client.get(url), url).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout { url: url.to_string() }
            } else {
                ApiError::Payload {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout { url: url.to_string() }
    } else {
        ApiError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl MeasurementRepository for ApiRepository {
    async fn get_setting(&self, key: &str) -> Result<serde_json::Value, ApiError> {
        let url = self.setting_url(key);
        let setting: SettingResponse = self.get_json(&url).await?;
        Ok(setting.value)
    }

    async fn list_settings(&self) -> Result<Vec<RawSetting>, ApiError> {
        self.get_json(&self.url(&self.settings_list_path)).await
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let url = format!("{}?value={}", self.setting_url(key), urlencoding::encode(value));
        tracing::debug!("Saving setting {}", key);
        self.send(self.client.put(&url), &url).await?;
        Ok(())
    }

    async fn last_measurement(&self, bus: BusId) -> Result<Measurements, ApiError> {
        let url = self.url(&format!("/buses/{}/measurements/last", bus.get()));
        self.get_json(&url).await
    }

    async fn last_minutes(&self, bus: BusId, minutes: u32) -> Result<Vec<TimeSeriesPoint>, ApiError> {
        let url = self.url(&format!(
            "/buses/{}/measurements/lastminutes?minutes={}",
            bus.get(),
            minutes
        ));
        let points: Vec<TimeSeriesPoint> = self.get_json(&url).await?;
        tracing::debug!("Got {} points for {} over {} min", points.len(), bus, minutes);
        Ok(points)
    }
}
