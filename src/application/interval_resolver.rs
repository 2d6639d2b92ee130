// Resolves the refresh period the backend wants views to poll at
use crate::application::measurement_repository::MeasurementRepository;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Clone)]
pub struct IntervalResolver {
    repository: Arc<dyn MeasurementRepository>,
    key: String,
    default: Duration,
}

impl IntervalResolver {
    pub fn new(repository: Arc<dyn MeasurementRepository>, key: String, default: Duration) -> Self {
        Self {
            repository,
            key,
            default,
        }
    }

    pub fn default_interval(&self) -> Duration {
        self.default
    }

    /// Current refresh period. Any failure falls back to the default.
    pub async fn resolve(&self) -> Duration {
        match self.repository.get_setting(&self.key).await {
            Ok(value) => match seconds_from_value(&value) {
                Some(interval) => interval,
                None => {
                    tracing::debug!("Setting {} has no usable value ({}), using default", self.key, value);
                    self.default
                }
            },
            Err(e) => {
                tracing::debug!("Could not read {}: {}, using default", self.key, e);
                self.default
            }
        }
    }
}

/// Interpret a setting holding seconds, as a number or numeric string
fn seconds_from_value(value: &serde_json::Value) -> Option<Duration> {
    let seconds = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if seconds.is_finite() && seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}
