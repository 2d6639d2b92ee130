// In-memory measurement API used by the application tests
use crate::application::measurement_repository::{ApiError, MeasurementRepository, RawSetting};
use crate::domain::bus::{BusId, Measurements};
use crate::domain::telemetry::TimeSeriesPoint;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

#[derive(Default)]
pub struct FakeRepository {
    settings: Mutex<Vec<(String, serde_json::Value)>>,
    settings_fail: AtomicBool,
    failing_puts: Mutex<HashSet<String>>,
    puts: Mutex<Vec<(String, String)>>,
    put_gate: Mutex<Option<Arc<Semaphore>>>,
    snapshots: Mutex<HashMap<u32, Measurements>>,
    series: Mutex<HashMap<(u32, u32), Vec<TimeSeriesPoint>>>,
    series_gates: Mutex<HashMap<u32, Arc<Notify>>>,
    series_calls: AtomicUsize,
    abandoned: AtomicUsize,
}

/// Counts requests whose future was dropped before completing
struct InFlight<'a> {
    abandoned: &'a AtomicUsize,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn not_found(url: String) -> ApiError {
    ApiError::Status { url, status: 404 }
}

impl FakeRepository {
    pub fn set_setting(&self, key: &str, value: serde_json::Value) {
        let mut settings = self.settings.lock().unwrap();
        match settings.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => settings.push((key.to_string(), value)),
        }
    }

    pub fn setting(&self, key: &str) -> Option<serde_json::Value> {
        let settings = self.settings.lock().unwrap();
        settings.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    pub fn fail_settings(&self, fail: bool) {
        self.settings_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_put(&self, key: &str) {
        self.failing_puts.lock().unwrap().insert(key.to_string());
    }

    pub fn puts(&self) -> Vec<(String, String)> {
        self.puts.lock().unwrap().clone()
    }

    /// Hold every put until the returned semaphore gets a permit
    pub fn gate_puts(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.put_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_snapshot(&self, bus: u32, measurements: Measurements) {
        self.snapshots.lock().unwrap().insert(bus, measurements);
    }

    pub fn set_series(&self, bus: u32, minutes: u32, points: Vec<TimeSeriesPoint>) {
        self.series.lock().unwrap().insert((bus, minutes), points);
    }

    pub fn clear_series(&self, bus: u32, minutes: u32) {
        self.series.lock().unwrap().remove(&(bus, minutes));
    }

    /// Hold series requests for `bus` until the returned handle is notified
    pub fn gate_series(&self, bus: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.series_gates.lock().unwrap().insert(bus, gate.clone());
        gate
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeasurementRepository for FakeRepository {
    async fn get_setting(&self, key: &str) -> Result<serde_json::Value, ApiError> {
        if self.settings_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Transport {
                url: format!("/settings/{}", key),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.setting(key).unwrap_or(serde_json::Value::Null))
    }

    async fn list_settings(&self) -> Result<Vec<RawSetting>, ApiError> {
        if self.settings_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Transport {
                url: "/settings".to_string(),
                message: "connection refused".to_string(),
            });
        }
        let settings = self.settings.lock().unwrap();
        Ok(settings
            .iter()
            .map(|(key, value)| RawSetting {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let gate = self.put_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        if self.failing_puts.lock().unwrap().contains(key) {
            return Err(ApiError::Status {
                url: format!("/settings/{}", key),
                status: 500,
            });
        }
        self.puts.lock().unwrap().push((key.to_string(), value.to_string()));
        self.set_setting(key, serde_json::Value::String(value.to_string()));
        Ok(())
    }

    async fn last_measurement(&self, bus: BusId) -> Result<Measurements, ApiError> {
        let snapshots = self.snapshots.lock().unwrap();
        snapshots
            .get(&bus.get())
            .cloned()
            .ok_or_else(|| not_found(format!("/buses/{}/measurements/last", bus.get())))
    }

    async fn last_minutes(&self, bus: BusId, minutes: u32) -> Result<Vec<TimeSeriesPoint>, ApiError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        let mut in_flight = InFlight {
            abandoned: &self.abandoned,
            done: false,
        };

        let gate = self.series_gates.lock().unwrap().get(&bus.get()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        in_flight.done = true;
        let series = self.series.lock().unwrap();
        series.get(&(bus.get(), minutes)).cloned().ok_or_else(|| {
            not_found(format!(
                "/buses/{}/measurements/lastminutes?minutes={}",
                bus.get(),
                minutes
            ))
        })
    }
}
