// Measurement fetcher - read-only queries that never fail past their boundary
use crate::application::measurement_repository::MeasurementRepository;
use crate::domain::bus::{BusId, BusSnapshot};
use crate::domain::telemetry::TimeSeriesPoint;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct MeasurementFetcher {
    repository: Arc<dyn MeasurementRepository>,
}

impl MeasurementFetcher {
    pub fn new(repository: Arc<dyn MeasurementRepository>) -> Self {
        Self { repository }
    }

    /// Time series of one bus over the trailing window. Failures yield no data.
    pub async fn series(&self, bus: BusId, minutes: u32) -> Vec<TimeSeriesPoint> {
        match self.repository.last_minutes(bus, minutes).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("Error fetching {} min series for {}: {}", minutes, bus, e);
                Vec::new()
            }
        }
    }

    /// Latest snapshot of every bus, queried together.
    /// The result follows the order of `buses`; a failed bus gets a placeholder.
    pub async fn latest_all(&self, buses: &[BusId]) -> Vec<BusSnapshot> {
        let queries = buses.iter().map(|&bus| {
            let repo = self.repository.clone();
            async move {
                match repo.last_measurement(bus).await {
                    Ok(measurements) => BusSnapshot::new(bus, measurements),
                    Err(e) => {
                        tracing::warn!("Error fetching latest measurement for {}: {}", bus, e);
                        BusSnapshot::placeholder(bus)
                    }
                }
            }
        });

        join_all(queries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::FakeRepository;
    use crate::domain::bus::Measurements;
    use crate::domain::telemetry::parse_timestamp;

    fn reading(va: f64) -> Measurements {
        Measurements {
            va_rms: Some(va),
            ia_rms: Some(va / 100.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failed_bus_becomes_placeholder_in_order() {
        let repo = Arc::new(FakeRepository::default());
        for bus in 1..=13 {
            if bus != 7 {
                repo.set_snapshot(bus, reading(200.0 + bus as f64));
            }
        }

        let fetcher = MeasurementFetcher::new(repo);
        let snapshots = fetcher.latest_all(&BusId::all()).await;

        assert_eq!(snapshots.len(), 13);
        for (i, snapshot) in snapshots.iter().enumerate() {
            let id = i as u32 + 1;
            assert_eq!(snapshot.bus_id.get(), id);
            if id == 7 {
                assert!(snapshot.measurements.is_all_unknown());
            } else {
                assert_eq!(snapshot.measurements.va_rms, Some(200.0 + id as f64));
            }
        }
    }

    #[tokio::test]
    async fn test_output_follows_input_order() {
        let repo = Arc::new(FakeRepository::default());
        repo.set_snapshot(2, reading(2.0));
        repo.set_snapshot(9, reading(9.0));

        let fetcher = MeasurementFetcher::new(repo);
        let buses = [BusId::new(9).unwrap(), BusId::new(2).unwrap()];
        let snapshots = fetcher.latest_all(&buses).await;

        let ids: Vec<u32> = snapshots.iter().map(|s| s.bus_id.get()).collect();
        assert_eq!(ids, vec![9, 2]);
    }

    #[tokio::test]
    async fn test_series_failure_is_empty() {
        let repo = Arc::new(FakeRepository::default());
        let t0 = parse_timestamp("2025-03-01T12:00:00").unwrap();
        repo.set_series(3, 5, vec![TimeSeriesPoint::new(t0, reading(220.1))]);

        let fetcher = MeasurementFetcher::new(repo);
        let bus3 = BusId::new(3).unwrap();
        assert_eq!(fetcher.series(bus3, 5).await.len(), 1);
        assert!(fetcher.series(bus3, 10).await.is_empty());
    }
}
