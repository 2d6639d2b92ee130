// Overview view - latest snapshot of every bus, laid over the schematic
use crate::application::interval_resolver::IntervalResolver;
use crate::application::measurement_fetcher::MeasurementFetcher;
use crate::application::polling::{PollStatus, PollingController};
use crate::domain::bus::{BusId, BusSnapshot, format_value};
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// One labelled value on a bus card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLine {
    pub label: String,
    pub value: String,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusCard {
    pub id: u32,
    pub title: String,
    /// False until the bus has reported at least one value
    pub reporting: bool,
    pub lines: Vec<CardLine>,
}

/// Quantities shown on each card: label prefix, unit, per-phase fields
static CARD_ROWS: [(&str, &str, [&str; 3]); 4] = [
    ("V", "V", ["va_rms", "vb_rms", "vc_rms"]),
    ("I", "A", ["ia_rms", "ib_rms", "ic_rms"]),
    ("P", "W", ["pa", "pb", "pc"]),
    ("Q", "VAr", ["qa", "qb", "qc"]),
];

static PHASES: [&str; 3] = ["A", "B", "C"];

impl BusCard {
    pub fn from_snapshot(snapshot: &BusSnapshot) -> Self {
        let lines = CARD_ROWS
            .iter()
            .flat_map(|(prefix, unit, fields)| {
                PHASES.iter().zip(fields.iter()).map(move |(phase, field)| CardLine {
                    label: format!("{}_{}", prefix, phase),
                    value: format_value(snapshot.measurements.field(field)),
                    unit: *unit,
                })
            })
            .collect();

        Self {
            id: snapshot.bus_id.get(),
            title: snapshot.bus_id.to_string(),
            reporting: !snapshot.measurements.is_all_unknown(),
            lines,
        }
    }
}

pub struct OverviewView {
    controller: PollingController<Vec<BusSnapshot>>,
    fetcher: MeasurementFetcher,
    buses: Arc<Vec<BusId>>,
}

impl OverviewView {
    pub fn new(resolver: IntervalResolver, fetcher: MeasurementFetcher) -> Self {
        let buses = BusId::all();
        let placeholders = buses.iter().copied().map(BusSnapshot::placeholder).collect();

        Self {
            controller: PollingController::new("overview", resolver, placeholders),
            fetcher,
            buses: Arc::new(buses),
        }
    }

    pub fn start(&self) {
        let fetcher = self.fetcher.clone();
        let buses = self.buses.clone();
        self.controller.restart(Arc::new(move || {
            let fetcher = fetcher.clone();
            let buses = buses.clone();
            async move { fetcher.latest_all(&buses).await }.boxed()
        }));
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn snapshots(&self) -> Vec<BusSnapshot> {
        self.controller.current()
    }

    pub fn cards(&self) -> Vec<BusCard> {
        self.snapshots().iter().map(BusCard::from_snapshot).collect()
    }

    pub fn status(&self) -> PollStatus {
        self.controller.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<BusSnapshot>> {
        self.controller.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::FakeRepository;
    use crate::application::interval_resolver::DEFAULT_INTERVAL;
    use crate::domain::bus::Measurements;
    use std::time::Duration;

    fn view(repo: &Arc<FakeRepository>) -> OverviewView {
        OverviewView::new(
            IntervalResolver::new(repo.clone(), "api_update_time".to_string(), DEFAULT_INTERVAL),
            MeasurementFetcher::new(repo.clone()),
        )
    }

    #[test]
    fn test_card_lines() {
        let snapshot = BusSnapshot::new(
            BusId::new(4).unwrap(),
            Measurements {
                va_rms: Some(220.0),
                qc: Some(-12.5),
                ..Default::default()
            },
        );
        let card = BusCard::from_snapshot(&snapshot);

        assert_eq!(card.title, "B4");
        assert!(card.reporting);
        assert_eq!(card.lines.len(), 12);
        assert_eq!(card.lines[0].label, "V_A");
        assert_eq!(card.lines[0].value, "220");
        assert_eq!(card.lines[1].value, "-");
        assert_eq!(card.lines[11].label, "Q_C");
        assert_eq!(card.lines[11].value, "-12.5");
        assert_eq!(card.lines[11].unit, "VAr");
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_with_placeholders_then_polls() {
        let repo = Arc::new(FakeRepository::default());
        for bus in 1..=13 {
            if bus != 7 {
                repo.set_snapshot(
                    bus,
                    Measurements {
                        va_rms: Some(220.0),
                        ..Default::default()
                    },
                );
            }
        }

        let overview = view(&repo);
        assert!(overview.snapshots().iter().all(|s| s.measurements.is_all_unknown()));

        let mut rx = overview.subscribe();
        overview.start();
        tokio::time::timeout(Duration::from_secs(60), rx.changed())
            .await
            .unwrap()
            .unwrap();

        let cards = overview.cards();
        assert_eq!(cards.len(), 13);
        assert_eq!(cards[6].title, "B7");
        assert!(!cards[6].reporting);
        assert!(cards[6].lines.iter().all(|l| l.value == "-"));
        assert_eq!(cards[0].lines[0].value, "220");
        assert_eq!(overview.status().interval_ms, 5000);

        overview.stop();
    }
}
