// Polling loop controller - resolves the interval, fetches, applies, reschedules
use crate::application::interval_resolver::IntervalResolver;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Idle,
    ResolvingInterval,
    Fetching,
    Scheduled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollStatus {
    pub state: PollState,
    pub generation: u64,
    /// Interval resolved for the current cycle
    pub interval_ms: u64,
    /// Cycles completed by the current generation
    pub cycles: u64,
}

/// Produces the data for one cycle
pub type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>;

/// Returns true when two values would display the same
pub type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

struct Lineage {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Shared<T> {
    name: &'static str,
    resolver: IntervalResolver,
    equality: Equality<T>,
    lineage: Mutex<Lineage>,
    data: watch::Sender<T>,
    status: watch::Sender<PollStatus>,
}

impl<T> Shared<T> {
    fn lineage(&self) -> MutexGuard<'_, Lineage> {
        self.lineage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` only if `generation` is still the live one. The lineage lock is
    /// held throughout, so a restart cannot interleave with the update.
    fn if_live(&self, generation: u64, f: impl FnOnce(&Self)) -> bool {
        let lineage = self.lineage();
        if lineage.generation != generation {
            return false;
        }
        f(self);
        true
    }

    fn enter(&self, generation: u64, state: PollState, interval: Option<Duration>) -> bool {
        self.if_live(generation, |s| {
            s.status.send_modify(|status| {
                status.state = state;
                if let Some(interval) = interval {
                    status.interval_ms = interval.as_millis() as u64;
                }
            });
        })
    }

    /// Supersede whatever is running and mark the controller cancelled
    fn halt(&self) {
        let mut lineage = self.lineage();
        lineage.generation += 1;
        if let Some(task) = lineage.task.take() {
            task.abort();
        }
        let generation = lineage.generation;
        self.status.send_modify(|status| {
            status.state = PollState::Cancelled;
            status.generation = generation;
        });
    }
}

pub struct PollingController<T> {
    shared: Arc<Shared<T>>,
}

impl<T> PollingController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, resolver: IntervalResolver, initial: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(name, resolver, initial, Arc::new(|a: &T, b: &T| a == b))
    }

    pub fn with_equality(
        name: &'static str,
        resolver: IntervalResolver,
        initial: T,
        equality: Equality<T>,
    ) -> Self {
        let status = PollStatus {
            state: PollState::Idle,
            generation: 0,
            interval_ms: resolver.default_interval().as_millis() as u64,
            cycles: 0,
        };

        Self {
            shared: Arc::new(Shared {
                name,
                resolver,
                equality,
                lineage: Mutex::new(Lineage {
                    generation: 0,
                    task: None,
                }),
                data: watch::Sender::new(initial),
                status: watch::Sender::new(status),
            }),
        }
    }

    /// Displayed data; changes only when a cycle brings something different
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.data.subscribe()
    }

    pub fn current(&self) -> T {
        self.shared.data.borrow().clone()
    }

    pub fn status(&self) -> PollStatus {
        self.shared.status.borrow().clone()
    }

    #[cfg(test)]
    pub fn watch_status(&self) -> watch::Receiver<PollStatus> {
        self.shared.status.subscribe()
    }

    /// Start a new generation of cycles, superseding the running one
    pub fn restart(&self, fetch: FetchFn<T>) -> u64 {
        self.restart_with(fetch, None)
    }

    /// Like [`restart`](Self::restart), also replacing the displayed data with `reset`
    pub fn restart_with(&self, fetch: FetchFn<T>, reset: Option<T>) -> u64 {
        let shared = &self.shared;
        let mut lineage = shared.lineage();
        lineage.generation += 1;
        let generation = lineage.generation;

        if let Some(task) = lineage.task.take() {
            task.abort();
        }

        if let Some(reset) = reset {
            shared.data.send_if_modified(|current| {
                if (shared.equality)(current, &reset) {
                    false
                } else {
                    *current = reset;
                    true
                }
            });
        }

        shared.status.send_modify(|status| {
            status.state = PollState::Idle;
            status.generation = generation;
            status.cycles = 0;
        });

        tracing::debug!("{} poller starting generation {}", shared.name, generation);
        lineage.task = Some(tokio::spawn(run_cycles(shared.clone(), generation, fetch)));
        generation
    }

    /// Cancel the pending timer and any in-flight fetch. Nothing is applied afterwards.
    pub fn stop(&self) {
        self.shared.halt();
        tracing::debug!("{} poller stopped", self.shared.name);
    }
}

impl<T> Drop for PollingController<T> {
    fn drop(&mut self) {
        self.shared.halt();
    }
}

async fn run_cycles<T>(shared: Arc<Shared<T>>, generation: u64, fetch: FetchFn<T>)
where
    T: Clone + Send + Sync + 'static,
{
    loop {
        if !shared.enter(generation, PollState::ResolvingInterval, None) {
            return;
        }
        let interval = shared.resolver.resolve().await;

        if !shared.enter(generation, PollState::Fetching, Some(interval)) {
            return;
        }
        let next = fetch().await;

        let applied = shared.if_live(generation, |s| {
            let replaced = s.data.send_if_modified(|current| {
                if (s.equality)(current, &next) {
                    false
                } else {
                    *current = next;
                    true
                }
            });
            s.status.send_modify(|status| {
                status.state = PollState::Scheduled;
                status.cycles += 1;
            });
            tracing::trace!(
                "{} poller generation {}: data {}, next cycle in {:?}",
                s.name,
                generation,
                if replaced { "replaced" } else { "unchanged" },
                interval
            );
        });
        if !applied {
            tracing::debug!("{} poller dropped result of superseded generation {}", shared.name, generation);
            return;
        }

        tokio::time::sleep(interval).await;
    }
}
