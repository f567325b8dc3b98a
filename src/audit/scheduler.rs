//! Sliding-window fetch scheduler
//!
//! This module handles:
//! - The queue of admitted asset URLs, consumed in discovery order
//! - Dispatching an initial wave of fetch tasks up to the parallelism limit
//! - Replacing every finished task with the next pending URL
//! - Folding successful statistics into the run's [`Aggregator`]
//!
//! Tasks never touch scheduler state. Each one yields a single [`TaskOutcome`]
//! through a [`JoinSet`] and the control loop owns the queue, the counters and
//! the aggregator. A task that panics still completes its slot as a failure.

use crate::audit::fetcher::AssetFetch;
use crate::stats::{Aggregator, ResourceStatistic};
use crate::FetchError;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Admitted asset URLs waiting to be fetched, in discovery order
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    urls: VecDeque<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: String) {
        self.urls.push_back(url);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.urls.pop_front()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl FromIterator<String> for PendingQueue {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

/// The single value a fetch task yields when it finishes
#[derive(Debug)]
pub enum TaskOutcome {
    Success(ResourceStatistic),
    Failure(FetchError),
}

/// Counters describing a completed scheduling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Tasks dispatched, one per admitted URL
    pub dispatched: usize,

    /// Tasks that reported back, successful or not
    pub completed: usize,

    pub succeeded: usize,
    pub failed: usize,

    /// Highest number of tasks in flight at once
    pub peak_in_flight: usize,
}

/// Scheduler dispatching fetches through a bounded window
///
/// The window holds `parallelism` tasks; 0 launches every URL at once.
pub struct Scheduler<F> {
    fetcher: Arc<F>,
    parallelism: usize,
}

impl<F: AssetFetch> Scheduler<F> {
    pub fn new(fetcher: Arc<F>, parallelism: usize) -> Self {
        Self {
            fetcher,
            parallelism,
        }
    }

    /// Size of the dispatch window for `total` URLs
    pub fn window(&self, total: usize) -> usize {
        if self.parallelism == 0 {
            total
        } else {
            self.parallelism.min(total)
        }
    }

    /// Fetches every queued URL exactly once
    ///
    /// Returns once all dispatched tasks have been joined. Failed fetches and
    /// panicked tasks are logged and counted but never produce a statistic.
    pub async fn run(&self, mut queue: PendingQueue, aggregator: &mut Aggregator) -> ScheduleSummary {
        let total = queue.len();
        let mut summary = ScheduleSummary::default();

        if total == 0 {
            return summary;
        }

        let mut tasks = JoinSet::new();

        let window = self.window(total);
        tracing::debug!("Dispatching initial wave of {} of {} assets", window, total);

        for _ in 0..window {
            if let Some(url) = queue.pop() {
                self.dispatch(url, &mut tasks);
                summary.dispatched += 1;
            }
        }
        summary.peak_in_flight = tasks.len();

        while summary.completed < total {
            let Some(joined) = tasks.join_next().await else {
                // Every dispatched task has been joined
                break;
            };

            summary.completed += 1;

            match joined {
                Ok(TaskOutcome::Success(stat)) => {
                    tracing::debug!(
                        "{} {} {:?} {}b",
                        stat.status_code,
                        stat.url,
                        stat.response_time,
                        stat.response_size
                    );
                    aggregator.accumulate(stat);
                    summary.succeeded += 1;
                }
                Ok(TaskOutcome::Failure(error)) => {
                    tracing::warn!("Dropping asset: {}", error);
                    summary.failed += 1;
                }
                Err(error) => {
                    tracing::error!("Fetch task aborted: {}", error);
                    summary.failed += 1;
                }
            }

            if let Some(url) = queue.pop() {
                self.dispatch(url, &mut tasks);
                summary.dispatched += 1;
                summary.peak_in_flight = summary.peak_in_flight.max(tasks.len());
            }
        }

        tracing::debug!(
            "Scheduler drained: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed
        );

        summary
    }

    fn dispatch(&self, url: String, tasks: &mut JoinSet<TaskOutcome>) {
        tracing::trace!("Dispatching {}", url);
        let fetcher = Arc::clone(&self.fetcher);

        tasks.spawn(async move {
            match fetcher.fetch(url).await {
                Ok(stat) => TaskOutcome::Success(stat),
                Err(error) => TaskOutcome::Failure(error),
            }
        });
    }
}
