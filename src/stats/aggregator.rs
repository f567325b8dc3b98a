use crate::config::TimingMode;
use crate::stats::{AggregateStatistic, ResourceStatistic};
use std::time::Duration;

/// Folds statistics into the run total
///
/// The aggregator is owned by the scheduler's control loop and takes `&mut
/// self`, so concurrent fetch completions can only reach it one message at a
/// time.
#[derive(Debug)]
pub struct Aggregator {
    mode: TimingMode,
    total: AggregateStatistic,
    statistics: Vec<ResourceStatistic>,
}

impl Aggregator {
    pub fn new(mode: TimingMode) -> Self {
        Self {
            mode,
            total: AggregateStatistic::default(),
            statistics: Vec::new(),
        }
    }

    /// Folds the root page into the totals without retaining it
    pub fn accumulate_root(&mut self, stat: &ResourceStatistic) {
        self.fold(stat);
    }

    /// Folds an asset statistic into the totals and retains it
    pub fn accumulate(&mut self, stat: ResourceStatistic) {
        self.fold(&stat);
        self.statistics.push(stat);
    }

    fn fold(&mut self, stat: &ResourceStatistic) {
        self.total.total_response_size += stat.response_size;
        if self.mode == TimingMode::Cumulative {
            self.total.total_response_time += stat.response_time;
        }
    }

    pub fn total(&self) -> AggregateStatistic {
        self.total
    }

    /// Retained asset statistics, in completion order
    pub fn statistics(&self) -> &[ResourceStatistic] {
        &self.statistics
    }

    /// Closes the run
    ///
    /// In elapsed mode the total time becomes the run's wall-clock time.
    pub fn finish(mut self, elapsed: Duration) -> (AggregateStatistic, Vec<ResourceStatistic>) {
        if self.mode == TimingMode::Elapsed {
            self.total.total_response_time = elapsed;
        }
        (self.total, self.statistics)
    }
}
