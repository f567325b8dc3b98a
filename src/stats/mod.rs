//! Per-resource and aggregate download statistics

mod aggregator;

pub use aggregator::Aggregator;

use std::time::Duration;

/// Outcome of one attempted fetch that produced a response
///
/// Created once per root page or asset and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatistic {
    pub url: String,

    /// Time from request start until the response head arrived
    pub response_time: Duration,

    /// Body size in bytes, 0 if the body could not be read
    pub response_size: u64,

    pub status_code: u16,
}

/// Running totals for a whole audit run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStatistic {
    pub total_response_time: Duration,
    pub total_response_size: u64,
}

impl AggregateStatistic {
    /// Total size in whole kilobytes (1024 bytes)
    pub fn size_kb(&self) -> u64 {
        self.total_response_size / 1024
    }
}
