//! Audit coordinator - root page to aggregated report
//!
//! This module ties the pipeline together:
//! - Fetching the root page synchronously and checking the keyword
//! - Extracting, resolving and filtering asset references
//! - Handing the admitted URLs to the scheduler
//! - Closing the aggregate totals into an [`AuditReport`]

use crate::audit::extractor::extract_references;
use crate::audit::fetcher::HttpFetcher;
use crate::audit::scheduler::{PendingQueue, Scheduler};
use crate::config::Config;
use crate::stats::{AggregateStatistic, Aggregator, ResourceStatistic};
use crate::url::{resolve_reference, DomainFilter};
use crate::AuditError;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Everything an audit run produced
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// The root page's own statistic
    pub root: ResourceStatistic,

    /// Successful asset statistics, in completion order
    pub assets: Vec<ResourceStatistic>,

    /// Totals over the root page and every successful asset
    pub total: AggregateStatistic,

    /// References found on the root page
    pub discovered: usize,

    /// References dropped because they could not be resolved
    pub malformed: usize,

    /// URLs rejected by the domain filter
    pub filtered: usize,

    /// URLs handed to the scheduler
    pub admitted: usize,

    /// Admitted URLs whose fetch errored
    pub failed: usize,

    pub peak_in_flight: usize,
}

impl AuditReport {
    /// Root statistic followed by the asset statistics
    pub fn all_statistics(&self) -> impl Iterator<Item = &ResourceStatistic> {
        std::iter::once(&self.root).chain(self.assets.iter())
    }
}

/// Result of turning raw references into a pending queue
#[derive(Debug, Default)]
pub struct Admission {
    pub queue: PendingQueue,
    pub discovered: usize,
    pub malformed: usize,
    pub filtered: usize,
}

/// Resolves and filters the references of a page body
///
/// Queue order is discovery order. Duplicates are kept.
pub fn admit_assets(body: &[u8], base: &Url, filter: &DomainFilter) -> Admission {
    let mut admission = Admission::default();

    for reference in extract_references(body) {
        admission.discovered += 1;

        let resolved = match resolve_reference(&reference.raw_value, base) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("Skipping {:?} reference: {}", reference.source_tag, e);
                admission.malformed += 1;
                continue;
            }
        };

        if let Err(e) = Url::parse(&resolved) {
            tracing::warn!("Skipping unparsable asset url {}: {}", resolved, e);
            admission.malformed += 1;
            continue;
        }

        if !filter.admits(&resolved) {
            tracing::trace!("Filtered out {}", resolved);
            admission.filtered += 1;
            continue;
        }

        admission.queue.push(resolved);
    }

    admission
}

/// Main audit coordinator
pub struct Auditor<'a> {
    config: &'a Config,
    fetcher: Arc<HttpFetcher>,
    filter: DomainFilter,
}

impl<'a> Auditor<'a> {
    /// Builds the shared HTTP client and domain filter
    pub fn new(config: &'a Config) -> Result<Self, AuditError> {
        let fetcher = HttpFetcher::from_config(config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: &'a Config, fetcher: HttpFetcher) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            filter: DomainFilter::new(config.audit.allowed_domains.iter().cloned()),
        }
    }

    /// Runs the audit to completion
    ///
    /// Only a root page failure stops the run; asset failures are counted.
    pub async fn run(&self) -> Result<AuditReport, AuditError> {
        let root_url = self.config.audit.url.as_str();
        let base = Url::parse(root_url)?;
        let started = Instant::now();

        tracing::info!("Fetching root page {}", root_url);
        let (root, body) =
            self.fetcher
                .fetch_page(root_url)
                .await
                .map_err(|source| AuditError::RootFetch {
                    url: root_url.to_string(),
                    source,
                })?;

        tracing::debug!(
            "{} {} {:?} {}b",
            root.status_code,
            root.url,
            root.response_time,
            root.response_size
        );

        if let Some(keyword) = &self.config.audit.keyword {
            if !String::from_utf8_lossy(&body).contains(keyword.as_str()) {
                return Err(AuditError::KeywordMissing {
                    url: root_url.to_string(),
                    keyword: keyword.clone(),
                });
            }
        }

        let admission = admit_assets(&body, &base, &self.filter);
        let admitted = admission.queue.len();
        tracing::info!(
            "Found {} references, {} admitted, {} filtered, {} malformed",
            admission.discovered,
            admitted,
            admission.filtered,
            admission.malformed
        );

        let mut aggregator = Aggregator::new(self.config.audit.timing);
        aggregator.accumulate_root(&root);

        let scheduler = Scheduler::new(Arc::clone(&self.fetcher), self.config.audit.parallel);
        let summary = scheduler.run(admission.queue, &mut aggregator).await;

        let (total, assets) = aggregator.finish(started.elapsed());
        tracing::info!(
            "Downloaded {}/{} assets, {} bytes in {:?}",
            assets.len(),
            admitted,
            total.total_response_size,
            total.total_response_time
        );

        Ok(AuditReport {
            root,
            assets,
            total,
            discovered: admission.discovered,
            malformed: admission.malformed,
            filtered: admission.filtered,
            admitted,
            failed: summary.failed,
            peak_in_flight: summary.peak_in_flight,
        })
    }
}

/// Runs a complete audit
///
/// This function orchestrates the entire run:
///
/// 1. Build the shared HTTP client
/// 2. Fetch the root page (fatal on failure)
/// 3. Check the required keyword, if any
/// 4. Extract, resolve and filter asset references
/// 5. Fetch assets through the sliding-window scheduler
/// 6. Close the aggregate totals
///
/// # Arguments
///
/// * `config` - The audit configuration
///
/// # Returns
///
/// * `Ok(AuditReport)` - Run completed, possibly with failed assets
/// * `Err(AuditError)` - The root page could not be audited
///
/// # Example
///
/// ```no_run
/// use elmo::config::Config;
/// use elmo::audit::run_audit;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::for_url("https://test.com/");
/// let report = run_audit(&config).await?;
/// println!("{} assets, {} bytes", report.assets.len(), report.total.total_response_size);
/// # Ok(())
/// # }
/// ```
pub async fn run_audit(config: &Config) -> Result<AuditReport, AuditError> {
    Auditor::new(config)?.run().await
}
