//! Audit engine: asset discovery and bounded-concurrency fetching
//!
//! This module contains the core audit logic, including:
//! - HTML scanning for asset references
//! - HTTP fetching with timing and size measurement
//! - Sliding-window scheduling of asset fetches
//! - Overall run coordination

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::{admit_assets, run_audit, Admission, AuditReport, Auditor};
pub use extractor::{
    extract_references, AssetExtractor, AssetReference, InlineStyleUrl, ReferenceSource,
    SourceAttribute, SourceTag, StylesheetLink,
};
pub use fetcher::{build_http_client, AssetFetch, HttpFetcher};
pub use scheduler::{PendingQueue, ScheduleSummary, Scheduler, TaskOutcome};
