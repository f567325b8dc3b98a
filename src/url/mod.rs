//! URL handling module for Elmo
//!
//! This module turns raw asset references into absolute URLs and decides
//! which hosts assets may be fetched from.

mod domain;
mod resolve;

// Re-export main functions
pub use domain::{is_allowed, parse_domain_list, DomainFilter};
pub use resolve::resolve_reference;
