//! Configuration module for Elmo
//!
//! A run is driven by one immutable [`Config`], either loaded from a TOML file
//! or built in code with [`Config::for_url`] and adjusted by the command line.
//!
//! # Example
//!
//! ```no_run
//! use elmo::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("elmo.toml")).unwrap();
//! println!("Parallel fetches: {}", config.audit.parallel);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuditConfig, Config, InfluxConfig, NagiosConfig, ResolveRule, TimingMode, TransportConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
