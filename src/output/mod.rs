//! Output module for audit results
//!
//! This module handles:
//! - Printing a console summary of a run
//! - Monitoring-plugin status, output line and exit code
//! - Exporting statistics to a time-series database

mod console;
mod influx;
mod nagios;

pub use console::{print_report, render_report, render_statistic};
pub use influx::{render_points, write_endpoint, InfluxExporter};
pub use nagios::{evaluate_report, format_nagios_line, NagiosStatus};
