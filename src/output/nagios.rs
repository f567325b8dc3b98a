//! Monitoring-plugin status and output line
//!
//! Total run time is compared against the warning and critical thresholds.
//! The resulting status doubles as the process exit code.

use crate::audit::AuditReport;
use crate::config::Config;
use std::fmt;
use std::time::Duration;

/// Plugin status in exit-code order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NagiosStatus {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl NagiosStatus {
    /// Classifies a total time; reaching a threshold counts as crossing it
    pub fn evaluate(total: Duration, warning: Duration, critical: Duration) -> Self {
        if total >= critical {
            Self::Critical
        } else if total >= warning {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }
}

impl fmt::Display for NagiosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Evaluates a report against the configured thresholds
pub fn evaluate_report(report: &AuditReport, config: &Config) -> NagiosStatus {
    NagiosStatus::evaluate(
        report.total.total_response_time,
        Duration::from_millis(config.nagios.warning),
        Duration::from_millis(config.nagios.critical),
    )
}

/// Renders the plugin output line with performance data
///
/// `Downloaded <KB>KB in <ok>/<admitted> files in <time>.|size=<KB>KB time=<ms>ms;<warn>;<crit>;0;<timeout>`
pub fn format_nagios_line(report: &AuditReport, config: &Config) -> String {
    let size_kb = report.total.size_kb();
    format!(
        "Downloaded {}KB in {}/{} files in {:?}.|size={}KB time={}ms;{};{};0;{}",
        size_kb,
        report.assets.len(),
        report.admitted,
        report.total.total_response_time,
        size_kb,
        report.total.total_response_time.as_millis(),
        config.nagios.warning,
        config.nagios.critical,
        config.transport.request_timeout
    )
}
