//! Plain console report of an audit run

use crate::audit::AuditReport;
use crate::stats::ResourceStatistic;
use std::fmt::Write;

/// Renders the run summary, with one line per resource when `verbose`
pub fn render_report(report: &AuditReport, verbose: bool) -> String {
    let mut out = String::new();

    if verbose {
        for stat in report.all_statistics() {
            let _ = writeln!(out, "{}", render_statistic(stat));
        }
    }

    let _ = writeln!(
        out,
        "Downloaded assets: {}/{}.",
        report.assets.len(),
        report.admitted
    );
    let _ = writeln!(out, "Total time: {:?}.", report.total.total_response_time);
    let _ = writeln!(out, "Total size: {}kb.", report.total.size_kb());

    out
}

/// One resource as `status url time sizeb`
pub fn render_statistic(stat: &ResourceStatistic) -> String {
    format!(
        "{} {} {:?} {}b",
        stat.status_code, stat.url, stat.response_time, stat.response_size
    )
}

/// Prints the report to stdout
pub fn print_report(report: &AuditReport, verbose: bool) {
    print!("{}", render_report(report, verbose));
}
