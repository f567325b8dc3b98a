//! Time-series export in InfluxDB line protocol
//!
//! Every statistic of a run becomes one point in a measurement named after
//! the root URL, tagged with the resource URL. All points share one
//! timestamp so a run reads as a single instant.

use crate::audit::AuditReport;
use crate::config::InfluxConfig;
use crate::stats::ResourceStatistic;
use crate::AuditError;
use reqwest::Client;
use url::Url;

/// Writes audit statistics to an InfluxDB `/write` endpoint
pub struct InfluxExporter {
    client: Client,
    endpoint: Url,
}

impl InfluxExporter {
    pub fn new(config: &InfluxConfig) -> Result<Self, AuditError> {
        Ok(Self::with_client(Client::new(), write_endpoint(config)?))
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Sends the root and asset statistics as one batch
    pub async fn export(&self, report: &AuditReport) -> Result<(), AuditError> {
        let timestamp = chrono::Utc::now().timestamp();
        let body = render_points(&report.root.url, report.all_statistics(), timestamp);

        tracing::debug!(
            "Sending {} points to {}",
            report.assets.len() + 1,
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| AuditError::Export(format!("request to influx failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AuditError::Export(format!(
                "influx answered {}: {}",
                status,
                detail.trim()
            )));
        }

        Ok(())
    }
}

/// Builds `<url>/write?db=<database>&precision=s`
///
/// `write` is appended to any path prefix of the configured URL.
pub fn write_endpoint(config: &InfluxConfig) -> Result<Url, AuditError> {
    let mut endpoint = Url::parse(&config.url)?;
    endpoint
        .path_segments_mut()
        .map_err(|_| AuditError::Export(format!("influx url '{}' cannot take a path", config.url)))?
        .pop_if_empty()
        .push("write");
    endpoint.set_query(None);
    endpoint
        .query_pairs_mut()
        .append_pair("db", &config.database)
        .append_pair("precision", "s");
    Ok(endpoint)
}

/// Renders one line-protocol point per statistic
///
/// Response time is written in nanoseconds.
pub fn render_points<'a>(
    measurement: &str,
    stats: impl IntoIterator<Item = &'a ResourceStatistic>,
    timestamp: i64,
) -> String {
    let measurement = escape_measurement(measurement);

    stats
        .into_iter()
        .map(|stat| {
            format!(
                "{},url={} responseTime={}i,responseSize={}i {}\n",
                measurement,
                escape_tag(&stat.url),
                stat.response_time.as_nanos(),
                stat.response_size,
                timestamp
            )
        })
        .collect()
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
