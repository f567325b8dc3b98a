//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of an audit, including:
//! - Building the shared HTTP client from the transport configuration
//! - Timing a GET until its response head arrives
//! - Draining bodies to measure their size
//! - Classifying request failures

use crate::config::Config;
use crate::stats::ResourceStatistic;
use crate::{AuditError, ConfigError, FetchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use std::future::Future;
use std::time::{Duration, Instant};

/// One GET per asset, shared by every scheduler task
///
/// Implementations must be safe to call concurrently. An HTTP error status is
/// still a successful fetch; only request-level failures are errors.
pub trait AssetFetch: Send + Sync + 'static {
    fn fetch(
        &self,
        url: String,
    ) -> impl Future<Output = Result<ResourceStatistic, FetchError>> + Send;
}

/// Builds the HTTP client shared by the root and asset fetches
///
/// # Arguments
///
/// * `config` - The audit configuration (headers, user agent, timeouts, DNS rewrite)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(AuditError)` - Invalid header or rewrite rule, or the client failed to build
///
/// # Example
///
/// ```no_run
/// use elmo::config::Config;
/// use elmo::audit::build_http_client;
///
/// let mut config = Config::for_url("https://test.com/");
/// config.audit.user_agent = "monitor/1.0".to_string();
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, AuditError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.audit.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::Validation(format!("Invalid value for header '{}'", name)))?;
        headers.insert(name, value);
    }

    let transport = &config.transport;
    let mut builder = Client::builder()
        .user_agent(config.audit.user_agent.as_str())
        .default_headers(headers)
        .timeout(transport.request_timeout())
        .gzip(true)
        .brotli(true);

    // TLS handshake time is part of reqwest's connect phase
    let connect_budget = transport.connect_budget();
    if !connect_budget.is_zero() {
        builder = builder.connect_timeout(connect_budget);
    }

    if let Some(rule) = transport.resolve_rule().map_err(ConfigError::Validation)? {
        tracing::debug!("Applying resolve rule {}", rule);
        builder = builder.resolve(&rule.host, rule.socket_addr());
    }

    Ok(builder.build()?)
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    header_timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(client: Client, header_timeout: Option<Duration>) -> Self {
        Self {
            client,
            header_timeout,
        }
    }

    /// Builds a fetcher and its client from the configuration
    pub fn from_config(config: &Config) -> Result<Self, AuditError> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, config.transport.response_header_timeout()))
    }

    /// Sends a GET and waits for the response head
    async fn send(&self, url: &str) -> Result<Response, FetchError> {
        let request = self.client.get(url).send();

        let result = match self.header_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| FetchError::Timeout {
                    url: url.to_string(),
                })?,
            None => request.await,
        };

        result.map_err(|e| FetchError::from_send(url, e))
    }

    /// Fetches an asset, draining its body to measure the size
    ///
    /// A body read failure after the head arrived is not an error: the
    /// statistic is kept with a size of 0.
    pub async fn fetch_asset(&self, url: &str) -> Result<ResourceStatistic, FetchError> {
        let start = Instant::now();
        let mut response = self.send(url).await?;
        let response_time = start.elapsed();
        let status_code = response.status().as_u16();

        let mut response_size = 0u64;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => response_size += chunk.len() as u64,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read body of {}: {}", url, e);
                    response_size = 0;
                    break;
                }
            }
        }

        Ok(ResourceStatistic {
            url: url.to_string(),
            response_time,
            response_size,
            status_code,
        })
    }

    /// Fetches the root page, keeping its body for extraction
    ///
    /// Unlike assets, an unreadable root body is an error.
    pub async fn fetch_page(&self, url: &str) -> Result<(ResourceStatistic, Vec<u8>), FetchError> {
        let start = Instant::now();
        let response = self.send(url).await?;
        let response_time = start.elapsed();
        let status_code = response.status().as_u16();

        let body = response.bytes().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        let stat = ResourceStatistic {
            url: url.to_string(),
            response_time,
            response_size: body.len() as u64,
            status_code,
        };

        Ok((stat, body.to_vec()))
    }
}

impl AssetFetch for HttpFetcher {
    fn fetch(
        &self,
        url: String,
    ) -> impl Future<Output = Result<ResourceStatistic, FetchError>> + Send {
        async move { self.fetch_asset(&url).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = Config::for_url("http://test.com/");
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_build_client_with_headers_and_resolve() {
        let mut config = Config::for_url("http://test.com/");
        config
            .audit
            .headers
            .insert("X-Audit".to_string(), "1".to_string());
        config.transport.resolve = Some("test.com:80:127.0.0.1".to_string());
        config.transport.tls_timeout = 500;

        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = Config::for_url("http://test.com/");
        config
            .audit
            .headers
            .insert("Bad Header".to_string(), "x".to_string());

        assert!(matches!(
            build_http_client(&config),
            Err(AuditError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_invalid_resolve_rule_rejected() {
        let mut config = Config::for_url("http://test.com/");
        config.transport.resolve = Some("test.com".to_string());

        assert!(build_http_client(&config).is_err());
    }

    #[tokio::test]
    async fn test_connection_refused_is_fetch_error() {
        let config = Config::for_url("http://127.0.0.1:1/");
        let fetcher = HttpFetcher::from_config(&config).unwrap();

        let result = fetcher.fetch_asset("http://127.0.0.1:1/a.png").await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().url(), "http://127.0.0.1:1/a.png");
    }

    #[tokio::test]
    async fn test_truncated_body_keeps_statistic_with_zero_size() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Promises 100 bytes, sends 10, then closes the connection
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let url = format!("http://{}/asset.bin", addr);
        let fetcher = HttpFetcher::from_config(&Config::for_url(url.clone())).unwrap();
        let stat = fetcher.fetch_asset(&url).await.expect("head was received");

        assert_eq!(stat.status_code, 200);
        assert_eq!(stat.response_size, 0);
        assert_eq!(stat.url, url);

        server.await.unwrap();
    }

    // Status and size handling is covered with wiremock in the integration tests
}
