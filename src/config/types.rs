use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for an audit run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audit: AuditConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub nagios: NagiosConfig,
    #[serde(default)]
    pub influx: InfluxConfig,
}

impl Config {
    /// Builds a configuration for `url` with every other value at its default
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            audit: AuditConfig::for_url(url),
            transport: TransportConfig::default(),
            nagios: NagiosConfig::default(),
            influx: InfluxConfig::default(),
        }
    }
}

/// What the root page is and how its assets are fetched
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuditConfig {
    /// The root page URL
    pub url: String,

    /// Maximum number of concurrent asset fetches, 0 means unlimited
    #[serde(default = "default_parallel")]
    pub parallel: usize,

    /// Hosts assets may be fetched from; empty admits every host
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Substring the root page body must contain
    #[serde(default)]
    pub keyword: Option<String>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// How the aggregate response time is computed
    #[serde(default)]
    pub timing: TimingMode,
}

impl AuditConfig {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parallel: default_parallel(),
            allowed_domains: Vec::new(),
            keyword: None,
            headers: BTreeMap::new(),
            user_agent: default_user_agent(),
            timing: TimingMode::default(),
        }
    }
}

/// Aggregate response time accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Wall-clock time from the root request to the last asset completion
    #[default]
    Elapsed,
    /// Sum of every individual response time
    Cumulative,
}

impl FromStr for TimingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elapsed" => Ok(Self::Elapsed),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(format!(
                "unknown timing mode '{}', expected 'elapsed' or 'cumulative'",
                other
            )),
        }
    }
}

/// Timeouts and connection rewriting applied by the shared HTTP client
///
/// All durations are in milliseconds; 0 disables the optional ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransportConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default)]
    pub tls_timeout: u64,

    #[serde(default)]
    pub response_header_timeout: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// DNS rewrite rule in `host:port:addr` form
    #[serde(default)]
    pub resolve: Option<String>,
}

impl TransportConfig {
    /// Time allowed to establish a connection, TLS handshake included
    pub fn connect_budget(&self) -> Duration {
        Duration::from_millis(self.connect_timeout.saturating_add(self.tls_timeout))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn response_header_timeout(&self) -> Option<Duration> {
        (self.response_header_timeout > 0)
            .then(|| Duration::from_millis(self.response_header_timeout))
    }

    /// Parses the DNS rewrite rule, if one is configured
    pub fn resolve_rule(&self) -> Result<Option<ResolveRule>, String> {
        self.resolve.as_deref().map(str::parse).transpose()
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            tls_timeout: 0,
            response_header_timeout: 0,
            request_timeout: default_request_timeout(),
            resolve: None,
        }
    }
}

/// A `host:port:addr` rule sending connections for `host:port` to `addr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRule {
    pub host: String,
    pub port: u16,
    pub addr: IpAddr,
}

impl ResolveRule {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

impl FromStr for ResolveRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The address is last so IPv6 colons stay inside it
        let mut parts = s.splitn(3, ':');
        let (host, port, addr) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(a)) if !h.is_empty() => (h, p, a),
            _ => return Err(format!("resolve rule '{}' must be host:port:addr", s)),
        };

        let port = port
            .parse::<u16>()
            .map_err(|e| format!("invalid port in resolve rule '{}': {}", s, e))?;
        let addr = addr
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map_err(|e| format!("invalid address in resolve rule '{}': {}", s, e))?;

        Ok(Self {
            host: host.to_string(),
            port,
            addr,
        })
    }
}

impl fmt::Display for ResolveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.host, self.port, self.addr)
    }
}

/// Monitoring thresholds on total time, in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct NagiosConfig {
    #[serde(default = "default_nagios_warning")]
    pub warning: u64,

    #[serde(default = "default_nagios_critical")]
    pub critical: u64,
}

impl Default for NagiosConfig {
    fn default() -> Self {
        Self {
            warning: default_nagios_warning(),
            critical: default_nagios_critical(),
        }
    }
}

/// Time-series export target
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_url")]
    pub url: String,

    #[serde(default = "default_influx_database")]
    pub database: String,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            database: default_influx_database(),
        }
    }
}

fn default_parallel() -> usize {
    8
}

fn default_user_agent() -> String {
    format!("elmo/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    10000
}

fn default_nagios_warning() -> u64 {
    5000
}

fn default_nagios_critical() -> u64 {
    10000
}

fn default_influx_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_influx_database() -> String {
    "elmo".to_string()
}
