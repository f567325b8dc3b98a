use std::collections::HashSet;

/// Checks a host against an asset allow-list
///
/// An empty list admits every host. Otherwise the host must equal one of the
/// entries exactly: no wildcard, no case folding, no port handling.
///
/// # Examples
///
/// ```
/// use elmo::url::is_allowed;
///
/// let allowed = vec!["test.com".to_string(), "test3.com".to_string()];
/// assert!(is_allowed("test3.com", &allowed));
/// assert!(!is_allowed("test2.com", &allowed));
/// assert!(is_allowed("anything.org", &[]));
/// ```
pub fn is_allowed(host: &str, allow_list: &[String]) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|entry| entry == host)
}

/// Splits a comma-separated host list, dropping blank entries
pub fn parse_domain_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Admission check applied to every asset URL before it is queued
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    allowed: HashSet<String>,
}

impl DomainFilter {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a filter from a comma-separated host list
    pub fn from_list(list: &str) -> Self {
        Self::new(parse_domain_list(list))
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn allows_host(&self, host: &str) -> bool {
        self.is_open() || self.allowed.contains(host)
    }

    /// Returns true if the absolute URL may be fetched
    ///
    /// The host is compared as written, without case folding. A URL without
    /// a host only passes an open filter.
    pub fn admits(&self, url: &str) -> bool {
        match written_host(url) {
            Some(host) => self.allows_host(host),
            None => self.is_open(),
        }
    }
}

/// Host of an absolute URL exactly as it appears in the text
///
/// Userinfo and port are stripped. IPv6 literals keep their brackets.
fn written_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);

    let host = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(end) => &host_port[..=end],
            None => host_port,
        }
    } else {
        host_port
            .split_once(':')
            .map_or(host_port, |(host, _)| host)
    };

    (!host.is_empty()).then_some(host)
}
