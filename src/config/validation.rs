use crate::config::types::{AuditConfig, Config, NagiosConfig, TransportConfig};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_audit_config(&config.audit)?;
    validate_transport_config(&config.transport)?;
    validate_nagios_config(&config.nagios)?;

    Url::parse(&config.influx.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid influx url: {}", e)))?;

    Ok(())
}

/// Validates the root URL, domain list and headers
fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url '{}': {}", config.url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Root url '{}' must use http or https",
            config.url
        )));
    }

    for domain in &config.allowed_domains {
        if domain.is_empty() || domain.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "Allowed domain '{}' must be a non-empty host name",
                domain
            )));
        }
    }

    if config.keyword.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "keyword cannot be empty".to_string(),
        ));
    }

    HeaderValue::from_str(&config.user_agent).map_err(|_| {
        ConfigError::Validation(format!("Invalid user agent '{}'", config.user_agent))
    })?;

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}

/// Validates timeouts and the DNS rewrite rule
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be > 0ms".to_string(),
        ));
    }

    config.resolve_rule().map_err(ConfigError::Validation)?;

    Ok(())
}

fn validate_nagios_config(config: &NagiosConfig) -> Result<(), ConfigError> {
    if config.warning > config.critical {
        return Err(ConfigError::Validation(format!(
            "nagios warning ({}ms) must not exceed critical ({}ms)",
            config.warning, config.critical
        )));
    }

    Ok(())
}
