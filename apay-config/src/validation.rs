//! Structural checks and soft warnings for a loaded configuration.

use std::fmt;

use crate::constants::MIN_SYNC_INTERVAL;
use crate::loader::error::ConfigLoadError;
use crate::models::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Backend reached over plain HTTP on a non-local host
    InsecureServerUrl(String),
    /// Sync interval raised to the minimum
    SyncIntervalClamped,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::InsecureServerUrl(url) => {
                write!(f, "server url {url} is not using https")
            }
            ConfigWarning::SyncIntervalClamped => write!(
                f,
                "sync interval raised to {}",
                humantime::format_duration(MIN_SYNC_INTERVAL)
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigWarnings(pub Vec<ConfigWarning>);

impl ConfigWarnings {
    pub fn push(&mut self, warning: ConfigWarning) {
        self.0.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.0.iter()
    }
}

/// Reject configurations that can never work and normalize the ones that
/// only need adjusting.
pub fn validate(config: &mut ClientConfig) -> Result<ConfigWarnings, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    match config.server_url.scheme() {
        "https" => {}
        "http" => {
            let local = matches!(
                config.server_url.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("::1") | Some("[::1]")
            );
            if !local {
                warnings.push(ConfigWarning::InsecureServerUrl(
                    config.server_url.to_string(),
                ));
            }
        }
        other => {
            return Err(ConfigLoadError::UnsupportedScheme(other.to_string()));
        }
    }

    if config.session.key.trim().is_empty() {
        return Err(ConfigLoadError::EmptySessionKey);
    }

    if config.session.sync_interval < MIN_SYNC_INTERVAL {
        config.session.sync_interval = MIN_SYNC_INTERVAL;
        warnings.push(ConfigWarning::SyncIntervalClamped);
    }

    if config.request_timeout.is_zero() {
        return Err(ConfigLoadError::InvalidValue {
            key: "request_timeout".into(),
            value: "0s".into(),
        });
    }

    Ok(warnings)
}
