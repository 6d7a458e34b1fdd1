use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("invalid server URL '{value}'")]
    InvalidServerUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported server URL scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("session key must not be empty")]
    EmptySessionKey,
    #[error("failed to read config file {path}")]
    ConfigFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
