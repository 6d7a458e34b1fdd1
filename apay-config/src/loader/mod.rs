//! Layered configuration loading.

pub mod error;
mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use apay_model::Role;
use url::Url;

use crate::constants::*;
use crate::models::{ClientConfig, RoleRoutes};
use crate::util::{parse_bool, parse_csv, parse_duration};
use crate::validation::{self, ConfigWarnings};
use error::ConfigLoadError;
use file::{FileConfig, FileRoleRoutes};

/// A validated configuration together with the soft warnings produced
/// while loading it.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: ClientConfig,
    pub warnings: ConfigWarnings,
}

/// Builder over the configuration sources.
///
/// Precedence, lowest first: defaults, TOML file, `.env` file, process
/// environment, explicit overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    process_env: bool,
    overrides: BTreeMap<String, String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_file: None,
            env_file: None,
            process_env: true,
            overrides: BTreeMap::new(),
        }
    }

    /// A loader that ignores the process environment.
    pub fn isolated() -> Self {
        Self {
            process_env: false,
            ..Self::new()
        }
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env = self.collect_env()?;
        let mut config = ClientConfig::default();

        let file_path = self
            .config_file
            .clone()
            .or_else(|| env.get(ENV_CONFIG_FILE).map(PathBuf::from));
        if let Some(path) = file_path {
            let file = read_file(&path)?;
            apply_file(&mut config, file)?;
            tracing::debug!(path = %path.display(), "applied config file");
        }

        apply_env(&mut config, &env)?;

        let warnings = validation::validate(&mut config)?;
        for warning in warnings.iter() {
            tracing::warn!("{warning}");
        }

        Ok(ConfigLoad { config, warnings })
    }

    fn collect_env(&self) -> Result<BTreeMap<String, String>, ConfigLoadError> {
        let mut env = BTreeMap::new();
        if let Some(path) = &self.env_file {
            for item in dotenvy::from_path_iter(path)? {
                let (key, value) = item?;
                env.insert(key, value);
            }
        }
        if self.process_env {
            env.extend(std::env::vars().filter(|(key, _)| key.starts_with("APAY_")));
        }
        env.extend(self.overrides.clone());
        Ok(env)
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        ConfigLoadError::ConfigFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    toml::from_str(&raw).map_err(|source| ConfigLoadError::ConfigFileParse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_url(value: &str) -> Result<Url, ConfigLoadError> {
    Url::parse(value.trim()).map_err(|source| ConfigLoadError::InvalidServerUrl {
        value: value.to_string(),
        source,
    })
}

fn duration_for(key: &str, value: &str) -> Result<Duration, ConfigLoadError> {
    parse_duration(value).ok_or_else(|| ConfigLoadError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn file_role_routes(routes: FileRoleRoutes) -> RoleRoutes {
    let allowed = if routes.allowed.is_empty() {
        vec![routes.landing.clone()]
    } else {
        routes.allowed
    };
    RoleRoutes {
        landing: routes.landing,
        allowed,
    }
}

fn apply_file(config: &mut ClientConfig, file: FileConfig) -> Result<(), ConfigLoadError> {
    if let Some(url) = file.server_url {
        config.server_url = parse_url(&url)?;
    }
    if let Some(timeout) = file.request_timeout {
        config.request_timeout = duration_for("request_timeout", &timeout)?;
    }

    if let Some(dir) = file.session.dir {
        config.session.storage_dir = PathBuf::from(dir);
    }
    if let Some(key) = file.session.key {
        config.session.key = key;
    }
    if let Some(interval) = file.session.sync_interval {
        config.session.sync_interval = duration_for("session.sync_interval", &interval)?;
    }

    let routes = file.routes;
    if let Some(login) = routes.login {
        config.routes.login_path = login;
    }
    if let Some(nested) = routes.nested {
        config.routes.nested_routes = nested;
    }
    for (role, entry) in [
        (Role::Admin, routes.admin),
        (Role::Module, routes.modulo),
        (Role::Bank, routes.banco),
    ] {
        if let Some(entry) = entry {
            config.routes.roles.insert(role, file_role_routes(entry));
        }
    }
    Ok(())
}

fn apply_env(
    config: &mut ClientConfig,
    env: &BTreeMap<String, String>,
) -> Result<(), ConfigLoadError> {
    if let Some(url) = env.get(ENV_SERVER_URL) {
        config.server_url = parse_url(url)?;
    }
    if let Some(timeout) = env.get(ENV_REQUEST_TIMEOUT) {
        config.request_timeout = duration_for(ENV_REQUEST_TIMEOUT, timeout)?;
    }
    if let Some(dir) = env.get(ENV_SESSION_DIR) {
        config.session.storage_dir = PathBuf::from(dir);
    }
    if let Some(key) = env.get(ENV_SESSION_KEY) {
        config.session.key = key.clone();
    }
    if let Some(interval) = env.get(ENV_SYNC_INTERVAL) {
        config.session.sync_interval = duration_for(ENV_SYNC_INTERVAL, interval)?;
    }
    if let Some(raw) = env.get(ENV_NESTED_ROUTES) {
        config.routes.nested_routes =
            parse_bool(raw).ok_or_else(|| ConfigLoadError::InvalidValue {
                key: ENV_NESTED_ROUTES.to_string(),
                value: raw.clone(),
            })?;
    }
    if let Some(login) = env.get(ENV_LOGIN_PATH) {
        config.routes.login_path = login.trim().to_string();
    }
    for (role, key) in [
        (Role::Admin, ENV_ROUTES_ADMIN),
        (Role::Module, ENV_ROUTES_MODULE),
        (Role::Bank, ENV_ROUTES_BANK),
    ] {
        if let Some(raw) = env.get(key) {
            let routes = RoleRoutes::from_list(parse_csv(raw)).ok_or_else(|| {
                ConfigLoadError::InvalidValue {
                    key: key.to_string(),
                    value: raw.clone(),
                }
            })?;
            config.routes.roles.insert(role, routes);
        }
    }
    Ok(())
}
