use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use apay_model::Role;
use url::Url;

use crate::constants::{
    DEFAULT_LOGIN_PATH, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_URL,
    DEFAULT_SESSION_KEY, DEFAULT_STORAGE_FALLBACK_DIR, DEFAULT_SYNC_INTERVAL,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the A-Pay backend
    pub server_url: Url,
    pub request_timeout: Duration,
    pub session: SessionConfig,
    pub routes: RoutesConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse(DEFAULT_SERVER_URL)
                .expect("default server url is valid"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session: SessionConfig::default(),
            routes: RoutesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory holding one file per storage key
    pub storage_dir: PathBuf,
    /// Storage key under which the serialized identity lives
    pub key: String,
    /// How often other views' writes are picked up
    pub sync_interval: Duration,
}

impl SessionConfig {
    pub fn default_storage_dir() -> PathBuf {
        directories::ProjectDirs::from("", "apay", "apay-client")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FALLBACK_DIR))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: Self::default_storage_dir(),
            key: DEFAULT_SESSION_KEY.to_string(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Raw route table. Invariants are checked when the guard builds its policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutesConfig {
    pub login_path: String,
    /// Allow `/admin/...` when `/admin` is permitted
    pub nested_routes: bool,
    pub roles: BTreeMap<Role, RoleRoutes>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        let roles = Role::ALL
            .into_iter()
            .map(|role| (role, RoleRoutes::single(format!("/{}", role.as_wire()))))
            .collect();
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            nested_routes: false,
            roles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRoutes {
    pub landing: String,
    pub allowed: Vec<String>,
}

impl RoleRoutes {
    pub fn single(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            landing: path.clone(),
            allowed: vec![path],
        }
    }

    /// Build from a list whose first entry is the landing page.
    pub fn from_list(paths: Vec<String>) -> Option<Self> {
        let landing = paths.first()?.clone();
        Some(Self {
            landing,
            allowed: paths,
        })
    }
}
