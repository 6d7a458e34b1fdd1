//! On-disk TOML layout. Every field is optional so a file only needs to
//! mention what it overrides.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub server_url: Option<String>,
    pub request_timeout: Option<String>,
    #[serde(default)]
    pub session: FileSession,
    #[serde(default)]
    pub routes: FileRoutes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileSession {
    pub dir: Option<String>,
    pub key: Option<String>,
    pub sync_interval: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileRoutes {
    pub login: Option<String>,
    pub nested: Option<bool>,
    pub admin: Option<FileRoleRoutes>,
    #[serde(alias = "module")]
    pub modulo: Option<FileRoleRoutes>,
    #[serde(alias = "bank")]
    pub banco: Option<FileRoleRoutes>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileRoleRoutes {
    pub landing: String,
    #[serde(default)]
    pub allowed: Vec<String>,
}
