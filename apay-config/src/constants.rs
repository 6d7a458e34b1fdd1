//! Environment variable names and built-in defaults.

use std::time::Duration;

pub const ENV_CONFIG_FILE: &str = "APAY_CONFIG";
pub const ENV_SERVER_URL: &str = "APAY_SERVER_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "APAY_REQUEST_TIMEOUT";
pub const ENV_SESSION_DIR: &str = "APAY_SESSION_DIR";
pub const ENV_SESSION_KEY: &str = "APAY_SESSION_KEY";
pub const ENV_SYNC_INTERVAL: &str = "APAY_SYNC_INTERVAL";
pub const ENV_NESTED_ROUTES: &str = "APAY_NESTED_ROUTES";
pub const ENV_LOGIN_PATH: &str = "APAY_LOGIN_PATH";
/// Per-role route lists: comma separated, the first entry is the landing page.
pub const ENV_ROUTES_ADMIN: &str = "APAY_ROUTES_ADMIN";
pub const ENV_ROUTES_MODULE: &str = "APAY_ROUTES_MODULO";
pub const ENV_ROUTES_BANK: &str = "APAY_ROUTES_BANCO";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Storage key the browser client used for the serialized identity.
pub const DEFAULT_SESSION_KEY: &str = "usuario";
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(500);
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_STORAGE_FALLBACK_DIR: &str = ".apay";
