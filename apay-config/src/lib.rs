//! Shared configuration library for the A-Pay client.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then an optional `.env` file, then the process environment. Both the core
//! library and `apayctl` read their settings through [`ConfigLoader`].

#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{ClientConfig, RoleRoutes, RoutesConfig, SessionConfig};
pub use validation::{ConfigWarning, ConfigWarnings};
