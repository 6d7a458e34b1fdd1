use std::collections::BTreeSet;

use apay_config::{RoleRoutes, RoutesConfig};
use apay_model::Role;

use crate::errors::PolicyError;
use crate::navigation::normalize_path;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RoleEntry {
    landing: String,
    allowed: BTreeSet<String>,
}

/// Static role → routes table consulted by the guard.
///
/// Built once from configuration and never mutated. Construction enforces
/// that every role has an entry, that each landing page is reachable by its
/// own role and that no role is allowed onto the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    login_path: String,
    nested_routes: bool,
    /// Indexed by [`slot`]
    entries: [RoleEntry; 3],
}

fn slot(role: Role) -> usize {
    match role {
        Role::Admin => 0,
        Role::Module => 1,
        Role::Bank => 2,
    }
}

fn absolute(path: &str) -> Result<String, PolicyError> {
    if path.starts_with('/') {
        Ok(normalize_path(path))
    } else {
        Err(PolicyError::RelativePath(path.to_string()))
    }
}

fn matches(pattern: &str, path: &str, nested: bool) -> bool {
    if pattern == path {
        return true;
    }
    if !nested {
        return false;
    }
    pattern == "/"
        || path
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl Default for RoutePolicy {
    fn default() -> Self {
        let entry = |path: &str| RoleEntry {
            landing: path.to_string(),
            allowed: BTreeSet::from([path.to_string()]),
        };
        Self {
            login_path: apay_config::constants::DEFAULT_LOGIN_PATH.to_string(),
            nested_routes: false,
            entries: [entry("/admin"), entry("/modulo"), entry("/banco")],
        }
    }
}

impl RoutePolicy {
    pub fn from_config(config: &RoutesConfig) -> Result<Self, PolicyError> {
        let login_path = absolute(&config.login_path)?;
        let nested_routes = config.nested_routes;

        let entry = |role: Role| -> Result<RoleEntry, PolicyError> {
            let RoleRoutes { landing, allowed } = config
                .roles
                .get(&role)
                .ok_or(PolicyError::MissingRole(role))?;

            let landing = absolute(landing)?;
            let allowed = allowed
                .iter()
                .map(|path| absolute(path))
                .collect::<Result<BTreeSet<_>, _>>()?;

            if !allowed
                .iter()
                .any(|pattern| matches(pattern, &landing, nested_routes))
            {
                return Err(PolicyError::LandingNotAllowed { role, landing });
            }
            if allowed
                .iter()
                .any(|pattern| matches(pattern, &login_path, nested_routes))
            {
                return Err(PolicyError::LoginPathAllowed {
                    role,
                    login: login_path.clone(),
                });
            }

            Ok(RoleEntry { landing, allowed })
        };

        let policy = Self {
            entries: [entry(Role::Admin)?, entry(Role::Module)?, entry(Role::Bank)?],
            login_path: login_path.clone(),
            nested_routes,
        };
        log::debug!(
            "[RoutePolicy] login at {}, nested routes {}",
            policy.login_path,
            if nested_routes { "on" } else { "off" }
        );
        Ok(policy)
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn nested_routes(&self) -> bool {
        self.nested_routes
    }

    /// Where `role` is sent after login or when it strays.
    pub fn landing(&self, role: Role) -> &str {
        &self.entries[slot(role)].landing
    }

    pub fn allowed(&self, role: Role) -> impl Iterator<Item = &str> {
        self.entries[slot(role)].allowed.iter().map(String::as_str)
    }

    pub fn is_login(&self, path: &str) -> bool {
        normalize_path(path) == self.login_path
    }

    pub fn is_allowed(&self, role: Role, path: &str) -> bool {
        let path = normalize_path(path);
        self.entries[slot(role)]
            .allowed
            .iter()
            .any(|pattern| matches(pattern, &path, self.nested_routes))
    }
}
