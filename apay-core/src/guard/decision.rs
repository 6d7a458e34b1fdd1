use apay_model::Identity;

use super::policy::RoutePolicy;
use crate::navigation::normalize_path;

/// Verdict for one (identity, path) pair. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized,
    Redirect(String),
}

impl Decision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Decision::Authorized)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Decision::Authorized => None,
            Decision::Redirect(target) => Some(target),
        }
    }
}

/// Decide whether `identity` may view `path`.
///
/// Rules apply in order:
/// 1. anonymous on the login page: authorized
/// 2. anonymous anywhere else: redirect to login
/// 3. authenticated on the login page: redirect to the role's landing page
/// 4. authenticated on an allowed path: authorized
/// 5. authenticated anywhere else: redirect to the role's landing page
pub fn decide(identity: Option<&Identity>, path: &str, policy: &RoutePolicy) -> Decision {
    let path = normalize_path(path);
    let on_login = policy.is_login(&path);

    match identity {
        None if on_login => Decision::Authorized,
        None => Decision::Redirect(policy.login_path().to_string()),
        Some(identity) if on_login => {
            Decision::Redirect(policy.landing(identity.role).to_string())
        }
        Some(identity) if policy.is_allowed(identity.role, &path) => Decision::Authorized,
        Some(identity) => Decision::Redirect(policy.landing(identity.role).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apay_model::{ChurchId, Role};

    fn user(role: Role) -> Identity {
        Identity::new("u", role, "Responsable", ChurchId(7))
    }

    #[test]
    fn anonymous_only_sees_login() {
        let policy = RoutePolicy::default();
        assert_eq!(decide(None, "/login", &policy), Decision::Authorized);
        assert_eq!(
            decide(None, "/admin", &policy),
            Decision::Redirect("/login".into())
        );
        assert_eq!(decide(None, "/", &policy), Decision::Redirect("/login".into()));
    }

    #[test]
    fn authenticated_users_leave_login_for_their_landing() {
        let policy = RoutePolicy::default();
        for role in Role::ALL {
            assert_eq!(
                decide(Some(&user(role)), "/login", &policy),
                Decision::Redirect(policy.landing(role).into())
            );
        }
    }

    #[test]
    fn root_redirects_to_landing() {
        let policy = RoutePolicy::default();
        let decision = decide(Some(&user(Role::Module)), "/", &policy);
        assert_eq!(decision.redirect_target(), Some("/modulo"));
    }

    #[test]
    fn query_string_does_not_affect_the_verdict() {
        let policy = RoutePolicy::default();
        assert!(decide(Some(&user(Role::Bank)), "/banco?qr=15", &policy).is_authorized());
    }
}
