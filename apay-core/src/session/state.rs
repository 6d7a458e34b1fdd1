use apay_model::{Identity, Role};

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Persisted identity not read yet
    #[default]
    Loading,

    /// No authenticated user
    Anonymous,

    /// User is authenticated
    Authenticated(Identity),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            SessionState::Loading | SessionState::Anonymous => None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.identity().is_some_and(|identity| identity.has_role(role))
    }
}

impl From<Option<Identity>> for SessionState {
    fn from(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => SessionState::Authenticated(identity),
            None => SessionState::Anonymous,
        }
    }
}
