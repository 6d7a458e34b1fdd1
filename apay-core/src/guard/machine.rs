use apay_model::Identity;

use super::decision::{Decision, decide};
use super::policy::RoutePolicy;
use crate::navigation::NavigationSnapshot;
use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardPhase {
    /// Navigation not ready yet
    Init,
    /// Waiting for the session, or a new input is being decided
    Evaluating,
    Authorized,
    Unauthorized { redirect: String },
}

/// What the protected view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Nothing,
    Loading,
    Children,
}

/// Permission to perform one redirect, valid only while `generation` is the
/// guard's latest evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTicket {
    pub target: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Evaluated {
    identity: Option<Identity>,
    path: String,
    decision: Decision,
}

/// Guard state machine for one protected view.
///
/// Stepping with inputs already decided restores the earlier verdict without
/// issuing another redirect.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    policy: RoutePolicy,
    phase: GuardPhase,
    generation: u64,
    last: Option<Evaluated>,
}

impl RouteGuard {
    pub fn new(policy: RoutePolicy) -> Self {
        Self {
            policy,
            phase: GuardPhase::Init,
            generation: 0,
            last: None,
        }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub fn phase(&self) -> &GuardPhase {
        &self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn render(&self) -> Render {
        match self.phase {
            GuardPhase::Init | GuardPhase::Unauthorized { .. } => Render::Nothing,
            GuardPhase::Evaluating => Render::Loading,
            GuardPhase::Authorized => Render::Children,
        }
    }

    /// Whether `step` with these inputs would produce a fresh verdict.
    pub fn needs_evaluation(
        &self,
        session: &SessionState,
        navigation: &NavigationSnapshot,
    ) -> bool {
        match (navigation.resolved_path(), session) {
            (None, _) | (_, SessionState::Loading) => false,
            (Some(path), session) => !self.already_decided(session.identity(), path),
        }
    }

    /// Advance the machine. Returns a ticket when a new unauthorized verdict
    /// requires a redirect.
    pub fn step(
        &mut self,
        session: &SessionState,
        navigation: &NavigationSnapshot,
    ) -> Option<RedirectTicket> {
        let Some(path) = navigation.resolved_path() else {
            self.phase = GuardPhase::Init;
            return None;
        };
        if session.is_loading() {
            self.phase = GuardPhase::Evaluating;
            return None;
        }

        let identity = session.identity();
        if let Some(last) = &self.last
            && self.already_decided(identity, path)
        {
            self.phase = phase_for(&last.decision);
            return None;
        }

        self.generation += 1;
        self.phase = GuardPhase::Evaluating;
        let decision = decide(identity, path, &self.policy);
        log::debug!(
            "[RouteGuard] #{} {} at {path}: {decision:?}",
            self.generation,
            identity.map_or("anonymous", |identity| identity.username.as_str()),
        );

        self.phase = phase_for(&decision);
        let ticket = decision.redirect_target().map(|target| RedirectTicket {
            target: target.to_string(),
            generation: self.generation,
        });
        self.last = Some(Evaluated {
            identity: identity.cloned(),
            path: path.to_string(),
            decision,
        });
        ticket
    }

    /// A ticket is honoured only if no later evaluation superseded it.
    pub fn is_current(&self, ticket: &RedirectTicket) -> bool {
        ticket.generation == self.generation
            && matches!(&self.phase, GuardPhase::Unauthorized { redirect } if *redirect == ticket.target)
    }

    /// Drop the verdict behind a ticket that was never acted on, so the same
    /// inputs produce a fresh ticket next time.
    pub fn forget(&mut self, ticket: &RedirectTicket) {
        if ticket.generation == self.generation {
            self.last = None;
        }
    }

    fn already_decided(&self, identity: Option<&Identity>, path: &str) -> bool {
        self.last
            .as_ref()
            .is_some_and(|last| last.identity.as_ref() == identity && last.path == path)
    }
}

fn phase_for(decision: &Decision) -> GuardPhase {
    match decision {
        Decision::Authorized => GuardPhase::Authorized,
        Decision::Redirect(target) => GuardPhase::Unauthorized {
            redirect: target.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apay_model::{ChurchId, Role};

    fn admin() -> SessionState {
        SessionState::Authenticated(Identity::new(
            "root",
            Role::Admin,
            "Responsable",
            ChurchId(1),
        ))
    }

    #[test]
    fn waits_for_navigation() {
        let mut guard = RouteGuard::new(RoutePolicy::default());
        assert_eq!(guard.step(&admin(), &NavigationSnapshot::pending()), None);
        assert_eq!(guard.phase(), &GuardPhase::Init);
        assert_eq!(guard.render(), Render::Nothing);
    }

    #[test]
    fn shows_loading_while_session_is_unknown() {
        let mut guard = RouteGuard::new(RoutePolicy::default());
        let at_admin = NavigationSnapshot::at("/admin");
        assert_eq!(guard.step(&SessionState::Loading, &at_admin), None);
        assert_eq!(guard.render(), Render::Loading);
        assert!(!guard.needs_evaluation(&SessionState::Loading, &at_admin));
    }

    #[test]
    fn unauthorized_issues_one_ticket() {
        let mut guard = RouteGuard::new(RoutePolicy::default());
        let at_admin = NavigationSnapshot::at("/admin");

        let ticket = guard.step(&SessionState::Anonymous, &at_admin).unwrap();
        assert_eq!(ticket.target, "/login");
        assert!(guard.is_current(&ticket));
        assert_eq!(guard.render(), Render::Nothing);

        assert!(!guard.needs_evaluation(&SessionState::Anonymous, &at_admin));
        assert_eq!(guard.step(&SessionState::Anonymous, &at_admin), None);
        assert_eq!(guard.generation(), 1);
    }

    #[test]
    fn later_input_supersedes_ticket() {
        let mut guard = RouteGuard::new(RoutePolicy::default());
        let stale = guard
            .step(&SessionState::Anonymous, &NavigationSnapshot::at("/banco"))
            .unwrap();
        assert_eq!(guard.step(&admin(), &NavigationSnapshot::at("/admin")), None);
        assert!(!guard.is_current(&stale));
        assert_eq!(guard.render(), Render::Children);
    }

    #[test]
    fn forgotten_ticket_is_reissued_for_the_same_input() {
        let mut guard = RouteGuard::new(RoutePolicy::default());
        let at_admin = NavigationSnapshot::at("/admin");
        let dropped = guard.step(&SessionState::Anonymous, &at_admin).unwrap();
        guard.forget(&dropped);

        let again = guard.step(&SessionState::Anonymous, &at_admin).unwrap();
        assert_eq!(again.target, "/login");
        assert!(guard.is_current(&again));
        assert!(!guard.is_current(&dropped));

        // Only the latest ticket can clear the cached verdict
        guard.forget(&dropped);
        assert_eq!(guard.step(&SessionState::Anonymous, &at_admin), None);
    }

    #[test]
    fn returning_to_a_decided_input_restores_its_verdict() {
        let mut guard = RouteGuard::new(RoutePolicy::default());
        let at_admin = NavigationSnapshot::at("/admin");
        guard.step(&admin(), &at_admin);
        guard.step(&admin(), &NavigationSnapshot::pending());
        assert_eq!(guard.phase(), &GuardPhase::Init);
        assert_eq!(guard.step(&admin(), &at_admin), None);
        assert_eq!(guard.phase(), &GuardPhase::Authorized);
    }
}
