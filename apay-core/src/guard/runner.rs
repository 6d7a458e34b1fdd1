use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::machine::{RedirectTicket, Render, RouteGuard};
use super::policy::RoutePolicy;
use crate::navigation::{NavigateMode, NavigationSnapshot, Navigator};
use crate::session::{SessionState, SessionStore};

/// Drives a [`RouteGuard`] from live session and navigation state.
///
/// The render output is published on a `watch` channel; redirects go through
/// the navigator, at most one per verdict.
#[derive(Debug)]
pub struct GuardRunner {
    guard: RouteGuard,
    session: watch::Receiver<SessionState>,
    navigation: watch::Receiver<NavigationSnapshot>,
    navigator: Arc<dyn Navigator>,
    render: watch::Sender<Render>,
}

impl GuardRunner {
    pub fn new(
        policy: RoutePolicy,
        store: &SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> (Self, watch::Receiver<Render>) {
        let (render, render_rx) = watch::channel(Render::Nothing);
        let runner = Self {
            guard: RouteGuard::new(policy),
            session: store.subscribe(),
            navigation: navigator.subscribe(),
            navigator,
            render,
        };
        (runner, render_rx)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until the session store or the navigator goes away.
    pub async fn run(mut self) {
        loop {
            self.evaluate();
            tokio::select! {
                changed = self.session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = self.navigation.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        log::debug!("[GuardRunner] inputs closed, stopping");
    }

    fn evaluate(&mut self) {
        loop {
            let ticket = self.decide();
            if self.settle(ticket) {
                return;
            }
        }
    }

    /// Step the guard on the latest inputs, showing the loading indicator
    /// while a fresh verdict is being produced.
    fn decide(&mut self) -> Option<RedirectTicket> {
        let session = self.session.borrow_and_update().clone();
        let navigation = self.navigation.borrow_and_update().clone();

        if self.guard.needs_evaluation(&session, &navigation) {
            self.publish(Render::Loading);
        }
        self.guard.step(&session, &navigation)
    }

    /// Publish the verdict and perform its redirect. Returns `false` when the
    /// inputs moved in the meantime and the verdict must be decided again.
    fn settle(&mut self, ticket: Option<RedirectTicket>) -> bool {
        if self.inputs_changed() {
            if let Some(ticket) = ticket {
                log::debug!(
                    "[GuardRunner] discarding stale redirect #{} to {}",
                    ticket.generation,
                    ticket.target
                );
                self.guard.forget(&ticket);
            }
            return false;
        }

        self.publish(self.guard.render());
        if let Some(ticket) = ticket
            && self.guard.is_current(&ticket)
        {
            log::info!("[GuardRunner] redirecting to {}", ticket.target);
            self.navigator.navigate(&ticket.target, NavigateMode::Push);
        }
        true
    }

    fn inputs_changed(&self) -> bool {
        self.session.has_changed().unwrap_or(false)
            || self.navigation.has_changed().unwrap_or(false)
    }

    fn publish(&self, render: Render) {
        self.render.send_if_modified(|current| {
            let changed = *current != render;
            *current = render;
            changed
        });
    }
}
