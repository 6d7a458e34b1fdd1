//! Route authorization guard.
//!
//! [`decide`] is the pure rule table, [`RouteGuard`] the state machine that
//! turns verdicts into render output and redirect tickets, and
//! [`GuardRunner`] the task that feeds it live session and navigation state.

mod decision;
mod machine;
mod policy;
mod runner;

pub use decision::{Decision, decide};
pub use machine::{GuardPhase, RedirectTicket, Render, RouteGuard};
pub use policy::RoutePolicy;
pub use runner::GuardRunner;
