//! Session and route authorization core of the A-Pay client.
//!
//! The [`session::SessionStore`] owns the authenticated [`Identity`] and keeps
//! every open view converged on the same value. The [`guard::RouteGuard`]
//! decides, for each navigation, whether the protected tree renders, shows a
//! loading indicator, or redirects. [`guard::GuardRunner`] wires the two
//! together on a tokio task.

#![allow(missing_docs)]

pub mod bootstrap;
pub mod client;
pub mod errors;
pub mod guard;
pub mod navigation;
pub mod session;

pub use apay_model::{ChurchId, Identity, Role};
pub use bootstrap::{ClientContext, SyncTasks};
pub use client::{AuthClient, Credentials, HttpAuthClient, login_flow};
pub use errors::{AuthError, BootstrapError, PolicyError, StorageError};
pub use guard::{
    Decision, GuardPhase, GuardRunner, RedirectTicket, Render, RouteGuard,
    RoutePolicy, decide,
};
pub use navigation::{MemoryNavigator, NavigateMode, NavigationSnapshot, Navigator};
pub use session::{SessionState, SessionStore, SyncHandle};
pub use session::storage::{
    FileStorage, MemoryStorage, SessionStorage, StorageEvent, StorageEvents, ViewId,
};
