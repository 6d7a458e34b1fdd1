//! Who is logged in.
//!
//! [`SessionStore`] is the single source of truth for the authenticated
//! identity: persisted through a [`storage::SessionStorage`] medium, held in a
//! `watch` channel for in-process observers, and kept in sync with writes
//! made by other views.

mod state;
pub mod storage;
mod store;

pub use state::SessionState;
pub use store::{SessionStore, SyncHandle};
