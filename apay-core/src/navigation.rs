//! Navigation collaborator.
//!
//! The guard never owns the router; it reads the current path and readiness
//! through [`Navigator`] and asks it to move elsewhere.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

/// Current location as seen by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationSnapshot {
    pub path: Option<String>,
    /// False until the navigation subsystem has resolved its target
    pub ready: bool,
}

impl NavigationSnapshot {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn at(path: &str) -> Self {
        Self {
            path: Some(normalize_path(path)),
            ready: true,
        }
    }

    /// The path, only once navigation is ready.
    pub fn resolved_path(&self) -> Option<&str> {
        if self.ready { self.path.as_deref() } else { None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateMode {
    /// Add a history entry
    Push,
    /// Overwrite the current history entry
    Replace,
}

pub trait Navigator: Send + Sync + fmt::Debug {
    fn snapshot(&self) -> NavigationSnapshot;

    fn subscribe(&self) -> watch::Receiver<NavigationSnapshot>;

    fn navigate(&self, path: &str, mode: NavigateMode);
}

/// Strip query and fragment, force a leading slash and drop a trailing one.
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let trimmed = raw[..end].trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// In-process router with a history stack.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: watch::Sender<NavigationSnapshot>,
    history: Mutex<Vec<String>>,
    navigations: Mutex<Vec<(String, NavigateMode)>>,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNavigator {
    /// A navigator that is not ready yet.
    pub fn new() -> Self {
        let (state, _) = watch::channel(NavigationSnapshot::pending());
        Self {
            state,
            history: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    /// A ready navigator already showing `path`.
    pub fn at(path: &str) -> Arc<Self> {
        let navigator = Self::new();
        let snapshot = NavigationSnapshot::at(path);
        navigator.history.lock().extend(snapshot.path.clone());
        navigator.state.send_replace(snapshot);
        Arc::new(navigator)
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.ready != ready;
            snapshot.ready = ready;
            changed
        });
    }

    /// User-initiated navigation, e.g. following a link.
    pub fn visit(&self, path: &str) {
        self.apply(path, NavigateMode::Push);
    }

    pub fn current_path(&self) -> Option<String> {
        self.state.borrow().path.clone()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    /// Every `navigate` call received, in order.
    pub fn navigations(&self) -> Vec<(String, NavigateMode)> {
        self.navigations.lock().clone()
    }

    fn apply(&self, path: &str, mode: NavigateMode) {
        let path = normalize_path(path);
        {
            let mut history = self.history.lock();
            match mode {
                NavigateMode::Replace if !history.is_empty() => {
                    if let Some(last) = history.last_mut() {
                        *last = path.clone();
                    }
                }
                _ => history.push(path.clone()),
            }
        }
        self.state.send_if_modified(|snapshot| {
            let next = NavigationSnapshot {
                path: Some(path),
                ready: true,
            };
            if *snapshot == next {
                false
            } else {
                *snapshot = next;
                true
            }
        });
    }
}

impl Navigator for MemoryNavigator {
    fn snapshot(&self) -> NavigationSnapshot {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<NavigationSnapshot> {
        self.state.subscribe()
    }

    fn navigate(&self, path: &str, mode: NavigateMode) {
        log::debug!("[Navigator] {mode:?} -> {path}");
        self.navigations.lock().push((normalize_path(path), mode));
        self.apply(path, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(normalize_path("/admin/?tab=qr#top"), "/admin");
        assert_eq!(normalize_path("banco"), "/banco");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/?next=/admin"), "/");
    }

    #[test]
    fn pending_snapshot_has_no_resolved_path() {
        let mut snapshot = NavigationSnapshot::at("/admin");
        snapshot.ready = false;
        assert_eq!(snapshot.resolved_path(), None);
        assert_eq!(NavigationSnapshot::at("/admin").resolved_path(), Some("/admin"));
    }

    #[test]
    fn push_and_replace_update_history() {
        let navigator = MemoryNavigator::at("/login");
        navigator.navigate("/admin", NavigateMode::Push);
        navigator.navigate("/modulo", NavigateMode::Replace);
        assert_eq!(navigator.history(), ["/login", "/modulo"]);
        assert_eq!(navigator.current_path().as_deref(), Some("/modulo"));
        assert_eq!(navigator.navigations().len(), 2);
    }

    #[test]
    fn navigating_to_current_path_does_not_notify() {
        let navigator = MemoryNavigator::at("/admin");
        let mut rx = navigator.subscribe();
        rx.mark_unchanged();
        navigator.navigate("/admin", NavigateMode::Push);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn becoming_ready_notifies_subscribers() {
        let navigator = MemoryNavigator::new();
        let mut rx = navigator.subscribe();
        rx.mark_unchanged();
        navigator.set_ready(true);
        assert!(rx.has_changed().unwrap());
    }
}
