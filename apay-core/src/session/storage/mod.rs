//! Durable key-value media backing the session store.
//!
//! A medium behaves like browser local storage: string values under string
//! keys, shared by every open view of the client, with change notifications
//! delivered only to the views that did not make the change.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::errors::StorageError;

/// Capacity of the change notification channel; slower subscribers get a
/// single [`StorageEvent::Resync`] instead of the backlog.
pub(crate) const NOTICE_CAPACITY: usize = 64;

/// Identity of one open view of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

static NEXT_VIEW: AtomicU64 = AtomicU64::new(1);

impl ViewId {
    /// Writer outside this process (another client instance, an operator).
    pub const EXTERNAL: ViewId = ViewId(0);

    pub fn next() -> Self {
        ViewId(NEXT_VIEW.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// `key` now holds `value` (`None` when removed)
    Changed { key: String, value: Option<String> },
    /// Notifications were dropped; re-read everything of interest
    Resync,
}

/// A change notification tagged with the view that caused it.
#[derive(Debug, Clone)]
pub struct StorageNotice {
    pub origin: ViewId,
    pub event: StorageEvent,
}

/// Change notifications as seen by one view.
#[derive(Debug)]
pub struct StorageEvents {
    receiver: broadcast::Receiver<StorageNotice>,
    view: ViewId,
}

impl StorageEvents {
    pub fn new(receiver: broadcast::Receiver<StorageNotice>, view: ViewId) -> Self {
        Self { receiver, view }
    }

    /// Next change made by some other view, or `None` once the medium is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(notice) if notice.origin == self.view => continue,
                Ok(notice) => return Some(notice.event),
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("[{}] {skipped} storage notices coalesced", self.view);
                    return Some(StorageEvent::Resync);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
pub trait SessionStorage: Send + Sync + fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn subscribe(&self) -> StorageEvents;

    /// Ask the medium to report outside changes to `key`. Media that notify
    /// for every key can ignore this.
    fn watch_key(&self, _key: &str) {}
}
