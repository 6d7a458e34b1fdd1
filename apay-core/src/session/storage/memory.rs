use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{
    NOTICE_CAPACITY, SessionStorage, StorageEvent, StorageEvents, StorageNotice, ViewId,
};
use crate::errors::StorageError;

#[derive(Debug)]
struct Medium {
    entries: RwLock<HashMap<String, String>>,
    notices: broadcast::Sender<StorageNotice>,
}

/// Process-local medium. Each handle returned by [`MemoryStorage::view`]
/// behaves like a separate browser tab on the same origin.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    medium: Arc<Medium>,
    view: ViewId,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            medium: Arc::new(Medium {
                entries: RwLock::new(HashMap::new()),
                notices,
            }),
            view: ViewId::next(),
        }
    }

    /// Another view over the same medium.
    pub fn view(&self) -> Self {
        Self {
            medium: Arc::clone(&self.medium),
            view: ViewId::next(),
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.view
    }

    fn notify(&self, key: &str, value: Option<String>) {
        // No receivers is fine
        let _ = self.medium.notices.send(StorageNotice {
            origin: self.view,
            event: StorageEvent::Changed {
                key: key.to_string(),
                value,
            },
        });
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.medium.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Notify under the lock so notices arrive in write order
        let mut entries = self.medium.entries.write();
        let previous = entries.insert(key.to_string(), value.to_string());
        if previous.as_deref() != Some(value) {
            self.notify(key, Some(value.to_string()));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.medium.entries.write();
        if entries.remove(key).is_some() {
            self.notify(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.medium.notices.subscribe(), self.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn views_share_entries() {
        let first = MemoryStorage::new();
        let second = first.view();
        first.set("usuario", "{}").await.unwrap();
        assert_eq!(second.get("usuario").await.unwrap().as_deref(), Some("{}"));
        second.remove("usuario").await.unwrap();
        assert_eq!(first.get("usuario").await.unwrap(), None);
    }

    #[tokio::test]
    async fn writer_is_not_notified_of_its_own_changes() {
        let first = MemoryStorage::new();
        let second = first.view();
        let mut own = first.subscribe();
        let mut other = second.subscribe();

        first.set("usuario", "a").await.unwrap();

        assert_eq!(
            other.recv().await,
            Some(StorageEvent::Changed {
                key: "usuario".into(),
                value: Some("a".into()),
            })
        );
        let nothing = tokio::time::timeout(Duration::from_millis(50), own.recv()).await;
        assert!(nothing.is_err(), "own write must not be echoed back");
    }

    #[tokio::test]
    async fn unchanged_writes_do_not_notify() {
        let first = MemoryStorage::new();
        let second = first.view();
        first.set("usuario", "a").await.unwrap();
        let mut other = second.subscribe();

        first.set("usuario", "a").await.unwrap();
        first.remove("missing").await.unwrap();

        let nothing = tokio::time::timeout(Duration::from_millis(50), other.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_notify_in_write_order() {
        let medium = MemoryStorage::new();
        let observer = medium.view();
        let mut events = observer.subscribe();

        let writers: Vec<_> = (0..2)
            .map(|writer| {
                let view = medium.view();
                tokio::spawn(async move {
                    for i in 0..20 {
                        view.set("usuario", &format!("{writer}-{i}")).await.unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let mut last_seen = None;
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(50), events.recv()).await
        {
            if let StorageEvent::Changed { value, .. } = event {
                last_seen = value;
            }
        }
        assert_eq!(last_seen, observer.get("usuario").await.unwrap());
    }

    #[tokio::test]
    async fn lagging_subscriber_gets_a_single_resync() {
        let first = MemoryStorage::new();
        let second = first.view();
        let mut other = second.subscribe();

        for i in 0..(NOTICE_CAPACITY + 10) {
            first.set("usuario", &i.to_string()).await.unwrap();
        }

        assert_eq!(other.recv().await, Some(StorageEvent::Resync));
    }
}
