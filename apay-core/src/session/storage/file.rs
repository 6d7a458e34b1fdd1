//! File-backed medium shared between client processes on one machine.
//!
//! Each key lives in its own file under the storage directory. Other
//! processes' writes are discovered by polling: [`FileStorage::spawn_watcher`]
//! compares every watched key against the last value this view saw, so the
//! poll interval is the synchronization interval.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{
    NOTICE_CAPACITY, SessionStorage, StorageEvent, StorageEvents, StorageNotice, ViewId,
};
use crate::errors::StorageError;

#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    view: ViewId,
    notices: broadcast::Sender<StorageNotice>,
    /// Last value this view read or wrote, per watched key
    seen: Mutex<HashMap<String, Option<String>>>,
    /// Serializes our own writes against the poller
    io: tokio::sync::Mutex<()>,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            root: root.into(),
            view: ViewId::next(),
            notices,
            seen: Mutex::new(HashMap::new()),
            io: tokio::sync::Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }

    async fn read_key(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StorageError::CorruptedData(key.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ReadFailed { path, source }),
        }
    }

    fn remember(&self, key: &str, value: Option<String>) {
        self.seen.lock().insert(key.to_string(), value);
    }

    /// Check watched keys once; returns how many outside changes were seen.
    pub async fn poll_once(&self) -> usize {
        let _io = self.io.lock().await;
        let keys: Vec<String> = self.seen.lock().keys().cloned().collect();
        let mut changes = 0;

        for key in keys {
            let current = match self.read_key(&key).await {
                Ok(value) => value,
                // An unreadable value still differs from a well-formed one
                Err(StorageError::CorruptedData(_)) => Some(String::new()),
                Err(e) => {
                    log::debug!("[FileStorage] poll skipped {key}: {e}");
                    continue;
                }
            };

            let changed = {
                let mut seen = self.seen.lock();
                let entry = seen.entry(key.clone()).or_default();
                if *entry != current {
                    *entry = current.clone();
                    true
                } else {
                    false
                }
            };

            if changed {
                changes += 1;
                log::debug!("[FileStorage] outside change to {key}");
                let _ = self.notices.send(StorageNotice {
                    origin: ViewId::EXTERNAL,
                    event: StorageEvent::Changed {
                        key,
                        value: current,
                    },
                });
            }
        }

        changes
    }

    /// Poll watched keys every `interval` until the storage is dropped.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(storage) = weak.upgrade() else {
                    break;
                };
                storage.poll_once().await;
            }
            log::debug!("[FileStorage] watcher stopped");
        })
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _io = self.io.lock().await;
        let value = self.read_key(key).await?;
        self.remember(key, value.clone());
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _io = self.io.lock().await;
        let path = self.path_for(key);
        let write_err = |source| StorageError::WriteFailed {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(write_err)?;

        // Write then rename so readers never see a torn value
        let tmp = path.with_extension(format!("json.{}.tmp", self.view));
        tokio::fs::write(&tmp, value).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(write_err)?;

        self.remember(key, Some(value.to_string()));
        log::debug!("[FileStorage] wrote {key} to {:?}", path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _io = self.io.lock().await;
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::debug!("[FileStorage] removed {key}"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(StorageError::WriteFailed { path, source }),
        }
        self.remember(key, None);
        Ok(())
    }

    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.notices.subscribe(), self.view)
    }

    fn watch_key(&self, key: &str) {
        self.seen.lock().entry(key.to_string()).or_insert(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());

        assert_eq!(storage.get("usuario").await.unwrap(), None);
        storage.set("usuario", "{\"a\":1}").await.unwrap();
        assert_eq!(
            storage.get("usuario").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(storage.path_for("usuario").exists());

        storage.remove("usuario").await.unwrap();
        assert_eq!(storage.get("usuario").await.unwrap(), None);
        storage.remove("usuario").await.unwrap();
    }

    #[tokio::test]
    async fn creates_missing_storage_directory() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("apay"));
        storage.set("usuario", "x").await.unwrap();
        assert_eq!(storage.get("usuario").await.unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn keys_map_to_safe_file_names() {
        let storage = FileStorage::new("/tmp/apay");
        assert_eq!(
            storage.path_for("../etc/passwd"),
            PathBuf::from("/tmp/apay/___etc_passwd.json")
        );
    }

    #[tokio::test]
    async fn own_writes_are_not_reported_by_poll() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.watch_key("usuario");
        storage.set("usuario", "mine").await.unwrap();
        assert_eq!(storage.poll_once().await, 0);
    }

    #[tokio::test]
    async fn outside_writes_are_reported_once() {
        let dir = TempDir::new().unwrap();
        let ours = FileStorage::new(dir.path());
        let theirs = FileStorage::new(dir.path());
        ours.watch_key("usuario");
        let mut events = ours.subscribe();

        theirs.set("usuario", "theirs").await.unwrap();
        assert_eq!(ours.poll_once().await, 1);
        assert_eq!(ours.poll_once().await, 0);

        assert_eq!(
            events.recv().await,
            Some(StorageEvent::Changed {
                key: "usuario".into(),
                value: Some("theirs".into()),
            })
        );
    }

    #[tokio::test]
    async fn non_utf8_file_is_corrupted_data() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path_for("usuario"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            storage.get("usuario").await,
            Err(StorageError::CorruptedData(_))
        ));
    }
}
