use std::sync::Arc;

use apay_config::constants::{DEFAULT_LOGIN_PATH, DEFAULT_SESSION_KEY};
use apay_model::{Identity, Role};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::SessionState;
use super::storage::{SessionStorage, StorageEvent};
use crate::errors::StorageError;
use crate::navigation::{NavigateMode, Navigator};

/// Session store backed by a storage medium and observable through a
/// `watch` channel.
///
/// Every operation fails soft: storage errors are logged and the store
/// degrades to "no identity" rather than returning an error.
#[derive(Clone, Debug)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
    state: Arc<watch::Sender<SessionState>>,
    navigator: Option<Arc<dyn Navigator>>,
    login_path: String,
}

/// Background cross-view sync task; stops when dropped.
#[derive(Debug)]
pub struct SyncHandle(JoinHandle<()>);

impl SyncHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_key(storage, DEFAULT_SESSION_KEY)
    }

    /// Store the identity under `key` instead of the default `usuario`.
    pub fn with_key(storage: Arc<dyn SessionStorage>, key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        let key = key.into();
        storage.watch_key(&key);
        Self {
            storage,
            key,
            state: Arc::new(state),
            navigator: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Navigator that `logout` sends to `login_path`.
    pub fn with_navigator(
        mut self,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        self.navigator = Some(navigator);
        self.login_path = login_path.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current in-memory state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Current in-memory identity.
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.state.borrow().has_role(role)
    }

    /// Read the persisted identity, publish it, and return it.
    ///
    /// A payload that does not decode (including one with a role outside the
    /// closed set) is removed from storage and reported as absent.
    pub async fn current_identity(&self) -> Option<Identity> {
        let identity = self.read_persisted().await;
        self.publish(identity.clone());
        identity
    }

    /// Persist `identity` and publish it to observers.
    pub async fn login(&self, identity: Identity) {
        match serde_json::to_string(&identity) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(&self.key, &raw).await {
                    log::error!("[SessionStore] Failed to persist identity: {e}");
                }
            }
            Err(e) => log::error!("[SessionStore] Failed to serialize identity: {e}"),
        }
        log::info!(
            "[SessionStore] {} logged in as {}",
            identity.username,
            identity.role
        );
        self.publish(Some(identity));
    }

    /// Forget the identity everywhere and go to the login page.
    pub async fn logout(&self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            log::error!("[SessionStore] Failed to clear persisted identity: {e}");
        }
        self.publish(None);
        log::info!("[SessionStore] logged out");
        if let Some(navigator) = &self.navigator {
            navigator.navigate(&self.login_path, NavigateMode::Push);
        }
    }

    /// Follow changes other views make to the persisted identity.
    ///
    /// The subscription is taken before this returns, so no change made after
    /// the call is missed.
    pub fn spawn_sync(&self) -> SyncHandle {
        let store = self.clone();
        let mut events = self.storage.subscribe();
        SyncHandle(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    // The medium holds the last write; corrupt payloads go on read
                    StorageEvent::Changed { key, .. } if key == store.key => {
                        store.current_identity().await;
                        log::debug!("[SessionStore] converged on outside change");
                    }
                    StorageEvent::Changed { .. } => {}
                    StorageEvent::Resync => {
                        store.current_identity().await;
                    }
                }
            }
            log::debug!("[SessionStore] storage closed, sync stopped");
        }))
    }

    async fn read_persisted(&self) -> Option<Identity> {
        match self.storage.get(&self.key).await {
            Ok(None) => None,
            Ok(Some(raw)) => match decode(&raw) {
                Some(identity) => Some(identity),
                None => {
                    self.discard_corrupt().await;
                    None
                }
            },
            Err(StorageError::CorruptedData(_)) => {
                log::warn!("[SessionStore] Persisted identity is not text; discarding");
                self.discard_corrupt().await;
                None
            }
            Err(e) => {
                log::warn!("[SessionStore] Could not read persisted identity: {e}");
                None
            }
        }
    }

    async fn discard_corrupt(&self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            log::debug!("[SessionStore] Could not remove corrupt identity: {e}");
        }
    }

    /// Returns whether observers were notified.
    fn publish(&self, identity: Option<Identity>) -> bool {
        let next = SessionState::from(identity);
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}

fn decode(raw: &str) -> Option<Identity> {
    match serde_json::from_str::<Identity>(raw) {
        Ok(identity) => Some(identity),
        Err(e) => {
            log::warn!("[SessionStore] Discarding unreadable identity: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemoryStorage;
    use apay_model::ChurchId;

    fn admin() -> Identity {
        Identity::new("root", Role::Admin, "Marta Gómez", ChurchId(1))
    }

    #[tokio::test]
    async fn starts_loading_until_first_read() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.state().is_loading());
        assert_eq!(store.current_identity().await, None);
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn login_is_visible_before_returning() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let mut rx = store.subscribe();
        store.login(admin()).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().identity(), Some(&admin()));
        assert!(store.has_role(Role::Admin));
        assert!(!store.has_role(Role::Bank));
    }

    #[tokio::test]
    async fn persisted_payload_uses_backend_field_names() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(Arc::new(storage.clone()));
        store.login(admin()).await;
        let raw = storage.get("usuario").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["usuario"], "root");
        assert_eq!(json["rol"], "admin");
        assert_eq!(json["nombreResponsable"], "Marta Gómez");
        assert_eq!(json["idIglesia"], 1);
    }

    #[tokio::test]
    async fn custom_key_is_respected() {
        let storage = MemoryStorage::new();
        let store = SessionStore::with_key(Arc::new(storage.clone()), "sesion");
        store.login(admin()).await;
        assert!(storage.get("sesion").await.unwrap().is_some());
        assert!(storage.get("usuario").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn republishing_same_identity_does_not_notify() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        store.login(admin()).await;
        let mut rx = store.subscribe();
        rx.mark_unchanged();
        store.current_identity().await;
        assert!(!rx.has_changed().unwrap());
    }
}
