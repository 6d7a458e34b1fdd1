use std::sync::Arc;

use apay_config::ClientConfig;
use apay_model::Identity;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::{Credentials, HttpAuthClient, login_flow};
use crate::errors::{AuthError, BootstrapError};
use crate::guard::{GuardRunner, Render, RoutePolicy};
use crate::navigation::MemoryNavigator;
use crate::session::storage::FileStorage;
use crate::session::{SessionStore, SyncHandle};

/// Everything one client view needs, wired from configuration.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub config: ClientConfig,
    pub storage: Arc<FileStorage>,
    pub store: SessionStore,
    pub policy: RoutePolicy,
    pub auth: HttpAuthClient,
    pub navigator: Arc<MemoryNavigator>,
}

/// Background tasks keeping a view in sync with other views.
#[derive(Debug)]
pub struct SyncTasks {
    watcher: JoinHandle<()>,
    _session: SyncHandle,
}

impl Drop for SyncTasks {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl ClientContext {
    pub fn from_config(config: ClientConfig) -> Result<Self, BootstrapError> {
        let policy = RoutePolicy::from_config(&config.routes)?;
        let auth = HttpAuthClient::new(config.server_url.clone(), config.request_timeout)?;
        let navigator = Arc::new(MemoryNavigator::new());
        let storage = Arc::new(FileStorage::new(config.session.storage_dir.clone()));
        let store = SessionStore::with_key(storage.clone(), config.session.key.clone())
            .with_navigator(navigator.clone(), policy.login_path());

        log::info!(
            "[ClientContext] Session stored under {:?} as '{}'",
            storage.root(),
            config.session.key
        );

        Ok(Self {
            config,
            storage,
            store,
            policy,
            auth,
            navigator,
        })
    }

    /// Poll the storage directory and follow other views' logins and logouts.
    pub fn start_sync(&self) -> SyncTasks {
        let session = self.store.spawn_sync();
        let watcher = self
            .storage
            .spawn_watcher(self.config.session.sync_interval);
        SyncTasks {
            watcher,
            _session: session,
        }
    }

    pub fn guard_runner(&self) -> (GuardRunner, watch::Receiver<Render>) {
        GuardRunner::new(self.policy.clone(), &self.store, self.navigator.clone())
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        login_flow(
            &self.auth,
            &self.store,
            self.navigator.as_ref(),
            &self.policy,
            credentials,
        )
        .await
    }

    pub async fn logout(&self) {
        self.store.logout().await;
    }
}
