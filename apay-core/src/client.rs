//! Backend authentication and the login flow built on it.

use std::fmt;
use std::time::Duration;

use apay_model::{ApiErrorBody, Identity, LoginRequest};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::errors::AuthError;
use crate::guard::RoutePolicy;
use crate::navigation::{NavigateMode, Navigator};
use crate::session::SessionStore;

/// Message shown when the backend rejects a login without saying why.
pub const LOGIN_FAILED_FALLBACK: &str = "Error al iniciar sesión";

/// Username and password typed into the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields are required.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }

    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
}

/// `POST /login` against the A-Pay backend.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: Url,
}

impl HttpAuthClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AuthError::Connection)?;

        log::info!("[HttpAuthClient] Using backend at {}", base_url);
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let url = self.login_url();
        log::debug!("[HttpAuthClient] POST {} as {}", url, credentials.username);

        let response = self
            .client
            .post(&url)
            .json(&credentials.to_request())
            .send()
            .await
            .map_err(AuthError::Connection)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::Connection)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| LOGIN_FAILED_FALLBACK.to_string());
            log::warn!("[HttpAuthClient] Login rejected with {status}: {message}");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<Identity>(&body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}

/// Log in through `client` and land on the role's home page.
///
/// On success the identity is persisted and published before navigation, so
/// the guard at the landing page already sees it.
pub async fn login_flow(
    client: &dyn AuthClient,
    store: &SessionStore,
    navigator: &dyn Navigator,
    policy: &RoutePolicy,
    credentials: &Credentials,
) -> Result<Identity, AuthError> {
    credentials.validate()?;
    let identity = client.authenticate(credentials).await?;
    store.login(identity.clone()).await;
    navigator.navigate(policy.landing(identity.role), NavigateMode::Replace);
    Ok(identity)
}
