//! Process-wide auth state as an explicitly constructed controller: current
//! user plus a loading flag, fed by the token in the settings store and the
//! `/auth/me/` endpoint. A rejected token logs the user out silently.

pub mod commands;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::models::User;
use crate::settings::SettingsStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSnapshot {
    pub loading: bool,
    pub authenticated: bool,
    pub user: Option<User>,
    /// Route the frontend asked for before being bounced to login; threaded
    /// through so login can return the user there.
    pub pending_location: Option<String>,
}

#[derive(Debug, Default)]
struct AuthState {
    loading: bool,
    user: Option<User>,
    pending_location: Option<String>,
}

#[derive(Clone)]
pub struct AuthController {
    api: ApiClient,
    settings: SettingsStore,
    state: Arc<Mutex<AuthState>>,
}

impl AuthController {
    pub fn new(api: ApiClient, settings: SettingsStore) -> Self {
        Self {
            api,
            settings,
            state: Arc::new(Mutex::new(AuthState {
                loading: true,
                user: None,
                pending_location: None,
            })),
        }
    }

    pub async fn snapshot(&self) -> AuthSnapshot {
        let state = self.state.lock().await;
        AuthSnapshot {
            loading: state.loading,
            authenticated: state.user.is_some(),
            user: state.user.clone(),
            pending_location: state.pending_location.clone(),
        }
    }

    /// Resolve the stored token to a user. No token resolves to signed-out
    /// without a network call; a rejected token is cleared (silent logout).
    pub async fn load_user(&self) -> AuthSnapshot {
        if self.settings.auth_token().is_none() {
            let mut state = self.state.lock().await;
            state.user = None;
            state.loading = false;
            drop(state);
            return self.snapshot().await;
        }

        match self.api.me().await {
            Ok(user) => {
                let mut state = self.state.lock().await;
                state.user = Some(user);
                state.loading = false;
            }
            Err(err) => {
                warn!("stored token rejected, clearing it: {err}");
                if let Err(persist_err) = self.settings.set_auth_token(None) {
                    warn!("failed to clear rejected token: {persist_err}");
                }
                let mut state = self.state.lock().await;
                state.user = None;
                state.loading = false;
            }
        }
        self.snapshot().await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSnapshot> {
        let data = self.api.login(username, password).await?;
        self.settings.set_auth_token(Some(data.token))?;
        Ok(self.load_user().await)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AuthSnapshot> {
        let data = self.api.register(username, password).await?;
        self.settings.set_auth_token(Some(data.token))?;
        match data.user {
            Some(user) => {
                let mut state = self.state.lock().await;
                state.user = Some(user);
                state.loading = false;
                drop(state);
                Ok(self.snapshot().await)
            }
            // Register responses without an embedded user resolve via /auth/me/.
            None => Ok(self.load_user().await),
        }
    }

    /// Adopt an externally obtained token (OAuth callback flow).
    pub async fn login_with_token(&self, token: &str) -> Result<AuthSnapshot> {
        self.settings.set_auth_token(Some(token.to_owned()))?;
        Ok(self.load_user().await)
    }

    pub async fn logout(&self) -> Result<AuthSnapshot> {
        self.settings.set_auth_token(None)?;
        let mut state = self.state.lock().await;
        state.user = None;
        state.loading = false;
        drop(state);
        info!("logged out");
        Ok(self.snapshot().await)
    }

    /// Gate for protected operations. Remembers where the caller wanted to go
    /// so the frontend can return there after login.
    pub async fn require_authenticated(&self, wanted_location: Option<&str>) -> Result<User> {
        let mut state = self.state.lock().await;
        match &state.user {
            Some(user) => Ok(user.clone()),
            None => {
                state.pending_location = wanted_location.map(str::to_owned);
                Err(anyhow!("not authenticated"))
            }
        }
    }

    pub async fn take_pending_location(&self) -> Option<String> {
        self.state.lock().await.pending_location.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn protected_operations_refuse_while_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let auth = AuthController::new(ApiClient::new(settings.clone()), settings);

        let err = auth
            .require_authenticated(Some("/recipes/sourdough"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "not authenticated");

        // The refused route is remembered once, for the post-login redirect.
        assert_eq!(
            auth.take_pending_location().await,
            Some("/recipes/sourdough".to_owned())
        );
        assert_eq!(auth.take_pending_location().await, None);
    }
}
