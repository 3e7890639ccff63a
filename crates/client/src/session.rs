//! Session token storage shared by every outgoing request.
//!
//! The token is attached as a bearer credential by [`crate::ApiClient`]. When
//! the backend answers 401 the client calls [`SessionStore::logout`], which
//! drops the token and runs the registered logout hook (e.g. to send the
//! user back to the login screen).

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// Callback run when the session ends because the backend rejected it.
pub type LogoutHook = Arc<dyn Fn() + Send + Sync>;

/// In-memory session state. Cheap to clone; clones share the same session.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    token: RwLock<Option<SecretString>>,
    logout_hook: RwLock<Option<LogoutHook>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// A session with no token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts authenticated.
    #[must_use]
    pub fn with_token(token: SecretString) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(Some(token)),
                logout_hook: RwLock::new(None),
            }),
        }
    }

    /// Store the token returned by a login call.
    pub async fn set_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
    }

    /// The current token, if any.
    pub async fn token(&self) -> Option<SecretString> {
        self.inner.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Drop the token without running the logout hook (user-initiated sign-out).
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    /// Register the callback run by [`SessionStore::logout`], replacing any
    /// previous one.
    pub async fn set_logout_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.inner.logout_hook.write().await = Some(Arc::new(hook));
    }

    /// End the session: drop the token and run the logout hook.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.clear_token().await;

        // Clone out so the hook never runs under the lock.
        let hook = self.inner.logout_hook.read().await.clone();
        if let Some(hook) = hook {
            info!("Session rejected by backend, running logout hook");
            hook();
        } else {
            info!("Session rejected by backend, no logout hook registered");
        }
    }
}
