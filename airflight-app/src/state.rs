use std::sync::Arc;

use airflight_core::session::CURRENT_USER_KEY;
use airflight_core::{RemoteStore, Session, SessionError, SessionStore};
use tracing::{info, warn};

use crate::error::FlowError;

#[derive(Clone)]
pub struct AuthSettings {
    pub min_password_length: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
    pub sessions: SessionManager,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        session_store: Arc<dyn SessionStore>,
        auth: AuthSettings,
    ) -> Self {
        Self {
            store,
            sessions: SessionManager::new(session_store),
            auth,
        }
    }
}

/// The only place the session store is touched; flows receive the resulting [`Session`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The signed-in session, if any. Unreadable session storage counts as signed out.
    pub async fn current(&self) -> Result<Option<Session>, FlowError> {
        let email = match self.store.get(CURRENT_USER_KEY).await {
            Ok(email) => email,
            Err(SessionError::Corrupt(e)) => {
                warn!("Ignoring corrupt session storage: {}", e);
                None
            }
            Err(e) => return Err(e.into()),
        };
        Ok(email.filter(|email| !email.is_empty()).map(Session::new))
    }

    pub async fn begin(&self, email: &str) -> Result<Session, FlowError> {
        self.store.set(CURRENT_USER_KEY, email).await?;
        info!("Session started for {}", email);
        Ok(Session::new(email))
    }

    pub async fn end(&self) -> Result<(), FlowError> {
        self.store.remove(CURRENT_USER_KEY).await?;
        info!("Session cleared");
        Ok(())
    }
}
