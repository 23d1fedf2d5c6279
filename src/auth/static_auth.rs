use crate::auth::error::AuthError;
use crate::auth::provider::{AuthProvider, AuthState, Session};
use crate::config::SessionConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Auth provider for a single operator identity taken from configuration.
///
/// State resolves to signed-out immediately; signing in with the configured
/// email and password yields the configured uid. Account creation and
/// password reset belong to the hosted identity service and are refused.
pub struct StaticAuthProvider {
    config: SessionConfig,
    state: Arc<watch::Sender<AuthState>>,
}

impl StaticAuthProvider {
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self {
            config,
            state: Arc::new(state),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if !email.trim().eq_ignore_ascii_case(self.config.email.trim()) {
            debug!("Sign-in for unknown email {}", email);
            return Err(AuthError::UserNotFound(email.to_string()));
        }
        if password != self.config.password {
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            uid: self.config.uid.clone(),
            email: Some(self.config.email.trim().to_string()),
        };
        self.state.send_replace(AuthState::SignedIn(session.clone()));
        info!("Signed in as {}", self.config.email);
        Ok(session)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(AuthError::Unsupported("Account creation".to_string()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_replace(AuthState::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        Err(AuthError::Unsupported("Password reset".to_string()))
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
