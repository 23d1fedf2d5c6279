use crate::auth::error::AuthError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
}

/// Authentication state as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not yet resolved whether anyone is signed in
    Pending,
    SignedOut,
    SignedIn(Session),
}

/// AuthProvider trait defining the interface for the external identity service
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Send a password reset email
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Subscribe to auth state changes; the receiver starts at the current state
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    /// The signed-in session, if resolved and present
    fn current_session(&self) -> Option<Session> {
        match &*self.subscribe().borrow() {
            AuthState::SignedIn(session) => Some(session.clone()),
            _ => None,
        }
    }
}

/// Implementation of AuthProvider trait for Arc<T> where T implements AuthProvider
#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        (**self).sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        (**self).sign_up(email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        (**self).sign_out().await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        (**self).send_password_reset(email).await
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        (**self).subscribe()
    }
}
