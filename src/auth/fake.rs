use crate::auth::error::AuthError;
use crate::auth::provider::{AuthProvider, AuthState, Session};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

/// A fake in-memory implementation of the AuthProvider trait for testing.
///
/// Starts in [`AuthState::Pending`] until a `fake_*` helper or a sign-in
/// resolves it.
#[derive(Clone)]
pub struct FakeAuthProvider {
    accounts: Arc<Mutex<HashMap<String, (String, String)>>>,
    reset_requests: Arc<Mutex<Vec<String>>>,
    state: Arc<watch::Sender<AuthState>>,
    offline: Arc<AtomicBool>,
}

impl FakeAuthProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Pending);
        FakeAuthProvider {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            reset_requests: Arc::new(Mutex::new(Vec::new())),
            state: Arc::new(state),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register an account without signing in; returns its uid
    pub fn fake_add_account(&self, email: &str, password: &str) -> String {
        let uid = format!("uid-{}", Uuid::new_v4().simple());
        self.accounts.lock().unwrap().insert(
            email.to_lowercase(),
            (uid.clone(), password.to_string()),
        );
        uid
    }

    pub fn fake_set_state(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    /// Make every call fail with a network error
    pub fn fake_set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fake_reset_requests(&self) -> Vec<String> {
        self.reset_requests.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AuthError::Network("simulated offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.check_online()?;
        let accounts = self.accounts.lock().unwrap();
        let (uid, stored_password) = accounts
            .get(&email.to_lowercase())
            .ok_or_else(|| AuthError::UserNotFound(email.to_string()))?;
        if stored_password != password {
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            uid: uid.clone(),
            email: Some(email.to_string()),
        };
        self.state.send_replace(AuthState::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.check_online()?;
        if self.accounts.lock().unwrap().contains_key(&email.to_lowercase()) {
            return Err(AuthError::EmailInUse(email.to_string()));
        }
        self.fake_add_account(email, password);
        self.sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.check_online()?;
        self.state.send_replace(AuthState::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.check_online()?;
        if !self.accounts.lock().unwrap().contains_key(&email.to_lowercase()) {
            return Err(AuthError::UserNotFound(email.to_string()));
        }
        self.reset_requests.lock().unwrap().push(email.to_string());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

impl Default for FakeAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}
