use crate::auth::provider::{AuthProvider, AuthState, Session};
use tokio::sync::watch;
use tracing::debug;

/// Route unauthenticated viewers are sent to
pub const SIGN_IN_ROUTE: &str = "/login";

/// What a protected view may show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Auth has not resolved yet; nothing protected is observable
    Pending,
    Redirect { to: &'static str },
    Granted(Session),
}

impl GuardState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            GuardState::Granted(session) => Some(session),
            _ => None,
        }
    }
}

impl From<&AuthState> for GuardState {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Pending => GuardState::Pending,
            AuthState::SignedOut => GuardState::Redirect { to: SIGN_IN_ROUTE },
            AuthState::SignedIn(session) => GuardState::Granted(session.clone()),
        }
    }
}

/// Gate for a protected view. Each mount subscribes afresh; nothing is cached
/// between mounts.
pub struct SessionGuard {
    receiver: watch::Receiver<AuthState>,
}

impl SessionGuard {
    pub fn mount<A: AuthProvider + ?Sized>(auth: &A) -> Self {
        Self {
            receiver: auth.subscribe(),
        }
    }

    /// The guard's view of the current auth state
    pub fn state(&self) -> GuardState {
        GuardState::from(&*self.receiver.borrow())
    }

    /// Wait until auth resolves. A provider that goes away before resolving
    /// counts as signed out.
    pub async fn resolve(&mut self) -> GuardState {
        let resolved = match self
            .receiver
            .wait_for(|state| !matches!(state, AuthState::Pending))
            .await
        {
            Ok(state) => GuardState::from(&*state),
            Err(_) => GuardState::Redirect { to: SIGN_IN_ROUTE },
        };
        debug!("Session guard resolved to {:?}", resolved);
        resolved
    }

    /// Wait for the next auth change; `None` once the provider is gone
    pub async fn changed(&mut self) -> Option<GuardState> {
        self.receiver.changed().await.ok()?;
        Some(self.state())
    }
}
