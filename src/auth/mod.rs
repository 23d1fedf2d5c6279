pub mod admin;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod guard;
pub mod login;
pub mod provider;
pub mod static_auth;

pub use admin::AdminAllowList;
pub use error::{AuthError, AuthFlowError};
#[cfg(test)]
pub use fake::FakeAuthProvider;
pub use guard::{GuardState, SessionGuard, SIGN_IN_ROUTE};
pub use provider::{AuthProvider, AuthState, Session};
pub use static_auth::StaticAuthProvider;
