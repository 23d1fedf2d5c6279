use crate::auth::error::{AuthError, AuthFlowError};
use crate::auth::guard::SIGN_IN_ROUTE;
use crate::auth::provider::{AuthProvider, Session};
use tracing::{info, warn};

/// Status shown once a reset email has been requested
pub const PASSWORD_RESET_SENT: &str = "Password reset sent.";

/// Sign in, creating the account when the provider has no such user
pub async fn continue_with_credentials<A: AuthProvider + ?Sized>(
    auth: &A,
    email: &str,
    password: &str,
) -> Result<Session, AuthFlowError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthFlowError::MissingCredentials);
    }

    match auth.sign_in(email, password).await {
        Ok(session) => Ok(session),
        Err(AuthError::UserNotFound(_)) => {
            info!("No account for {}, creating one", email);
            Ok(auth.sign_up(email, password).await?)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn request_password_reset<A: AuthProvider + ?Sized>(
    auth: &A,
    email: &str,
) -> Result<&'static str, AuthFlowError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthFlowError::MissingEmail);
    }
    auth.send_password_reset(email).await?;
    Ok(PASSWORD_RESET_SENT)
}

/// End the session and return the route to show next
pub async fn sign_out<A: AuthProvider + ?Sized>(auth: &A) -> &'static str {
    if let Err(e) = auth.sign_out().await {
        warn!("Sign-out failed: {}", e);
    }
    SIGN_IN_ROUTE
}
