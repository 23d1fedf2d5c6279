use thiserror::Error;

/// Errors reported by the authentication provider
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No account exists for {0}")]
    UserNotFound(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    EmailInUse(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Other authentication error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Errors surfaced by the sign-in view, displayed verbatim as status text
#[derive(Error, Debug)]
pub enum AuthFlowError {
    #[error("Enter your email and password to continue.")]
    MissingCredentials,

    #[error("Enter your email to reset.")]
    MissingEmail,

    #[error("{0}")]
    Provider(#[from] AuthError),
}
