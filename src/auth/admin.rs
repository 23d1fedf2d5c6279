use crate::auth::provider::Session;
use std::collections::HashSet;

/// Identities allowed to upload, delete and run maintenance.
///
/// Built once from configuration and handed to the components that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: HashSet<String>,
    tokens: HashSet<String>,
}

impl AdminAllowList {
    /// Build from a comma-separated email list and a list of admin uids
    pub fn from_config(emails_csv: &str, tokens: &[String]) -> Self {
        let emails = emails_csv
            .split(',')
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        let tokens = tokens
            .iter()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect();
        Self { emails, tokens }
    }

    /// Whether the session's email is on the list (case-insensitive)
    pub fn is_admin(&self, session: &Session) -> bool {
        session
            .email
            .as_deref()
            .map(|email| self.emails.contains(&email.trim().to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_admin_token(&self, uid: &str) -> bool {
        self.tokens.contains(uid)
    }

    /// Whether the session may perform admin operations by either email or token
    pub fn permits(&self, session: &Session) -> bool {
        self.is_admin(session) || self.is_admin_token(&session.uid)
    }
}
