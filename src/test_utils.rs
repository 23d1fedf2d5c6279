use crate::auth::{AdminAllowList, Session};
use crate::config::{load_config, Config};
use crate::models::{VideoDocument, VideoEntry};
use chrono::Utc;

/// Check if a test is enabled via environment variable
fn is_test_enabled(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Check if S3 tests are enabled via environment variable
pub fn is_s3_enabled() -> bool {
    is_test_enabled("ENABLE_S3_TESTS")
}

/// Load test configuration from config.toml
pub fn load_test_config() -> Result<Config, anyhow::Error> {
    load_config("config.toml").map_err(|e| anyhow::anyhow!("Failed to load config.toml: {}", e))
}

/// A playable document with a title and a couple of tags
pub fn test_document(url: &str) -> VideoDocument {
    VideoDocument {
        url: Some(url.to_string()),
        title: Some("Test video".to_string()),
        tags: vec!["grit".to_string(), "focus".to_string()],
        ..Default::default()
    }
}

/// A feed entry created now
pub fn test_entry(id: &str, url: &str) -> VideoEntry {
    VideoEntry {
        id: id.to_string(),
        url: url.to_string(),
        title: Some(format!("Video {id}")),
        tags: vec!["grit".to_string()],
        created_at: Utc::now(),
        poster: None,
    }
}

pub fn viewer_session() -> Session {
    Session {
        uid: "viewer-uid".to_string(),
        email: Some("viewer@example.com".to_string()),
    }
}

pub fn admin_session() -> Session {
    Session {
        uid: "admin-uid".to_string(),
        email: Some("Boss@Example.com".to_string()),
    }
}

/// Allow-list admitting [`admin_session`] by email
pub fn test_admins() -> AdminAllowList {
    AdminAllowList::from_config("boss@example.com", &[])
}
