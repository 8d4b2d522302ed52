//! Test utilities and helpers for unit tests
//!
//! Temporary directories, configuration pointing at mock servers, and post
//! and token fixtures.

pub mod test_helpers {
    use base64::{engine::general_purpose, Engine};
    use chirp_protocol::api::Post;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    use crate::config::Config;

    /// Create a temporary directory for testing
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    /// Unsigned token carrying `claims` as its payload
    pub fn make_jwt(claims: &serde_json::Value) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    /// Short timeout, memory-only session storage
    pub fn test_config(user_service_url: &str, post_service_url: &str) -> Config {
        Config {
            user_service_url: user_service_url.to_string(),
            post_service_url: post_service_url.to_string(),
            timeout: 5,
            token_storage_enabled: false,
            ..Config::default()
        }
    }

    pub fn sample_post(id: i64, username: &str, content: &str, created_at: DateTime<Utc>) -> Post {
        Post {
            id,
            content: content.to_string(),
            user_id: None,
            username: username.to_string(),
            created_at,
            like_count: 0,
            comment_count: 0,
        }
    }

    /// A post as the post service sends it, with an offset-less timestamp
    pub fn post_json(id: i64, username: &str, content: &str, like_count: u32) -> serde_json::Value {
        json!({
            "id": id,
            "content": content,
            "userId": format!("{}-id", username),
            "username": username,
            "createdAt": "2025-03-01T10:15:30.123456",
            "likeCount": like_count,
            "commentCount": 0
        })
    }
}
