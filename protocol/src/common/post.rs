//! Post records as returned by the post service

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Post representation for feed views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
}

/// Accepts RFC 3339 timestamps as well as offset-less date-times, which the
/// post service emits for its local timestamps. The latter are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deserializes_service_payload() {
        let json = r#"{
            "id": 7,
            "content": "hello",
            "userId": "abc-123",
            "username": "ana",
            "createdAt": "2025-03-01T10:15:30.123456",
            "likeCount": 2,
            "commentCount": 0
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.username, "ana");
        assert_eq!(post.like_count, 2);
        assert_eq!(
            post.created_at.timestamp(),
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap().timestamp()
        );
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let json = r#"{"id":1,"content":"x","username":"b","createdAt":"2025-03-01T10:15:30Z"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
        assert!(post.user_id.is_none());
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let json = r#"{"id":1,"content":"x","username":"b","createdAt":"yesterday"}"#;
        assert!(serde_json::from_str::<Post>(json).is_err());
    }

    #[test]
    fn parses_offset_timestamps() {
        let parsed = parse_timestamp("2025-03-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
    }
}
