//! Authentication-related common types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Tokens issued by the user service after a successful password login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub username: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Claims read from an access token payload.
///
/// Every field is optional: the client only decodes the payload, it never
/// verifies the signature, and a token it cannot read yields `Claims::default()`.
/// A claim of an unexpected JSON type reads as `None` without affecting the
/// others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default, deserialize_with = "lenient")]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    #[serde(default, deserialize_with = "lenient")]
    pub exp: Option<i64>,
    /// Issued at time (Unix timestamp)
    #[serde(default, deserialize_with = "lenient")]
    pub iat: Option<i64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Error body shared by both services: `{"error": ...}` or `{"message": ...}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The message the server wants shown, preferring `error` over `message`
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mistyped_claims_do_not_hide_subject() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub":"abc","iat":1700000000.5,"exp":"soon","username":42}"#,
        )
        .unwrap();
        assert_eq!(claims.sub.as_deref(), Some("abc"));
        assert_eq!(claims.iat, None);
        assert_eq!(claims.exp, None);
        assert_eq!(claims.username, None);
    }

    #[test]
    fn well_typed_claims_are_kept() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"abc","iat":1700000000,"exp":1700003600}"#).unwrap();
        assert_eq!(claims.iat, Some(1700000000));
        assert_eq!(claims.exp, Some(1700003600));
    }
}
