//! Utility functions for the chirp client

use base64::{engine::general_purpose, Engine};
use chirp_protocol::common::Claims;

/// Read the claims from a JWT's payload segment.
///
/// The signature is not checked; the client only needs the subject to label
/// the stored user. Anything that does not decode yields empty claims.
pub fn decode_jwt_claims(token: &str) -> Claims {
    let Some(payload) = token.split('.').nth(1) else {
        return Claims::default();
    };

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    general_purpose::URL_SAFE_NO_PAD
        .decode(normalized)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::make_jwt;
    use serde_json::json;

    #[test]
    fn test_decode_subject() {
        let token = make_jwt(&json!({"sub": "4f1c-user", "username": "ana", "exp": 1700000000}));
        let claims = decode_jwt_claims(&token);
        assert_eq!(claims.sub.as_deref(), Some("4f1c-user"));
        assert_eq!(claims.username.as_deref(), Some("ana"));
        assert_eq!(claims.exp, Some(1700000000));
    }

    #[test]
    fn test_decode_non_ascii_payload() {
        let token = make_jwt(&json!({"sub": "añó-ü"}));
        assert_eq!(decode_jwt_claims(&token).sub.as_deref(), Some("añó-ü"));
    }

    #[test]
    fn test_decode_tolerates_padding() {
        let payload = general_purpose::URL_SAFE.encode(br#"{"sub":"x"}"#);
        let token = format!("h.{}.s", payload);
        assert_eq!(decode_jwt_claims(&token).sub.as_deref(), Some("x"));
    }

    #[test]
    fn test_float_issued_at_keeps_subject() {
        let token = make_jwt(&json!({"sub": "abc", "iat": 1700000000.5}));
        let claims = decode_jwt_claims(&token);
        assert_eq!(claims.sub.as_deref(), Some("abc"));
        assert_eq!(claims.iat, None);
    }

    #[test]
    fn test_garbage_yields_empty_claims() {
        assert_eq!(decode_jwt_claims("opaque-token"), Claims::default());
        assert_eq!(decode_jwt_claims("a.!!!.c"), Claims::default());
        assert_eq!(decode_jwt_claims(""), Claims::default());
    }
}
