//! Authentication API DTOs
//!
//! Request and response bodies for the user service's `/api/auth` endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::{Claims, LoginResponse};

// ============================================================================
// Login DTOs
// ============================================================================

/// Step one of the login: does this username or e-mail exist?
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IdentifierCheckRequest {
    #[validate(length(min = 1))]
    pub identifier: String,
}

/// Answer to the existence check. The service answers 404 with
/// `exists: false` for unknown identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierCheckResponse {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Step two of the login
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordLoginRequest {
    #[validate(length(min = 1))]
    pub identifier: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Password login response
pub type PasswordLoginResponse = LoginResponse;

// ============================================================================
// Registration DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Confirm an account with the code delivered by e-mail
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(equal = 6))]
    pub confirmation_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResendCodeRequest {
    #[validate(length(min = 1))]
    pub username: String,
}

/// Plain acknowledgement returned by register, verify and resend-code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_uses_camel_case() {
        let req = VerifyRequest {
            username: "ana".to_string(),
            confirmation_code: "123456".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["confirmationCode"], "123456");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn verify_request_rejects_short_codes() {
        let req = VerifyRequest {
            username: "ana".to_string(),
            confirmation_code: "12345".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn login_response_reads_service_fields() {
        let json = r#"{
            "accessToken": "a.b.c",
            "idToken": "id",
            "refreshToken": "rt",
            "tokenType": "Bearer",
            "expiresIn": 3600,
            "username": "ana"
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "a.b.c");
        assert_eq!(resp.expires_in, Some(3600));
    }

    #[test]
    fn unknown_identifier_body_parses() {
        let resp: IdentifierCheckResponse =
            serde_json::from_str(r#"{"exists":false,"error":"User not found"}"#).unwrap();
        assert!(!resp.exists);
    }
}
