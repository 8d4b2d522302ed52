//! Authentication against the user service

use chirp_protocol::api::{
    IdentifierCheckRequest, IdentifierCheckResponse, LoginResponse, MessageResponse,
    PasswordLoginRequest, RegisterRequest, ResendCodeRequest, VerifyRequest,
};
use reqwest::{Method, StatusCode};

use crate::client::{ApiResponse, BaseClient};
use crate::config::Config;
use crate::error::{ChirpError, Result};
use crate::session::{GuardOutcome, SessionGuard};
use crate::store::{Session, TokenStore, User};
use crate::utils::decode_jwt_claims;
use crate::validation::{self, RegistrationForm};

const CHECK_ENDPOINT: &str = "/api/auth/login/check";
const AUTHENTICATE_ENDPOINT: &str = "/api/auth/login/authenticate";
const REGISTER_ENDPOINT: &str = "/api/auth/register";
const VERIFY_ENDPOINT: &str = "/api/auth/verify";
const RESEND_CODE_ENDPOINT: &str = "/api/auth/resend-code";

/// One call per operation against the user service; nothing is retried
#[derive(Debug, Clone)]
pub struct AuthClient {
    base_client: BaseClient,
}

impl AuthClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            base_client: BaseClient::new(config.user_service_url.clone(), config.timeout)?,
        })
    }

    /// Whether a username or e-mail is registered
    pub async fn check_identifier(&self, identifier: &str) -> Result<bool> {
        let request = IdentifierCheckRequest {
            identifier: identifier.to_string(),
        };
        let response = self
            .base_client
            .send(Method::POST, CHECK_ENDPOINT, Some(&request), None)
            .await?;

        // Unknown identifiers come back as 404 with `exists: false`.
        if response.is_success() || response.status == StatusCode::NOT_FOUND {
            if let Ok(body) = response.json::<IdentifierCheckResponse>() {
                return Ok(body.exists);
            }
        }

        let response = response.into_result("Could not check the user")?;
        Ok(response.json::<IdentifierCheckResponse>()?.exists)
    }

    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<LoginResponse> {
        let request = PasswordLoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        self.base_client
            .request(Method::POST, AUTHENTICATE_ENDPOINT, Some(&request), "Login failed")
            .await
    }

    /// Validates the form locally, then creates the account. Returns the
    /// service's confirmation message.
    pub async fn register(&self, form: &RegistrationForm) -> Result<String> {
        let form = form.normalized();
        validation::validate_registration(&form)?;

        let request = RegisterRequest {
            username: form.username,
            email: form.email,
            password: form.password,
        };
        let response = self
            .base_client
            .send(Method::POST, REGISTER_ENDPOINT, Some(&request), None)
            .await?
            .into_result("Could not create the account")?;

        Ok(acknowledgement(&response).unwrap_or_else(|| {
            "Account created. Check your email for the verification code.".to_string()
        }))
    }

    /// `code` may contain separators; only its digits are sent
    pub async fn verify_code(&self, username: &str, code: &str) -> Result<String> {
        let username = username.trim();
        validation::require_fields(&[("username", username)])?;
        let code = validation::validate_code(code)?;

        let request = VerifyRequest {
            username: username.to_string(),
            confirmation_code: code,
        };
        let response = self
            .base_client
            .send(Method::POST, VERIFY_ENDPOINT, Some(&request), None)
            .await?
            .into_result("Invalid verification code")?;

        Ok(acknowledgement(&response).unwrap_or_else(|| "Account verified".to_string()))
    }

    pub async fn resend_code(&self, username: &str) -> Result<String> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChirpError::validation_field(
                "Please enter your username first",
                "username",
            ));
        }

        let request = ResendCodeRequest {
            username: username.to_string(),
        };
        let response = self
            .base_client
            .send(Method::POST, RESEND_CODE_ENDPOINT, Some(&request), None)
            .await?
            .into_result("Could not resend the code")?;

        Ok(acknowledgement(&response)
            .unwrap_or_else(|| "Code sent again. Check your email.".to_string()))
    }
}

/// `message` from a success body. The body is optional; empty or non-JSON
/// bodies yield `None`.
fn acknowledgement(response: &ApiResponse) -> Option<String> {
    response
        .json::<MessageResponse>()
        .ok()
        .and_then(|r| r.message)
}

/// What `chirp status` reports
#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub authenticated: bool,
    pub session_complete: bool,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub user_service: String,
    pub post_service: String,
}

/// Login and logout on top of [`AuthClient`] and [`TokenStore`]
#[derive(Debug)]
pub struct AuthService {
    client: AuthClient,
    store: TokenStore,
    config: Config,
}

impl AuthService {
    pub fn new(config: Config, store: TokenStore) -> Result<Self> {
        Ok(Self {
            client: AuthClient::new(&config)?,
            store,
            config,
        })
    }

    #[cfg(test)]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Existence check, then password authentication, then the session is stored
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<Session> {
        let identifier = identifier.trim();
        validation::require_fields(&[("identifier", identifier), ("password", password)])?;

        tracing::debug!(identifier, "checking user");
        if !self.client.check_identifier(identifier).await? {
            return Err(ChirpError::user_not_found("User not found"));
        }

        tracing::debug!(identifier, "authenticating");
        let tokens = self.client.authenticate(identifier, password).await?;
        let claims = decode_jwt_claims(&tokens.access_token);

        let session = Session {
            user: User {
                username: tokens.username,
                display_name: None,
                user_id: claims.sub,
            },
            access_token: tokens.access_token,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
        };
        self.store.save(&session)?;

        tracing::info!(username = %session.user.username, "logged in");
        Ok(session)
    }

    /// Forget the stored session
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Signed in means what the session guard accepts; `session_complete`
    /// additionally requires the id and refresh tokens
    pub fn status(&self) -> StatusInfo {
        let user = match SessionGuard::check(&self.store) {
            GuardOutcome::Authorized(session) => Some(session.user),
            GuardOutcome::Redirect { .. } => None,
        };
        StatusInfo {
            authenticated: user.is_some(),
            session_complete: self.store.load().is_some(),
            username: user.as_ref().map(|u| u.username.clone()),
            user_id: user.and_then(|u| u.user_id),
            user_service: self.config.user_service_url.clone(),
            post_service: self.config.post_service_url.clone(),
        }
    }
}
