//! Unified error handling for the chirp client
//!
//! This module provides the error system shared by every entry point:
//! - Unique error codes for debugging and support requests
//! - Structured error information with context
//! - Convenient constructor methods
//! - Automatic conversions from common error types

use std::fmt;
use thiserror::Error;

/// Unified Result type for all chirp operations
pub type Result<T> = std::result::Result<T, ChirpError>;

/// Error codes for chirp operations
///
/// Each error has a unique code in the format `CXXX` where:
/// - C1XX: Authentication and session errors
/// - C2XX: Network and API errors
/// - C3XX: Local storage errors
/// - C4XX: Configuration errors
/// - C5XX: Validation and input errors
/// - C8XX: UI and interaction errors
/// - C9XX: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (C1XX)
    /// C101: Authentication failed
    AuthenticationFailed,
    /// C102: Authorization denied
    AuthorizationDenied,
    /// C103: Unknown user
    UserNotFound,
    /// C105: No stored session
    SessionNotFound,

    // Network (C2XX)
    /// C201: HTTP request failed
    HttpError,
    /// C202: Connection timeout
    ConnectionTimeout,
    /// C204: Connection refused
    ConnectionRefused,
    /// C205: API returned error response
    ApiError,
    /// C206: Invalid API response format
    InvalidResponse,

    // Storage (C3XX)
    /// C302: Storage read error
    StorageReadError,
    /// C303: Storage write error
    StorageWriteError,

    // Configuration (C4XX)
    /// C401: Configuration error
    ConfigError,
    /// C402: Invalid endpoint URL
    InvalidEndpoint,

    // Validation (C5XX)
    /// C501: Invalid input
    InvalidInput,
    /// C502: Validation failed
    ValidationFailed,

    // UI (C8XX)
    /// C801: Dialog error
    DialogError,

    // Internal (C9XX)
    /// C902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::AuthorizationDenied => 102,
            ErrorCode::UserNotFound => 103,
            ErrorCode::SessionNotFound => 105,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 204,
            ErrorCode::ApiError => 205,
            ErrorCode::InvalidResponse => 206,

            ErrorCode::StorageReadError => 302,
            ErrorCode::StorageWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::DialogError => 801,

            ErrorCode::SerializationError => 902,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.code())
    }
}

/// Main error type for all chirp operations
#[derive(Error, Debug)]
pub enum ChirpError {
    // ==================== Authentication Errors (C1XX) ====================
    /// Authentication failed
    #[error("[{code}] Authentication failed: {message}")]
    Authentication { code: ErrorCode, message: String },

    /// Authorization denied
    #[error("[{code}] Authorization denied: {message}")]
    Authorization { code: ErrorCode, message: String },

    /// No usable session in the token store
    #[error("[{code}] Not logged in: {message}")]
    Session { code: ErrorCode, message: String },

    // ==================== Network Errors (C2XX) ====================
    /// HTTP/Network error
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// API error with status code
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    // ==================== Storage Errors (C3XX) ====================
    /// Storage I/O error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (C4XX) ====================
    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (C5XX) ====================
    /// Validation error
    #[error("[{code}] Validation error: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        field: Option<String>,
    },

    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== UI Errors (C8XX) ====================
    /// UI/Dialog error
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Internal Errors (C9XX) ====================
    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl ChirpError {
    // --- Authentication ---

    /// Create authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
        }
    }

    /// Create unknown user error
    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::UserNotFound,
            message: message.into(),
        }
    }

    /// Create authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            code: ErrorCode::AuthorizationDenied,
            message: message.into(),
        }
    }

    /// Create missing session error
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::Session {
            code: ErrorCode::SessionNotFound,
            message: message.into(),
        }
    }

    // --- Network ---

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status,
            message: message.into(),
        }
    }

    // --- Storage ---

    /// Create storage error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorCode::StorageWriteError,
            _ => ErrorCode::StorageReadError,
        };

        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create storage write error
    pub fn storage_write(context: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            code: ErrorCode::StorageWriteError,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration error with source
    pub fn config_from_error(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create invalid endpoint error
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    // --- Validation ---

    /// Create validation error with field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Authorization { code, .. } => *code,
            Self::Session { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// The bare message, without code or category, for showing to the user
    /// exactly as the server or validator phrased it
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { message, .. }
            | Self::Authorization { message, .. }
            | Self::Session { message, .. }
            | Self::Network { message, .. }
            | Self::Api { message, .. }
            | Self::Config { message, .. }
            | Self::Validation { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::Ui { message, .. }
            | Self::Serialization { message, .. } => message.clone(),
            Self::Io {
                context, message, ..
            } => format!("{}: {}", context, message),
        }
    }

    /// Check if this is an authentication error
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Authorization { .. } | Self::Session { .. }
        )
    }

    /// The service could not be reached at all
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Errors raised before any request was sent
    #[cfg(test)]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidInput { .. })
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for ChirpError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<reqwest::Error> for ChirpError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for ChirpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for ChirpError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_from_error(err)
    }
}

impl From<dialoguer::Error> for ChirpError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}

impl From<validator::ValidationErrors> for ChirpError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|f| f.to_string());
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: err.to_string(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::AuthenticationFailed.code(), 101);
        assert_eq!(ErrorCode::HttpError.code(), 201);
        assert_eq!(ErrorCode::StorageReadError.code(), 302);
        assert_eq!(ErrorCode::ConfigError.code(), 401);
        assert_eq!(ErrorCode::ValidationFailed.code(), 502);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::AuthenticationFailed.to_string(), "C101");
        assert_eq!(ErrorCode::SessionNotFound.to_string(), "C105");
    }

    #[test]
    fn test_error_display() {
        let err = ChirpError::authentication("Incorrect username or password.");
        assert!(err.to_string().contains("C101"));
        assert!(err.to_string().contains("Incorrect username or password."));
    }

    #[test]
    fn test_user_message_is_verbatim() {
        let err = ChirpError::api(400, "Username already exists");
        assert_eq!(err.user_message(), "Username already exists");
        assert_eq!(err.code(), ErrorCode::ApiError);
        assert!(!err.is_network_error());
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_error_categories() {
        assert!(ChirpError::session_not_found("x").is_auth_error());
        assert!(ChirpError::validation_field("x", "email").is_validation_error());
        assert!(ChirpError::invalid_input("x").is_validation_error());
        assert!(!ChirpError::invalid_input("x").is_auth_error());
    }
}
