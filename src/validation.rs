//! Client-side checks run before any request is sent

use chirp_protocol::api::MAX_POST_LENGTH;
use regex::Regex;

use crate::error::{ChirpError, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const VERIFICATION_CODE_LENGTH: usize = 6;

/// Symbols the user service's password policy accepts
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

const MISSING_FIELDS: &str = "Please fill in all fields";

/// Registration form as typed by the user
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Trimmed copy; passwords are kept exactly as typed
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        }
    }
}

/// Fails with the generic "fill in all fields" message if any value is blank
pub fn require_fields(fields: &[(&str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ChirpError::validation_field(MISSING_FIELDS, *name)),
        None => Ok(()),
    }
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// At least one lowercase, uppercase, digit and policy symbol, built only
/// from letters, digits and policy symbols, and at least 8 long.
pub fn is_strong_password(password: &str) -> bool {
    let charset = Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$").is_ok_and(|re| re.is_match(password));
    let required = [r"[a-z]", r"[A-Z]", r"\d", r"[@$!%*?&]"];

    charset
        && required
            .iter()
            .all(|pattern| Regex::new(pattern).is_ok_and(|re| re.is_match(password)))
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ChirpError::validation_field(
            format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ),
            "password",
        ));
    }
    if !is_strong_password(password) {
        return Err(ChirpError::validation_field(
            format!(
                "Password must contain a lowercase letter, an uppercase letter, a number and a special character ({})",
                PASSWORD_SYMBOLS
            ),
            "password",
        ));
    }
    Ok(())
}

/// Same order of checks as the registration form: blanks, e-mail, length,
/// complexity, confirmation
pub fn validate_registration(form: &RegistrationForm) -> Result<()> {
    require_fields(&[
        ("username", &form.username),
        ("email", &form.email),
        ("password", &form.password),
    ])?;

    if !valid_email(&form.email) {
        return Err(ChirpError::validation_field(
            "Please enter a valid email address",
            "email",
        ));
    }

    validate_password(&form.password)?;

    if form.password != form.confirm_password {
        return Err(ChirpError::validation_field(
            "Passwords do not match",
            "confirm_password",
        ));
    }
    Ok(())
}

/// Drop everything that is not a digit, as the code field does while typing
pub fn sanitize_code(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Sanitized 6-digit verification code
pub fn validate_code(input: &str) -> Result<String> {
    let code = sanitize_code(input);
    if code.is_empty() {
        return Err(ChirpError::validation_field(MISSING_FIELDS, "code"));
    }
    if code.len() != VERIFICATION_CODE_LENGTH {
        return Err(ChirpError::validation_field(
            format!("The code must have {} digits", VERIFICATION_CODE_LENGTH),
            "code",
        ));
    }
    Ok(code)
}

/// Trimmed post body, non-empty and within the length limit
pub fn validate_post_content(raw: &str) -> Result<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ChirpError::validation_field("Post cannot be empty", "content"));
    }

    let length = content.chars().count();
    if length > MAX_POST_LENGTH {
        return Err(ChirpError::validation_field(
            format!(
                "Posts are limited to {} characters (this one has {})",
                MAX_POST_LENGTH, length
            ),
            "content",
        ));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    mod unit {
        use super::*;

        #[test]
        fn test_password_policy_examples() {
            assert!(is_strong_password("Abcdef1!"));
            assert!(!is_strong_password("abcdefgh"));
            assert!(!is_strong_password("Short1!"));
            assert!(validate_password("Abcdef1!").is_ok());
        }

        #[test]
        fn test_short_password_reports_length() {
            let err = validate_password("Short1!").unwrap_err();
            assert!(err.user_message().contains("at least 8"));
        }

        #[test]
        fn test_password_outside_charset_rejected() {
            // '#' is not one of the accepted symbols
            assert!(!is_strong_password("Abcdef1#"));
            assert!(!is_strong_password("Abc def1!"));
        }

        #[test]
        fn test_registration_checks_in_order() {
            let mut blank = form("Abcdef1!", "Abcdef1!");
            blank.username = "  ".to_string();
            assert_eq!(
                validate_registration(&blank).unwrap_err().user_message(),
                "Please fill in all fields"
            );

            let mut bad_email = form("Abcdef1!", "Abcdef1!");
            bad_email.email = "ana.example.com".to_string();
            assert!(validate_registration(&bad_email)
                .unwrap_err()
                .user_message()
                .contains("email"));

            let mismatch = validate_registration(&form("Abcdef1!", "Abcdef1?")).unwrap_err();
            assert_eq!(mismatch.user_message(), "Passwords do not match");

            assert!(validate_registration(&form("Abcdef1!", "Abcdef1!")).is_ok());
        }

        #[test]
        fn test_normalized_trims_identity_only() {
            let raw = RegistrationForm {
                username: " ana ".to_string(),
                email: " ana@example.com\n".to_string(),
                password: " Abcdef1! ".to_string(),
                confirm_password: " Abcdef1! ".to_string(),
            };
            let normalized = raw.normalized();
            assert_eq!(normalized.username, "ana");
            assert_eq!(normalized.email, "ana@example.com");
            assert_eq!(normalized.password, " Abcdef1! ");
        }

        #[test]
        fn test_code_sanitizing() {
            assert_eq!(sanitize_code("12-34 56"), "123456");
            assert_eq!(validate_code("123 456").unwrap(), "123456");
            assert!(validate_code("12345").is_err());
            assert!(validate_code("1234567").is_err());
            assert_eq!(
                validate_code("abc").unwrap_err().user_message(),
                "Please fill in all fields"
            );
        }

        #[test]
        fn test_post_content_limits() {
            assert_eq!(validate_post_content("  hello  ").unwrap(), "hello");
            assert!(validate_post_content("   ").is_err());
            assert!(validate_post_content(&"é".repeat(140)).is_ok());
            assert!(validate_post_content(&"a".repeat(141)).is_err());
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_sanitized_code_is_digits_only(s in "\\PC*") {
                let code = sanitize_code(&s);
                prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
            }

            #[test]
            fn test_six_digits_always_accepted(code in "[0-9]{6}", noise in "[a-z -]{0,4}") {
                let typed = format!("{}{}", noise, code);
                prop_assert_eq!(validate_code(&typed).unwrap(), code);
            }

            #[test]
            fn test_short_passwords_never_accepted(p in "[A-Za-z0-9@$!%*?&]{0,7}") {
                prop_assert!(validate_password(&p).is_err());
            }
        }
    }
}
