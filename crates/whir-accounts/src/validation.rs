//! Field validation for account requests.

use crate::error::{AccountError, Result};
use crate::types::{LoginRequest, SignUpRequest};

/// Name length bounds, in characters.
pub const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// bcrypt only looks at the first 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validate a sign-up request.
///
/// # Errors
///
/// Returns `AccountError::Validation` naming the first bad field.
pub fn sign_up(request: &SignUpRequest) -> Result<()> {
    email(&request.email)?;
    name("first_name", &request.first_name)?;
    if let Some(last_name) = &request.last_name {
        name("last_name", last_name)?;
    }
    password(&request.password)
}

/// Validate a login request. Only the email shape is checked.
///
/// # Errors
///
/// Returns `AccountError::Validation` if the email is malformed.
pub fn log_in(request: &LoginRequest) -> Result<()> {
    email(&request.email)
}

fn email(value: &str) -> Result<()> {
    let value = value.trim();
    let invalid = || AccountError::Validation("email must be a valid address".to_string());

    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

fn name(field: &str, value: &str) -> Result<()> {
    let len = value.trim().chars().count();
    if NAME_LEN.contains(&len) {
        Ok(())
    } else {
        Err(AccountError::Validation(format!(
            "{field} must be between {} and {} characters",
            NAME_LEN.start(),
            NAME_LEN.end()
        )))
    }
}

fn password(value: &str) -> Result<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(AccountError::Validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(result: Result<()>, field: &str) {
        match result {
            Err(AccountError::Validation(message)) => assert!(message.contains(field), "{message}"),
            other => panic!("expected validation error for {field}, got {other:?}"),
        }
    }

    #[test]
    fn valid_sign_up() {
        let request =
            SignUpRequest::new("ada@example.com", "secret", "Ada").with_last_name("Byron");
        assert!(sign_up(&request).is_ok());
    }

    #[test]
    fn last_name_is_optional() {
        assert!(sign_up(&SignUpRequest::new("ada@example.com", "secret", "Ada")).is_ok());
    }

    #[test]
    fn bad_emails() {
        let bad_emails = [
            "",
            "plain",
            "@example.com",
            "a@",
            "a@b",
            "a@.com",
            "a@b.",
            "a b@c.com",
            "a@b@c.com",
        ];
        for bad in bad_emails {
            assert_invalid(email(bad), "email");
        }
        assert!(email(" Ada@Example.com ").is_ok());
    }

    #[test]
    fn name_bounds() {
        assert_invalid(name("first_name", "A"), "first_name");
        assert_invalid(name("first_name", &"x".repeat(101)), "first_name");
        assert!(name("first_name", "Al").is_ok());
        assert!(name("first_name", &"x".repeat(100)).is_ok());
        assert!(name("first_name", "Zoë").is_ok());
    }

    #[test]
    fn short_last_name_rejected() {
        let request = SignUpRequest::new("ada@example.com", "secret", "Ada").with_last_name("B");
        assert_invalid(sign_up(&request), "last_name");
    }

    #[test]
    fn password_bounds() {
        assert_invalid(password("12345"), "password");
        assert!(password("123456").is_ok());
        assert_invalid(password(&"p".repeat(73)), "password");
    }

    #[test]
    fn login_checks_email_only() {
        assert!(log_in(&LoginRequest::new("ada@example.com", "")).is_ok());
        assert_invalid(log_in(&LoginRequest::new("nope", "secret")), "email");
    }
}
