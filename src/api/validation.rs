//! Input validation for API requests.
//!
//! Small `Result<(), String>` helpers; collect multiple failures through the
//! `ValidationErrorBuilder` in the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for a plausible email address
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    /// Regex for client codes (kunnr): digits/uppercase, as replicated from the ERP
    static ref CLIENT_CODE_REGEX: Regex = Regex::new(r"^[A-Z0-9]{1,20}$").unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 100 {
        return Err("Email is too long (max 100 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > 50 {
        return Err("Username is too long (max 50 characters)".to_string());
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password is too short (min 6 characters)".to_string());
    }

    Ok(())
}

/// Validate a client code (kunnr)
pub fn validate_client_code(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("Client code is required".to_string());
    }

    if !CLIENT_CODE_REGEX.is_match(code) {
        return Err("Client code must be 1-20 uppercase letters or digits".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ruta12@lactolac.com.sv").is_ok());
        assert!(validate_email("a@b.co").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@signs.com").is_err());
        assert!(validate_email("spaces in@mail.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ruta12").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secreto1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("corto").is_err());
    }

    #[test]
    fn test_validate_client_code() {
        assert!(validate_client_code("0000101306").is_ok());
        assert!(validate_client_code("INS001").is_ok());

        assert!(validate_client_code("").is_err());
        assert!(validate_client_code("lowercase").is_err());
        assert!(validate_client_code(&"9".repeat(21)).is_err());
    }
}
