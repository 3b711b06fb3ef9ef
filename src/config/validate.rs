//! Field validation for wizard input.
//!
//! Rules are keyed off the configuration key's shape. Sanitization is a
//! whitespace trim; the trimmed value is what gets persisted.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("control characters are not allowed")]
    ControlChars,

    #[error("must be a port between 1 and 65535")]
    Port,

    #[error("must look like scheme://host")]
    Url,

    #[error("must be an email address")]
    Email,
}

/// Validate a raw field value for `key`, returning the sanitized value.
pub fn validate(key: &str, raw: &str) -> Result<String, ValidateError> {
    let value = raw.trim();
    if value.chars().any(|c| c.is_control()) {
        return Err(ValidateError::ControlChars);
    }

    let upper = key.to_ascii_uppercase();
    if upper.contains("PORT") {
        match value.parse::<u16>() {
            Ok(port) if port > 0 => {}
            _ => return Err(ValidateError::Port),
        }
    } else if upper.ends_with("_URL") || upper == "URL" {
        let Some((scheme, rest)) = value.split_once("://") else {
            return Err(ValidateError::Url);
        };
        if scheme.is_empty() || rest.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidateError::Url);
        }
    } else if upper.contains("EMAIL") {
        let mut parts = value.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let domain = parts.next().unwrap_or("");
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(ValidateError::Email);
        }
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        assert_eq!(validate("NAME", "  web  ").unwrap(), "web");
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(
            validate("NAME", "a\x1bb"),
            Err(ValidateError::ControlChars)
        );
    }

    #[test]
    fn port_in_range_passes() {
        assert_eq!(validate("HTTP_PORT", "8080").unwrap(), "8080");
    }

    #[test]
    fn port_out_of_range_fails() {
        assert_eq!(validate("PORT", "99999"), Err(ValidateError::Port));
        assert_eq!(validate("PORT", "0"), Err(ValidateError::Port));
        assert_eq!(validate("PORT", "eighty"), Err(ValidateError::Port));
    }

    #[test]
    fn url_shape_checked() {
        assert!(validate("API_URL", "https://api.local").is_ok());
        assert_eq!(validate("API_URL", "api.local"), Err(ValidateError::Url));
        assert_eq!(validate("API_URL", "://host"), Err(ValidateError::Url));
    }

    #[test]
    fn email_shape_checked() {
        assert!(validate("ADMIN_EMAIL", "ops@example.com").is_ok());
        assert_eq!(
            validate("ADMIN_EMAIL", "not-an-email"),
            Err(ValidateError::Email)
        );
        assert_eq!(validate("ADMIN_EMAIL", "@host"), Err(ValidateError::Email));
    }

    #[test]
    fn unclassified_keys_pass_through() {
        assert_eq!(validate("ANYTHING", "whatever value").unwrap(), "whatever value");
    }
}
