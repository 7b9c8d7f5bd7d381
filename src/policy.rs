//! Credential policy checks applied before anything is hashed or stored.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PolicyError;

pub const USERNAME_MIN_LENGTH: usize = 2;
pub const USERNAME_MAX_LENGTH: usize = 50;
pub const PASSWORD_MIN_LENGTH: usize = 12;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

/// Characters that satisfy the password special-character requirement.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-={}[]|\\:;'\"<>,./?`~";

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Validate a username. Surrounding whitespace is rejected outright rather
/// than trimmed away, so what the caller registers is exactly what is stored.
pub fn validate_username(username: &str) -> Result<(), PolicyError> {
    if username != username.trim() {
        return Err(PolicyError::LeadingOrTrailingWhitespace);
    }

    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(PolicyError::InvalidLength);
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(PolicyError::InvalidCharacter);
    }

    Ok(())
}

/// Validate password strength. Returns the first unmet requirement.
pub fn validate_password(password: &str) -> Result<(), PolicyError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(PolicyError::TooShort);
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(PolicyError::MissingUppercase);
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(PolicyError::MissingLowercase);
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyError::MissingDigit);
    }

    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PolicyError::MissingSpecialChar);
    }

    Ok(())
}

/// Validate an email address shape.
pub fn validate_email(email: &str) -> Result<(), PolicyError> {
    if email.is_empty() || email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(PolicyError::InvalidEmail);
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(PolicyError::InvalidEmail);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_usernames() {
        let longest = "a".repeat(50);
        for username in [
            "jo",
            "john_doe_123",
            "username-with-hyphens",
            "USERNAME_WITH_UPPERCASE",
            "_leading_underscore",
            "trailing_underscore_",
            longest.as_str(),
        ] {
            assert!(validate_username(username).is_ok(), "{username:?}");
        }
    }

    #[test]
    fn rejects_bad_username_lengths() {
        assert_eq!(validate_username(""), Err(PolicyError::InvalidLength));
        assert_eq!(validate_username("a"), Err(PolicyError::InvalidLength));
        assert_eq!(
            validate_username(&"a".repeat(51)),
            Err(PolicyError::InvalidLength)
        );
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        assert_eq!(
            validate_username(" user"),
            Err(PolicyError::LeadingOrTrailingWhitespace)
        );
        assert_eq!(
            validate_username("user "),
            Err(PolicyError::LeadingOrTrailingWhitespace)
        );
    }

    #[test]
    fn rejects_usernames_with_invalid_characters() {
        for username in ["user name", "user.name", "user@name", "user!", "user/name"] {
            assert_eq!(
                validate_username(username),
                Err(PolicyError::InvalidCharacter),
                "{username:?}"
            );
        }
    }

    #[test]
    fn accepts_strong_passwords() {
        for password in [
            "Str0ngP@ssw0rd!",
            "MySuperPassword$1234",
            "sS#fdasrongPassword123!",
        ] {
            assert!(validate_password(password).is_ok(), "{password:?}");
        }
    }

    #[test]
    fn rejects_short_passwords() {
        assert_eq!(validate_password("p@Ssw0rd"), Err(PolicyError::TooShort));
        assert_eq!(
            validate_password(&"a".repeat(11)),
            Err(PolicyError::TooShort)
        );
    }

    #[test]
    fn rejects_missing_character_classes() {
        assert_eq!(
            validate_password("alllowercase1!"),
            Err(PolicyError::MissingUppercase)
        );
        assert_eq!(
            validate_password("ALLUPPERCASE1!"),
            Err(PolicyError::MissingLowercase)
        );
        assert_eq!(
            validate_password("NoDigitsHere!!"),
            Err(PolicyError::MissingDigit)
        );
        assert_eq!(
            validate_password("NoSpecials1234"),
            Err(PolicyError::MissingSpecialChar)
        );
    }

    #[test]
    fn validates_email_shapes() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        for email in ["", "notanemail", "test@", "test@example", "@example.com"] {
            assert_eq!(validate_email(email), Err(PolicyError::InvalidEmail), "{email:?}");
        }
    }
}
