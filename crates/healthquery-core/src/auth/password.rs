/// Shown when a password fails the local shape check
pub const PASSWORD_RULE_MESSAGE: &str = "Password must be 8+ chars, 1 uppercase, 1 special char.";

/// Shown when the username field is blank
pub const USERNAME_REQUIRED_MESSAGE: &str = "Username is required.";

/// Minimum password length, in characters
const MIN_PASSWORD_LENGTH: usize = 8;

/// Client-side password shape check.
///
/// Accepts 8+ characters with at least one ASCII upper-case letter and at
/// least one character outside `[A-Za-z0-9]`. This is a UX guard only; the
/// auth service is the authority.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_password() {
        assert!(validate_password("Abcdef1!"));
        assert!(validate_password("Correct Horse"));
        assert!(validate_password("PASSWORD_"));
    }

    #[test]
    fn test_rejects_missing_uppercase_and_special() {
        assert!(!validate_password("abcdefg1"));
    }

    #[test]
    fn test_rejects_short() {
        assert!(!validate_password("Ab1!"));
        assert!(!validate_password("Abcde1!"));
        assert!(!validate_password(""));
    }

    #[test]
    fn test_rejects_missing_uppercase() {
        assert!(!validate_password("abcdef1!"));
    }

    #[test]
    fn test_rejects_missing_special() {
        assert!(!validate_password("Abcdefg1"));
        assert!(!validate_password("ABCDEFGH"));
    }

    #[test]
    fn test_non_ascii_counts_as_special() {
        assert!(validate_password("Abcdefgé"));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 7 chars, 9 bytes
        assert!(!validate_password("Abcdeéé"));
    }
}
