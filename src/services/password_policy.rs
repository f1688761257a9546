//! Pure password-format validation driven by `[security.password]` config.

use crate::config::PasswordPolicyConfig;

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    config: PasswordPolicyConfig,
}

impl PasswordPolicy {
    #[must_use]
    pub const fn new(config: PasswordPolicyConfig) -> Self {
        Self { config }
    }

    /// Checks a candidate password against the configured rules.
    /// No side effects; callers surface [`Self::message`] on `false`.
    #[must_use]
    pub fn is_valid(&self, password: &str) -> bool {
        let len = password.chars().count();
        if len < self.config.min_length || len > self.config.max_length {
            return false;
        }

        if self.config.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return false;
        }

        if self.config.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return false;
        }

        if self.config.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }

        if self.config.require_special
            && !password.chars().any(|c| !c.is_ascii_alphanumeric())
        {
            return false;
        }

        true
    }

    /// The configured human-readable rejection message. Registration and
    /// password reset both surface exactly this string.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.config.invalid_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PasswordPolicy {
        PasswordPolicy::new(PasswordPolicyConfig::default())
    }

    #[test]
    fn accepts_conforming_password() {
        assert!(policy().is_valid("Abcdef12"));
        assert!(policy().is_valid("XyzzyPlugh99"));
    }

    #[test]
    fn rejects_length_violations() {
        assert!(!policy().is_valid("Ab1"));
        assert!(!policy().is_valid("Abcdefgh1234567890"));
    }

    #[test]
    fn rejects_missing_character_classes() {
        assert!(!policy().is_valid("abcdefg1")); // no uppercase
        assert!(!policy().is_valid("ABCDEFG1")); // no lowercase
        assert!(!policy().is_valid("Abcdefgh")); // no digit
    }

    #[test]
    fn special_characters_only_required_when_configured() {
        let mut config = PasswordPolicyConfig::default();
        config.require_special = true;
        let strict = PasswordPolicy::new(config);

        assert!(!strict.is_valid("Abcdef12"));
        assert!(strict.is_valid("Abcdef1!"));
    }
}
