//! Password complexity policy.

use std::sync::LazyLock;

use regex::Regex;

/// Characters that satisfy the "special character" requirement.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*";

struct PasswordRules {
    length: Regex,
    lower: Regex,
    upper: Regex,
    digit: Regex,
    special: Regex,
}

impl PasswordRules {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            length: Regex::new(r".{8,}")?,
            lower: Regex::new(r"[a-z]")?,
            upper: Regex::new(r"[A-Z]")?,
            digit: Regex::new(r"[0-9]")?,
            special: Regex::new(r"[!@#$%^&*]")?,
        })
    }

    fn accepts(&self, password: &str) -> bool {
        self.length.is_match(password)
            && self.lower.is_match(password)
            && self.upper.is_match(password)
            && self.digit.is_match(password)
            && self.special.is_match(password)
    }
}

static RULES: LazyLock<Result<PasswordRules, regex::Error>> = LazyLock::new(PasswordRules::new);

/// At least 8 characters with a lowercase letter, an uppercase letter, a digit and one
/// of [`SPECIAL_CHARACTERS`].
pub fn is_acceptable(password: &str) -> bool {
    match &*RULES {
        Ok(rules) => rules.accepts(password),
        Err(e) => {
            tracing::error!(error = %e, "password rules failed to compile");
            false
        }
    }
}
