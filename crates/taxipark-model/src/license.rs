use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::ValidationError;

pub const LICENSE_LEN: usize = 8;
pub const LICENSE_PREFIX_LEN: usize = 3;
pub const LICENSE_DIGITS: usize = 5;

/// A driver license number: exactly 8 characters, 3 ASCII uppercase letters
/// followed by 5 decimal digits (e.g. `ABC12345`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct LicenseNumber(String);

impl LicenseNumber {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != LICENSE_LEN {
            return Err(ValidationError(format!(
                "license number must be exactly {LICENSE_LEN} characters long"
            )));
        }
        if !chars[..LICENSE_PREFIX_LEN]
            .iter()
            .all(|c| c.is_ascii_uppercase())
        {
            return Err(ValidationError(format!(
                "first {LICENSE_PREFIX_LEN} characters must be uppercase letters"
            )));
        }
        if !chars[LICENSE_PREFIX_LEN..]
            .iter()
            .all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError(format!(
                "last {LICENSE_DIGITS} characters must be digits"
            )));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LicenseNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_three_uppercase_letters_then_five_digits() {
        assert_eq!(
            LicenseNumber::parse("ABC12345").map(|l| l.to_string()),
            Ok("ABC12345".to_string())
        );
        assert!(LicenseNumber::parse("DEF67890").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(LicenseNumber::parse("BAD").is_err());
        assert!(LicenseNumber::parse("ABC123456").is_err());
        assert!(LicenseNumber::parse("").is_err());
    }

    #[test]
    fn rejects_misplaced_letter_digit_boundary() {
        // Correct length, wrong shape.
        assert!(LicenseNumber::parse("WRONG123").is_err());
        assert!(LicenseNumber::parse("AB123456").is_err());
        assert!(LicenseNumber::parse("ABCD1234").is_err());
    }

    #[test]
    fn rejects_lowercase_prefix_and_nondigit_suffix() {
        assert!(LicenseNumber::parse("abc12345").is_err());
        assert!(LicenseNumber::parse("ABC12E45").is_err());
        assert!(LicenseNumber::parse("AБC12345").is_err());
    }
}
