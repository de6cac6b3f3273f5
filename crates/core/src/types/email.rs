//! Customer email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced by [`Email::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must have the form local@domain")]
    Malformed,
}

/// A trimmed email address with a non-empty local part and a dotted domain.
///
/// The domain is lowercased; the local part is kept as given since some
/// providers treat it case-sensitively.
///
/// ```
/// use wear_with_pride_core::Email;
///
/// let email = Email::parse("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Ada@example.com");
/// assert!(Email::parse("ada@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalise an email address.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is empty, too long, or not of the form
    /// `local@domain.tld`.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.rsplit_once('@').ok_or(EmailError::Malformed)?;
        let domain_ok = domain
            .split('.')
            .all(|label| !label.is_empty() && !label.contains(char::is_whitespace))
            && domain.contains('.');
        if local.is_empty() || local.contains(char::is_whitespace) || !domain_ok {
            return Err(EmailError::Malformed);
        }

        Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_parts() {
        assert_eq!(Email::parse("").unwrap_err(), EmailError::Empty);
        assert_eq!(Email::parse("   ").unwrap_err(), EmailError::Empty);
        assert_eq!(Email::parse("no-at").unwrap_err(), EmailError::Malformed);
        assert_eq!(Email::parse("@shop.ng").unwrap_err(), EmailError::Malformed);
        assert_eq!(Email::parse("ada@").unwrap_err(), EmailError::Malformed);
        assert_eq!(Email::parse("ada@shop.").unwrap_err(), EmailError::Malformed);
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("{}@shop.ng", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long).unwrap_err(),
            EmailError::TooLong { max: 254 }
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"buyer@Shop.NG\"").unwrap();
        assert_eq!(ok.as_str(), "buyer@shop.ng");
        assert!(serde_json::from_str::<Email>("\"buyer\"").is_err());
    }
}
