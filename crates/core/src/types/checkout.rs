//! Checkout session token.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted token length.
const MAX_LEN: usize = 64;

/// Errors that can occur when parsing a [`CheckoutToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTokenError {
    /// The input string is empty.
    #[error("checkout token cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("checkout token must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9_-]`.
    #[error("checkout token contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Opaque identifier of a browser checkout session.
///
/// Issued by the client (usually a UUID) and used only to key the
/// in-memory shipping state for that checkout.
///
/// ```
/// use tienda_core::CheckoutToken;
///
/// assert!(CheckoutToken::parse("3f1c9e2a-checkout").is_ok());
/// assert!(CheckoutToken::parse("").is_err());
/// assert!(CheckoutToken::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CheckoutToken(String);

impl CheckoutToken {
    /// Parse and validate a checkout token.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutTokenError`] if the token is empty, too long, or
    /// contains characters other than ASCII alphanumerics, `-` and `_`.
    pub fn parse(value: &str) -> Result<Self, CheckoutTokenError> {
        if value.is_empty() {
            return Err(CheckoutTokenError::Empty);
        }
        if value.len() > MAX_LEN {
            return Err(CheckoutTokenError::TooLong { max: MAX_LEN });
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(CheckoutTokenError::InvalidCharacter(bad));
        }
        Ok(Self(value.to_owned()))
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckoutToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CheckoutToken {
    type Error = CheckoutTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CheckoutToken> for String {
    fn from(token: CheckoutToken) -> Self {
        token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_tokens() {
        let token = CheckoutToken::parse("0b6f3c1e-8d2a-4c55-9c1f-5a7e2b9d0f11");
        assert!(token.is_ok());
    }

    #[test]
    fn rejects_long_tokens() {
        let long = "a".repeat(MAX_LEN + 1);
        assert_eq!(
            CheckoutToken::parse(&long),
            Err(CheckoutTokenError::TooLong { max: MAX_LEN })
        );
    }

    #[test]
    fn rejects_path_characters() {
        assert_eq!(
            CheckoutToken::parse("abc/def"),
            Err(CheckoutTokenError::InvalidCharacter('/'))
        );
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<CheckoutToken, _> = serde_json::from_str("\"abc_123\"");
        assert!(ok.is_ok());
        let bad: Result<CheckoutToken, _> = serde_json::from_str("\"a b\"");
        assert!(bad.is_err());
    }
}
