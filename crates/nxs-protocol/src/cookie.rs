//! Shared authentication cookie

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProtocolError;

/// Authentication secret bound to a display
///
/// Always a non-empty, lowercase hex string. Both the display agent and the
/// proxy must present the same cookie to establish trust.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cookie(String);

impl Cookie {
    /// Validate and wrap a hex cookie
    pub fn new(value: impl Into<String>) -> Result<Self, ProtocolError> {
        let value = value.into().trim().to_ascii_lowercase();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ProtocolError::InvalidCookie(value));
        }
        Ok(Self(value))
    }

    /// Get the hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against another cookie without short-circuiting
    pub fn matches(&self, other: &Cookie) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        let mut result = 0u8;
        for (a, b) in self.0.bytes().zip(other.0.bytes()) {
            result |= a ^ b;
        }
        result == 0
    }
}

// Keep secrets out of logs
impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cookie(<{} hex chars>)", self.0.len())
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Cookie {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cookie> for String {
    fn from(cookie: Cookie) -> Self {
        cookie.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_normalizes_case_and_whitespace() {
        let cookie = Cookie::new("  ABCDEF0123\n").unwrap();
        assert_eq!(cookie.as_str(), "abcdef0123");
    }

    #[test]
    fn test_cookie_rejects_non_hex() {
        assert!(Cookie::new("").is_err());
        assert!(Cookie::new("xyz").is_err());
        assert!(Cookie::new("abc def").is_err());
    }

    #[test]
    fn test_cookie_matches() {
        let a = Cookie::new("00ff").unwrap();
        let b = Cookie::new("00FF").unwrap();
        let c = Cookie::new("00fe").unwrap();
        let d = Cookie::new("00ff00").unwrap();
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert!(!a.matches(&d));
    }

    #[test]
    fn test_cookie_debug_hides_secret() {
        let cookie = Cookie::new("deadbeef").unwrap();
        let debug = format!("{:?}", cookie);
        assert!(!debug.contains("deadbeef"));
    }
}
