//! Login credentials.

use std::fmt;

use crate::error::FormatError;

/// Literal prefix the service expects in front of the token in `PASS`.
pub const OAUTH_PREFIX: &str = "oauth:";

const TOKEN_LEN: usize = 30;

/// A validated OAuth token.
///
/// Construction accepts 30 alphanumeric characters, optionally prefixed with
/// `oauth:` in any case; the stored form is lower case without the prefix.
/// The token is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthToken {
    token: String,
}

impl OAuthToken {
    /// Validate and normalize a token.
    ///
    /// # Examples
    ///
    /// ```
    /// use slirc_tmi::OAuthToken;
    ///
    /// let token = OAuthToken::new("oauth:ABCDEFGHIJKLMNOPQRSTUVWXYZ0123").unwrap();
    /// assert_eq!(token.pass(), "oauth:abcdefghijklmnopqrstuvwxyz0123");
    /// assert!(OAuthToken::new("too-short").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, FormatError> {
        let bare = match raw.get(..OAUTH_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(OAUTH_PREFIX) => &raw[OAUTH_PREFIX.len()..],
            _ => raw,
        };

        if bare.len() != TOKEN_LEN || !bare.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(FormatError::OAuthToken);
        }

        Ok(Self {
            token: bare.to_ascii_lowercase(),
        })
    }

    /// The token without prefix.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The value sent with `PASS`, `oauth:` prefix included.
    pub fn pass(&self) -> String {
        format!("{}{}", OAUTH_PREFIX, self.token)
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OAuthToken(<redacted>)")
    }
}

impl std::str::FromStr for OAuthToken {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
