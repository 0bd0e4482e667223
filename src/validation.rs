//! Input validation for channel names, login names and raw lines.
//!
//! # Channel names
//!
//! Channel names follow the account-name rules of the chat service:
//! ```text
//! ^#?[A-Za-z0-9_]{3,25}$
//! ```
//! They are matched case-insensitively and normalized to lower case. The
//! wire form carries the `#` prefix; the form exposed to consumers does not.
//!
//! # Matchers
//!
//! Patterns are compiled once per [`Validator`], which is owned by the
//! client that uses it. The `regex` crate matches in linear time, and inputs
//! longer than any valid name are rejected before matching.
//!
//! # Control characters
//!
//! At the transport layer most control characters are rejected:
//! ```text
//! ch == '\0' || (ch.is_control() && ch != '\r' && ch != '\n' && ch != '\x01')
//! ```
//! `\x01` stays legal because it delimits CTCP `ACTION` messages.

use regex::Regex;

use crate::error::FormatError;

/// The channel prefix used on the wire.
pub const CHANNEL_PREFIX: char = '#';

/// Longest possible valid channel name, prefix included.
const MAX_CHANNEL_LEN: usize = 26;

const CHANNEL_PATTERN: &str = r"^#?[A-Za-z0-9_]{3,25}$";
const ANONYMOUS_LOGIN_PATTERN: &str = r"(?i)^justinfan[0-9]+$";

/// Compiled matchers for names the client accepts.
#[derive(Debug, Clone)]
pub struct Validator {
    channel: Regex,
    anonymous_login: Regex,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Compile the matchers.
    pub fn new() -> Self {
        Self {
            channel: Regex::new(CHANNEL_PATTERN).expect("channel pattern is valid"),
            anonymous_login: Regex::new(ANONYMOUS_LOGIN_PATTERN)
                .expect("anonymous login pattern is valid"),
        }
    }

    /// Whether `name` is a syntactically valid channel, with or without `#`.
    pub fn is_valid_channel(&self, name: &str) -> bool {
        name.len() <= MAX_CHANNEL_LEN && self.channel.is_match(name)
    }

    /// Whether `login` is one of the service's anonymous (`justinfanNNN`) logins.
    pub fn is_anonymous_login(&self, login: &str) -> bool {
        login.len() <= 64 && self.anonymous_login.is_match(login)
    }

    /// Validate and normalize a channel name to lower case.
    ///
    /// With `prefixed`, the result carries a leading `#`; otherwise any
    /// leading `#` is removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use slirc_tmi::validation::Validator;
    ///
    /// let v = Validator::new();
    /// assert_eq!(v.format_channel("Forsen", true).unwrap(), "#forsen");
    /// assert_eq!(v.format_channel("#Forsen", false).unwrap(), "forsen");
    /// assert!(v.format_channel("a b", true).is_err());
    /// ```
    pub fn format_channel(&self, name: &str, prefixed: bool) -> Result<String, FormatError> {
        if !self.is_valid_channel(name) {
            return Err(FormatError::ChannelName(name.to_string()));
        }

        let bare = name.strip_prefix(CHANNEL_PREFIX).unwrap_or(name);
        let mut out = String::with_capacity(bare.len() + 1);
        if prefixed {
            out.push(CHANNEL_PREFIX);
        }
        out.push_str(&bare.to_ascii_lowercase());
        Ok(out)
    }

    /// Validate and normalize a login name (lower case, no prefix).
    pub fn format_login(&self, login: &str) -> Result<String, FormatError> {
        self.format_channel(login, false)
            .map_err(|_| FormatError::Login(login.to_string()))
    }
}

/// Strip the wire prefix from a channel name, if present.
pub fn unprefixed(channel: &str) -> &str {
    channel.strip_prefix(CHANNEL_PREFIX).unwrap_or(channel)
}

/// Check if a character is illegal according to the transport layer rules.
///
/// # Examples
///
/// ```
/// use slirc_tmi::validation::is_illegal_control_char;
///
/// assert!(is_illegal_control_char('\x00'));
/// assert!(is_illegal_control_char('\x02'));
/// assert!(!is_illegal_control_char('\x01')); // CTCP delimiter
/// assert!(!is_illegal_control_char('\r'));
/// assert!(!is_illegal_control_char('a'));
/// ```
#[inline]
pub fn is_illegal_control_char(c: char) -> bool {
    c == '\0' || (c.is_control() && c != '\r' && c != '\n' && c != '\x01')
}

/// Check if a string contains any illegal control characters.
pub fn contains_illegal_control_chars(s: &str) -> bool {
    s.chars().any(is_illegal_control_char)
}
