//! Outgoing command lines.
//!
//! [`Outgoing`] is the closed set of lines the client writes. It formats
//! straight into any [`fmt::Write`] without an intermediate message type;
//! framing (CRLF) is left to the transport.
//!
//! # Example
//!
//! ```
//! use slirc_tmi::encode::Outgoing;
//!
//! let line = Outgoing::Privmsg { channel: "#lbnshlfe", text: "xd xd xd" }.to_string();
//! assert_eq!(line, "PRIVMSG #lbnshlfe :xd xd xd");
//! ```

use std::fmt::{self, Write};

use crate::caps::{format_list, Capability};
use crate::credentials::OAuthToken;

/// A line the client sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outgoing<'a> {
    /// `CAP REQ :<caps>`
    CapReq(&'a [Capability]),
    /// `PASS oauth:<token>`
    Pass(&'a OAuthToken),
    /// `NICK <login>`
    Nick(&'a str),
    /// `JOIN #<channel>`
    Join(&'a str),
    /// `PART #<channel>`
    Part(&'a str),
    /// `PRIVMSG #<channel> :<text>`
    Privmsg {
        /// Prefixed channel name.
        channel: &'a str,
        /// Message text.
        text: &'a str,
    },
    /// `PONG :<payload>`
    Pong(&'a str),
    /// A caller-supplied line, sent as is.
    Raw(&'a str),
}

impl Outgoing<'_> {
    /// Whether the line carries a credential and must not be logged verbatim.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    /// The line with credentials masked, for logs and sent-line notifications.
    pub fn redacted(&self) -> String {
        if self.is_sensitive() {
            "PASS oauth:***".to_owned()
        } else {
            self.to_string()
        }
    }
}

/// Check if a string needs colon-prefixing as a trailing argument.
#[inline]
pub(crate) fn needs_colon_prefix(s: &str) -> bool {
    s.is_empty() || s.contains(' ') || s.starts_with(':')
}

/// Write a command with arguments. The last argument gets a `:` prefix if needed.
pub(crate) fn write_cmd<W: Write>(w: &mut W, cmd: &str, args: &[&str]) -> fmt::Result {
    w.write_str(cmd)?;

    let Some((trailing, middle)) = args.split_last() else {
        return Ok(());
    };

    for param in middle {
        w.write_char(' ')?;
        w.write_str(param)?;
    }

    w.write_char(' ')?;
    if needs_colon_prefix(trailing) {
        w.write_char(':')?;
    }
    w.write_str(trailing)
}

/// Write a command with a freeform (always colon-prefixed) trailing argument.
pub(crate) fn write_cmd_freeform<W: Write>(w: &mut W, cmd: &str, args: &[&str]) -> fmt::Result {
    w.write_str(cmd)?;

    let Some((last, middle)) = args.split_last() else {
        return Ok(());
    };

    for arg in middle {
        w.write_char(' ')?;
        w.write_str(arg)?;
    }

    w.write_str(" :")?;
    w.write_str(last)
}

impl fmt::Display for Outgoing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapReq(caps) => write!(f, "CAP REQ :{}", format_list(caps)),
            Self::Pass(token) => write_cmd(f, "PASS", &[&token.pass()]),
            Self::Nick(login) => write_cmd(f, "NICK", &[login]),
            Self::Join(channel) => write_cmd(f, "JOIN", &[channel]),
            Self::Part(channel) => write_cmd(f, "PART", &[channel]),
            Self::Privmsg { channel, text } => write_cmd_freeform(f, "PRIVMSG", &[channel, text]),
            Self::Pong(payload) => write_cmd_freeform(f, "PONG", &[payload]),
            Self::Raw(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_lines() {
        let caps = Capability::defaults();
        assert_eq!(
            Outgoing::CapReq(&caps).to_string(),
            "CAP REQ :twitch.tv/commands twitch.tv/tags twitch.tv/membership"
        );
        assert_eq!(Outgoing::Nick("justinfan123").to_string(), "NICK justinfan123");

        let token = OAuthToken::new("oauth:ABCDEFGHIJKLMNOPQRSTUVWXYZ0123").unwrap();
        let pass = Outgoing::Pass(&token);
        assert_eq!(pass.to_string(), "PASS oauth:abcdefghijklmnopqrstuvwxyz0123");
        assert!(pass.is_sensitive());
        assert_eq!(pass.redacted(), "PASS oauth:***");
    }

    #[test]
    fn test_channel_lines() {
        assert_eq!(Outgoing::Join("#lbnshlfe").to_string(), "JOIN #lbnshlfe");
        assert_eq!(Outgoing::Part("#lbnshlfe").to_string(), "PART #lbnshlfe");
        assert_eq!(
            Outgoing::Privmsg {
                channel: "#lbnshlfe",
                text: ":)"
            }
            .to_string(),
            "PRIVMSG #lbnshlfe ::)"
        );
    }

    #[test]
    fn test_pong_keeps_payload() {
        assert_eq!(Outgoing::Pong("tmi.twitch.tv").to_string(), "PONG :tmi.twitch.tv");
        assert_eq!(Outgoing::Pong("").to_string(), "PONG :");
    }

    #[test]
    fn test_write_cmd_colon_rules() {
        let mut s = String::new();
        write_cmd(&mut s, "TOPIC", &["#a", "two words"]).unwrap();
        assert_eq!(s, "TOPIC #a :two words");

        let mut s = String::new();
        write_cmd(&mut s, "RECONNECT", &[]).unwrap();
        assert_eq!(s, "RECONNECT");
    }
}
