//! Capability requests.
//!
//! The chat server only sends tags, room state and membership lines to
//! connections that asked for the matching capability in the handshake.

use std::fmt;

/// Vendor namespace shared by every capability the server offers.
pub const CAP_NAMESPACE: &str = "twitch.tv/";

/// A capability that can be requested with `CAP REQ`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum Capability {
    /// `twitch.tv/commands`: `RECONNECT`, `ROOMSTATE`, tagged `NOTICE` and friends.
    Commands,
    /// `twitch.tv/tags`: message tags on chat lines.
    Tags,
    /// `twitch.tv/membership`: `JOIN`/`PART` of other users.
    Membership,
    /// Any other capability name.
    Custom(String),
}

impl Capability {
    /// The capabilities the client requests unless configured otherwise.
    pub fn defaults() -> Vec<Self> {
        vec![Self::Commands, Self::Tags, Self::Membership]
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        match self {
            Self::Commands => "twitch.tv/commands",
            Self::Tags => "twitch.tv/tags",
            Self::Membership => "twitch.tv/membership",
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        match s {
            "twitch.tv/commands" => Self::Commands,
            "twitch.tv/tags" => Self::Tags,
            "twitch.tv/membership" => Self::Membership,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl From<String> for Capability {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Capability> for String {
    fn from(cap: Capability) -> Self {
        match cap {
            Capability::Custom(s) => s,
            other => other.as_ref().to_owned(),
        }
    }
}

/// Space-separated capability list, as sent after `CAP REQ :`.
pub fn format_list(caps: &[Capability]) -> String {
    let mut list = String::new();
    for cap in caps {
        if !list.is_empty() {
            list.push(' ');
        }
        list.push_str(cap.as_ref());
    }
    list
}

/// Parse a space-separated capability list from a `CAP ACK`/`CAP NAK` reply.
pub fn parse_list(list: &str) -> impl Iterator<Item = Capability> + '_ {
    list.split_ascii_whitespace().map(Capability::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_as_ref() {
        assert_eq!(Capability::Commands.as_ref(), "twitch.tv/commands");
        assert_eq!(Capability::Custom("foo".into()).as_ref(), "foo");
    }

    #[test]
    fn test_capability_from_str() {
        assert_eq!(Capability::from("twitch.tv/tags"), Capability::Tags);
        assert_eq!(
            Capability::from("twitch.tv/unknown"),
            Capability::Custom("twitch.tv/unknown".into())
        );
    }

    #[test]
    fn test_default_request() {
        assert_eq!(
            format_list(&Capability::defaults()),
            "twitch.tv/commands twitch.tv/tags twitch.tv/membership"
        );
        assert_eq!(format_list(&[]), "");
    }

    #[test]
    fn test_parse_list() {
        let caps: Vec<_> = parse_list("twitch.tv/tags  twitch.tv/membership").collect();
        assert_eq!(caps, vec![Capability::Tags, Capability::Membership]);
    }
}
