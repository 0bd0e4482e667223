//! Line prefix (source) parsing.

/// A borrowed line prefix: `nick!user@host` or a bare server name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRef<'a> {
    /// `nick[!user][@host]`
    Nickname {
        /// The nickname part.
        nick: &'a str,
        /// The user part, if present.
        user: Option<&'a str>,
        /// The host part, if present.
        host: Option<&'a str>,
    },
    /// A server name such as `tmi.twitch.tv`.
    ServerName(&'a str),
}

impl<'a> PrefixRef<'a> {
    /// Parse a raw prefix (without the leading `:`).
    ///
    /// A prefix without `!` or `@` that contains a dot is a server name.
    pub fn parse(raw: &'a str) -> Self {
        let (head, host) = match raw.split_once('@') {
            Some((head, host)) => (head, Some(host)),
            None => (raw, None),
        };
        let (nick, user) = match head.split_once('!') {
            Some((nick, user)) => (nick, Some(user)),
            None => (head, None),
        };

        if user.is_none() && host.is_none() && nick.contains('.') {
            return Self::ServerName(raw);
        }

        Self::Nickname { nick, user, host }
    }

    /// The nickname, if this prefix names a user.
    pub fn nick(&self) -> Option<&'a str> {
        match self {
            Self::Nickname { nick, .. } => Some(nick),
            Self::ServerName(_) => None,
        }
    }
}
