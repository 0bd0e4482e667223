//! Chat messages (`PRIVMSG`).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Badge, Color, Text};

/// A chat message received in a channel.
///
/// String fields may be views into the line buffer the message was parsed
/// from. Under [`ParsingMode::Pooled`](crate::ParsingMode::Pooled) that
/// buffer goes back to the parser's pool once every view is dropped, so a
/// consumer that keeps messages around should call
/// [`into_owned`](Self::into_owned) first.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChatMessage {
    /// Extra badge metadata (`badge-info`), e.g. exact subscription months.
    pub badge_info: Vec<Badge>,
    /// Badges displayed next to the user's name, in order.
    pub badges: Vec<Badge>,
    /// The user's display color.
    pub color: Color,
    /// The user's display name, with original capitalization.
    pub display_name: Text,
    /// Whether this is the user's first message in the channel.
    pub is_first_message: bool,
    /// Unique id of the message; nil when the tag was missing or malformed.
    pub id: Uuid,
    /// Whether the user is a moderator in the channel.
    pub is_moderator: bool,
    /// Numeric id of the channel owner.
    pub channel_id: u64,
    /// Whether the user is subscribed to the channel.
    pub is_subscriber: bool,
    /// Server timestamp in milliseconds since the Unix epoch.
    pub tmi_sent_ts: i64,
    /// Whether the user has Turbo.
    pub is_turbo: bool,
    /// Numeric id of the user.
    pub user_id: u64,
    /// Login name of the user, lower case.
    pub username: Text,
    /// Channel name, lower case and without `#`.
    pub channel: Text,
    /// Message text, with any `ACTION` wrapper removed.
    pub message: Text,
    /// Whether the message was sent as a `/me` action.
    pub is_action: bool,
}

impl ChatMessage {
    /// The server timestamp as a date-time, if it is in range.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.tmi_sent_ts)
    }

    /// Whether the user carries the badge `name`.
    pub fn has_badge(&self, name: &str) -> bool {
        self.badges.iter().any(|b| b.name == name)
    }

    /// Detach every string field from the line buffer.
    #[must_use]
    pub fn into_owned(self) -> Self {
        Self {
            badge_info: self.badge_info.into_iter().map(Badge::into_owned).collect(),
            badges: self.badges.into_iter().map(Badge::into_owned).collect(),
            display_name: self.display_name.into_owned(),
            username: self.username.into_owned(),
            channel: self.channel.into_owned(),
            message: self.message.into_owned(),
            ..self
        }
    }
}

/// Strip a CTCP `ACTION` wrapper (`\x01ACTION text\x01`).
///
/// Returns the inner text and whether a wrapper was found.
pub(crate) fn strip_action(text: &str) -> (&str, bool) {
    let inner = text
        .strip_prefix("\x01ACTION")
        .and_then(|rest| rest.strip_suffix('\x01'));

    match inner {
        Some(rest) if rest.is_empty() => ("", true),
        Some(rest) => match rest.strip_prefix(' ') {
            Some(body) => (body, true),
            None => (text, false),
        },
        None => (text, false),
    }
}
