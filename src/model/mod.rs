//! Typed events parsed from protocol lines.

mod badge;
mod chat_message;
mod color;
mod membership;
mod notice;
mod ping;
mod room_state;
mod text;

pub use self::badge::Badge;
pub use self::chat_message::ChatMessage;
pub use self::color::Color;
pub use self::membership::{JoinEvent, PartEvent};
pub use self::notice::{Notice, NoticeType};
pub use self::ping::{Ping, PONG_PREFIX};
pub use self::room_state::{RoomStateFlags, RoomStateUpdate, DISABLED};
pub use self::text::Text;

pub(crate) use self::badge::split_badges;
pub(crate) use self::chat_message::strip_action;

/// One parsed protocol line of a kind the client understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `PRIVMSG`
    ChatMessage(ChatMessage),
    /// `ROOMSTATE`
    RoomState(RoomStateUpdate),
    /// `JOIN`
    Join(JoinEvent),
    /// `PART`
    Part(PartEvent),
    /// `NOTICE`
    Notice(Notice),
    /// `PING`, which must be answered with [`Ping::reply`].
    Ping(Ping),
    /// `PONG`, the answer to a client-initiated ping.
    Pong,
    /// `RECONNECT`: the server is about to drop the connection.
    Reconnect,
}

impl Event {
    /// Detach every string field from the line buffer.
    #[must_use]
    pub fn into_owned(self) -> Self {
        match self {
            Self::ChatMessage(m) => Self::ChatMessage(m.into_owned()),
            Self::RoomState(r) => Self::RoomState(r.into_owned()),
            Self::Notice(n) => Self::Notice(n.into_owned()),
            other => other,
        }
    }
}
