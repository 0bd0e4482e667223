//! Turning protocol lines into typed [`Event`]s.
//!
//! [`MessageParser`] tokenizes a line once, decides from the command whether
//! the client cares about it, and only then asks its strategy to store the
//! line. Lines with commands outside the supported set are a miss (`None`).

pub mod pool;
mod strategy;

use std::borrow::Cow;

use tracing::trace;
use uuid::Uuid;

use crate::message::ParsedLine;
use crate::model::{
    split_badges, strip_action, Badge, ChatMessage, Color, Event, JoinEvent, Notice, NoticeType,
    PartEvent, Ping, RoomStateUpdate, Text, DISABLED,
};
use crate::validation::unprefixed;

use self::pool::BufferPool;
pub use self::strategy::ParsingMode;
use self::strategy::{
    BalancedStrategy, EagerStrategy, Field, ParseStrategy, PooledStrategy, Source,
};

/// Parses lines into events using the storage policy chosen at construction.
///
/// # Examples
///
/// ```
/// use slirc_tmi::{Event, MessageParser, ParsingMode};
///
/// let parser = MessageParser::new(ParsingMode::Balanced);
/// match parser.parse("PING :tmi.twitch.tv") {
///     Some(Event::Ping(ping)) => assert_eq!(ping.reply(), "PONG :tmi.twitch.tv"),
///     other => panic!("unexpected {:?}", other),
/// }
/// assert!(parser.parse(":tmi.twitch.tv 001 justinfan123 :Welcome").is_none());
/// ```
#[derive(Debug)]
pub struct MessageParser {
    strategy: Box<dyn ParseStrategy>,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new(ParsingMode::default())
    }
}

impl MessageParser {
    /// Create a parser for `mode`.
    pub fn new(mode: ParsingMode) -> Self {
        let strategy: Box<dyn ParseStrategy> = match mode {
            ParsingMode::Eager => Box::new(EagerStrategy),
            ParsingMode::Pooled => Box::new(PooledStrategy::default()),
            ParsingMode::Balanced => Box::new(BalancedStrategy),
        };
        Self { strategy }
    }

    /// Create a pooled parser renting from an existing pool.
    pub fn pooled(pool: BufferPool) -> Self {
        Self {
            strategy: Box::new(PooledStrategy { pool }),
        }
    }

    /// The storage policy of this parser.
    pub fn mode(&self) -> ParsingMode {
        self.strategy.mode()
    }

    /// Parse one line.
    ///
    /// Returns `None` for lines that do not tokenize and for commands the
    /// client does not handle.
    pub fn parse(&self, line: &str) -> Option<Event> {
        let parsed = match ParsedLine::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                trace!("unparseable line {:?}: {}", line, e);
                return None;
            }
        };

        let event = match parsed.command {
            "PRIVMSG" => {
                let source = self.strategy.prepare(line);
                Event::ChatMessage(chat_message(&parsed, &source)?)
            }
            "ROOMSTATE" => {
                let source = self.strategy.prepare(line);
                Event::RoomState(room_state(&parsed, &source)?)
            }
            "NOTICE" => {
                let source = self.strategy.prepare(line);
                Event::Notice(notice(&parsed, &source)?)
            }
            "JOIN" => {
                let (username, channel) = membership(&parsed)?;
                Event::Join(JoinEvent { username, channel })
            }
            "PART" => {
                let (username, channel) = membership(&parsed)?;
                Event::Part(PartEvent { username, channel })
            }
            "PING" => Event::Ping(Ping {
                payload: parsed.trailing.or(parsed.param(0)).unwrap_or("").to_owned(),
            }),
            "PONG" => Event::Pong,
            "RECONNECT" => Event::Reconnect,
            _ => return None,
        };

        Some(event)
    }
}

fn flag(value: &str) -> bool {
    value == "1"
}

fn badges(source: &Source<'_>, value: &Cow<'_, str>) -> Vec<Badge> {
    let badge = |name: &str, level: &str| match value {
        Cow::Borrowed(_) => Badge {
            name: source.text(Field::Small, name),
            level: source.text(Field::Small, level),
        },
        Cow::Owned(_) => Badge {
            name: Text::owned(name),
            level: Text::owned(level),
        },
    };
    split_badges(value)
        .map(|(name, level)| badge(name, level))
        .collect()
}

fn chat_message(parsed: &ParsedLine<'_>, source: &Source<'_>) -> Option<ChatMessage> {
    let channel = unprefixed(parsed.param(0)?);
    let raw_text = parsed.trailing.unwrap_or("");
    let (text, is_action) = strip_action(raw_text);
    let username = parsed.prefix().and_then(|p| p.nick()).unwrap_or("");

    let mut msg = ChatMessage {
        badge_info: Vec::new(),
        badges: Vec::new(),
        color: Color::DEFAULT,
        display_name: Text::default(),
        is_first_message: false,
        id: Uuid::nil(),
        is_moderator: false,
        channel_id: 0,
        is_subscriber: false,
        tmi_sent_ts: 0,
        is_turbo: false,
        user_id: 0,
        username: source.text(Field::Small, username),
        channel: source.text(Field::Small, channel),
        message: source.text(Field::Body, text),
        is_action,
    };

    for tag in parsed.tags() {
        let value = tag.value();
        match tag.key {
            "badge-info" => msg.badge_info = badges(source, &value),
            "badges" => msg.badges = badges(source, &value),
            "color" => msg.color = Color::from_tag(&value),
            "display-name" => msg.display_name = source.cow_text(Field::Small, &value),
            "first-msg" => msg.is_first_message = flag(&value),
            "id" => msg.id = Uuid::parse_str(&value).unwrap_or_else(|_| Uuid::nil()),
            "mod" => msg.is_moderator = flag(&value),
            "room-id" => msg.channel_id = value.parse().unwrap_or(0),
            "subscriber" => msg.is_subscriber = flag(&value),
            "tmi-sent-ts" => msg.tmi_sent_ts = value.parse().unwrap_or(0),
            "turbo" => msg.is_turbo = flag(&value),
            "user-id" => msg.user_id = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    Some(msg)
}

fn room_state(parsed: &ParsedLine<'_>, source: &Source<'_>) -> Option<RoomStateUpdate> {
    let channel = unprefixed(parsed.target()?);
    let channel_id = parsed
        .tag("room-id")
        .and_then(|id| id.parse().ok())
        .unwrap_or(0);

    let mut update = RoomStateUpdate::new(source.text(Field::Small, channel), channel_id);
    for tag in parsed.tags() {
        let value = tag.value();
        update = match tag.key {
            "emote-only" => update.with_emote_only(flag(&value)),
            "followers-only" => update.with_followers_only(value.parse().unwrap_or(DISABLED)),
            "r9k" => update.with_r9k(flag(&value)),
            "slow" => update.with_slow_mode(value.parse().unwrap_or(0)),
            "subs-only" => update.with_subs_only(flag(&value)),
            _ => update,
        };
    }

    Some(update)
}

fn notice(parsed: &ParsedLine<'_>, source: &Source<'_>) -> Option<Notice> {
    let target = parsed.param(0)?;
    let kind = parsed
        .tag("msg-id")
        .map(|id| NoticeType::from_msg_id(&id))
        .unwrap_or_default();

    Some(Notice {
        kind,
        channel: source.text(Field::Small, unprefixed(target)),
        message: source.text(Field::Body, parsed.trailing.unwrap_or("")),
    })
}

fn membership(parsed: &ParsedLine<'_>) -> Option<(String, String)> {
    let username = parsed.prefix()?.nick()?;
    let channel = unprefixed(parsed.target()?);
    Some((username.to_owned(), channel.to_owned()))
}
