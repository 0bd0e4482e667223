//! # slirc-tmi
//!
//! The core of a Twitch chat (TMI) client: tag-aware IRC line parsing,
//! room-state tracking and a reconnecting connection.
//!
//! ## Features
//!
//! - Tokenizing of tagged IRC lines with `nom`
//! - Typed events for chat messages, room state, notices and membership
//! - Three parsing strategies trading allocations for buffer lifetime
//! - A channel registry kept current from `ROOMSTATE` updates
//! - Optional Tokio integration: TCP, TLS and WebSocket transports, a
//!   connection with keep-alive handling and single-flight reconnects
//!
//! The parsing half is sans-IO and builds without the `tokio` feature.

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing lines
//!
//! ```rust
//! use slirc_tmi::{Event, MessageParser, ParsingMode};
//!
//! let parser = MessageParser::new(ParsingMode::Balanced);
//! let line = "@room-id=11148817;slow=10 :tmi.twitch.tv ROOMSTATE #pajlada";
//!
//! if let Some(Event::RoomState(update)) = parser.parse(line) {
//!     assert_eq!(update.channel, "pajlada");
//!     assert_eq!(update.slow_mode_seconds, 10);
//! }
//! ```
//!
//! ### Tokenizing raw lines
//!
//! ```rust
//! use slirc_tmi::ParsedLine;
//!
//! let line = ParsedLine::parse(":tmi.twitch.tv CAP * ACK :twitch.tv/tags").unwrap();
//! assert_eq!(line.command, "CAP");
//! assert_eq!(line.trailing, Some("twitch.tv/tags"));
//! ```
//!
//! ### Running a client
//!
//! ```no_run
//! use slirc_tmi::{ChatClient, ClientEvent, ClientOptions};
//!
//! # async fn run() -> slirc_tmi::Result<()> {
//! let client = ChatClient::new("mybot", "oauth:abcdefghijklmnopqrstuvwxyz0123", ClientOptions::default())?;
//! client.subscribe(|event| {
//!     if let ClientEvent::Notice(notice) = event {
//!         println!("{}: {}", notice.channel, notice.message);
//!     }
//! });
//! client.join_channel("lbnshlfe").await?;
//! client.connect().await?;
//! client.send_message("lbnshlfe", "hello").await?;
//! # Ok(())
//! # }
//! ```

pub mod caps;
pub mod channel;
pub mod credentials;
pub mod encode;
pub mod error;
pub mod message;
pub mod model;
pub mod parser;
pub mod prefix;
pub mod state;
pub mod validation;

#[cfg(feature = "tokio")]
pub mod client;
#[cfg(feature = "tokio")]
pub mod config;
#[cfg(feature = "tokio")]
pub mod connection;
#[cfg(feature = "tokio")]
pub mod event;
#[cfg(feature = "tokio")]
pub mod reconnect;
#[cfg(feature = "tokio")]
pub mod transport;

pub use self::caps::Capability;
pub use self::channel::{Channel, ChannelRegistry};
pub use self::credentials::OAuthToken;
pub use self::error::{ClientError, FormatError, MessageParseError, ProtocolError, Result};
pub use self::message::{ParsedLine, TagRef};
pub use self::model::{
    Badge, ChatMessage, Color, Event, JoinEvent, Notice, NoticeType, PartEvent, Ping,
    RoomStateFlags, RoomStateUpdate, Text,
};
pub use self::parser::{MessageParser, ParsingMode};
pub use self::prefix::PrefixRef;
pub use self::state::ConnectionState;
pub use self::validation::Validator;

#[cfg(feature = "tokio")]
pub use self::client::ChatClient;
#[cfg(feature = "tokio")]
pub use self::config::ClientOptions;
#[cfg(feature = "tokio")]
pub use self::event::{ClientEvent, Subscription};
#[cfg(feature = "tokio")]
pub use self::reconnect::{ReconnectCoordinator, ReconnectOutcome};
#[cfg(feature = "tokio")]
pub use self::transport::{Connector, Endpoint, TmiCodec, TransportKind, MAX_LINE_LEN};
