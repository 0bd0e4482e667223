//! Client configuration.

use std::time::Duration;

use crate::caps::Capability;
use crate::parser::ParsingMode;
use crate::transport::{Endpoint, TransportKind, MAX_LINE_LEN};

/// Default bound on establishing a transport.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default wait between dropping a failed link and reconnecting.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(10);
/// Default wait after a reconnect before another one may start.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Options for a [`ChatClient`](crate::ChatClient).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use slirc_tmi::{ClientOptions, ParsingMode, TransportKind};
///
/// let options = ClientOptions::default()
///     .with_transport(TransportKind::WebSocket)
///     .with_parsing_mode(ParsingMode::Pooled)
///     .with_reconnect_backoff(Duration::from_secs(2));
/// assert_eq!(options.endpoint().url(), "wss://irc-ws.chat.twitch.tv:443");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientOptions {
    /// Wrap the connection in TLS.
    pub use_tls: bool,
    /// Raw TCP or WebSocket.
    pub transport: TransportKind,
    /// How parsed events store their strings.
    pub parsing_mode: ParsingMode,
    /// Host override; the public host for the transport otherwise.
    pub host: Option<String>,
    /// Port override; the public port for transport and TLS otherwise.
    pub port: Option<u16>,
    /// Bound on establishing the transport.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub connect_timeout: Duration,
    /// Wait between closing a failed link and reconnecting.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub reconnect_backoff: Duration,
    /// Wait after a reconnect before another one may start.
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub settle_delay: Duration,
    /// Longest accepted line, terminator included.
    pub max_line_len: usize,
    /// Capabilities requested in the handshake.
    pub capabilities: Vec<Capability>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            use_tls: true,
            transport: TransportKind::default(),
            parsing_mode: ParsingMode::default(),
            host: None,
            port: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_line_len: MAX_LINE_LEN,
            capabilities: Capability::defaults(),
        }
    }
}

impl ClientOptions {
    /// Enable or disable TLS.
    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Choose the wire transport.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Choose the parsing strategy.
    #[must_use]
    pub fn with_parsing_mode(mut self, mode: ParsingMode) -> Self {
        self.parsing_mode = mode;
        self
    }

    /// Connect to `host:port` instead of the public endpoint.
    #[must_use]
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Bound the transport setup.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Wait between closing a failed link and reconnecting.
    #[must_use]
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Wait after a reconnect before another one may start.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Longest accepted line.
    #[must_use]
    pub fn with_max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }

    /// Replace the requested capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, caps: Vec<Capability>) -> Self {
        self.capabilities = caps;
        self
    }

    /// The endpoint these options point at.
    pub fn endpoint(&self) -> Endpoint {
        let mut endpoint = Endpoint::public(self.transport, self.use_tls);
        if let Some(host) = &self.host {
            endpoint.host.clone_from(host);
        }
        if let Some(port) = self.port {
            endpoint.port = port;
        }
        endpoint
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
