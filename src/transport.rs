//! Async line transport over TCP, TLS or WebSocket.
//!
//! A [`Transport`] is produced by a [`Connector`] and immediately split into
//! a [`TransportReader`] owned by the receive loop and a [`TransportWriter`]
//! shared behind the connection's write lock.

mod codec;
mod connector;
mod error;

use std::collections::VecDeque;
use std::fmt;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::warn;

use crate::error::ProtocolError;

pub use self::codec::{sanitize, validate_line, TmiCodec, MAX_LINE_LEN};
pub use self::connector::{Connector, NetworkConnector};
pub use self::error::TransportReadError;

/// IRC host for plain and TLS connections.
pub const IRC_HOST: &str = "irc.chat.twitch.tv";
/// WebSocket host.
pub const WS_HOST: &str = "irc-ws.chat.twitch.tv";
/// Plain IRC port.
pub const IRC_PORT: u16 = 6667;
/// TLS IRC port.
pub const IRC_TLS_PORT: u16 = 6697;
/// Plain WebSocket port.
pub const WS_PORT: u16 = 80;
/// TLS WebSocket port.
pub const WSS_PORT: u16 = 443;

/// Which wire protocol carries the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransportKind {
    /// Raw TCP, optionally wrapped in TLS.
    #[default]
    Tcp,
    /// WebSocket text frames.
    WebSocket,
}

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Wire protocol.
    pub kind: TransportKind,
    /// Host name, also used for TLS server name indication.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Whether to wrap the connection in TLS.
    pub tls: bool,
}

impl Endpoint {
    /// The public chat endpoint for `kind`, with or without TLS.
    pub fn public(kind: TransportKind, tls: bool) -> Self {
        let (host, port) = match (kind, tls) {
            (TransportKind::Tcp, false) => (IRC_HOST, IRC_PORT),
            (TransportKind::Tcp, true) => (IRC_HOST, IRC_TLS_PORT),
            (TransportKind::WebSocket, false) => (WS_HOST, WS_PORT),
            (TransportKind::WebSocket, true) => (WS_HOST, WSS_PORT),
        };
        Self {
            kind,
            host: host.to_owned(),
            port,
            tls,
        }
    }

    /// The WebSocket URL for this endpoint.
    pub fn url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransportKind::Tcp => write!(f, "{}:{}", self.host, self.port),
            TransportKind::WebSocket => f.write_str(&self.url()),
        }
    }
}

/// Any byte stream a line transport can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

/// Boxed byte stream: TCP, TLS, or an in-memory pipe in tests.
pub type BoxedStream = Box<dyn AsyncStream>;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An established connection, before it is split.
pub enum Transport {
    /// CRLF-delimited lines over a byte stream.
    Lines {
        /// The underlying stream.
        stream: BoxedStream,
        /// Framing codec.
        codec: TmiCodec,
    },
    /// Lines inside WebSocket text frames.
    WebSocket {
        /// The WebSocket stream.
        stream: Box<WsStream>,
        /// Maximum accepted line length.
        max_len: usize,
    },
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lines { codec, .. } => f.debug_struct("Lines").field("codec", codec).finish(),
            Self::WebSocket { max_len, .. } => {
                f.debug_struct("WebSocket").field("max_len", max_len).finish()
            }
        }
    }
}

impl Transport {
    /// Frame lines over any byte stream.
    pub fn lines<S: AsyncStream + 'static>(stream: S, max_len: usize) -> Self {
        Self::Lines {
            stream: Box::new(stream),
            codec: TmiCodec::new(max_len),
        }
    }

    /// Carry lines over an established WebSocket.
    pub fn websocket(stream: WsStream, max_len: usize) -> Self {
        Self::WebSocket {
            stream: Box::new(stream),
            max_len,
        }
    }

    /// Split into independently owned read and write halves.
    pub fn split(self) -> (TransportReader, TransportWriter) {
        match self {
            Self::Lines { stream, codec } => {
                let (r, w) = tokio::io::split(stream);
                (
                    TransportReader::Lines(FramedRead::new(r, codec.clone())),
                    TransportWriter::Lines(FramedWrite::new(w, codec)),
                )
            }
            Self::WebSocket { stream, max_len } => {
                let (sink, stream) = (*stream).split();
                (
                    TransportReader::WebSocket {
                        stream,
                        pending: VecDeque::new(),
                        max_len,
                    },
                    TransportWriter::WebSocket(sink),
                )
            }
        }
    }
}

/// Read half of a split [`Transport`].
pub enum TransportReader {
    /// Framed byte stream.
    Lines(FramedRead<ReadHalf<BoxedStream>, TmiCodec>),
    /// WebSocket frames; one frame may carry several lines.
    WebSocket {
        /// Frame stream.
        stream: SplitStream<WsStream>,
        /// Lines of the last frame not yet handed out.
        pending: VecDeque<String>,
        /// Maximum accepted line length.
        max_len: usize,
    },
}

impl fmt::Debug for TransportReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lines(_) => f.write_str("TransportReader::Lines"),
            Self::WebSocket { .. } => f.write_str("TransportReader::WebSocket"),
        }
    }
}

impl TransportReader {
    /// Read the next line, without terminator.
    ///
    /// Returns `Ok(None)` once the peer closed the connection.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportReadError> {
        match self {
            Self::Lines(framed) => match framed.next().await {
                Some(Ok(line)) => Ok(Some(line)),
                Some(Err(e)) => Err(TransportReadError::from(e)),
                None => Ok(None),
            },
            Self::WebSocket {
                stream,
                pending,
                max_len,
            } => loop {
                if let Some(line) = pending.pop_front() {
                    return Ok(Some(line));
                }

                match stream.next().await {
                    Some(Ok(WsMessage::Text(text))) => {
                        for line in text.split('\n') {
                            match validate_line(line, *max_len) {
                                Ok("") => {}
                                Ok(line) => pending.push_back(line.to_owned()),
                                Err(e) => warn!("dropping inbound line: {}", e),
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                    Some(Ok(WsMessage::Binary(_))) => {
                        warn!("ignoring binary WebSocket frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(ProtocolError::WebSocket(e.to_string()).into());
                    }
                }
            },
        }
    }
}

/// Write half of a split [`Transport`].
pub enum TransportWriter {
    /// Framed byte stream.
    Lines(FramedWrite<WriteHalf<BoxedStream>, TmiCodec>),
    /// WebSocket sink.
    WebSocket(SplitSink<WsStream, WsMessage>),
}

impl fmt::Debug for TransportWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lines(_) => f.write_str("TransportWriter::Lines"),
            Self::WebSocket(_) => f.write_str("TransportWriter::WebSocket"),
        }
    }
}

impl TransportWriter {
    /// Write one line; the terminator is added here.
    pub async fn write_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        match self {
            Self::Lines(framed) => framed.send(line.to_owned()).await,
            Self::WebSocket(sink) => {
                let line = sanitize(line)?;
                sink.send(WsMessage::Text(line.to_owned()))
                    .await
                    .map_err(|e| ProtocolError::WebSocket(e.to_string()))
            }
        }
    }

    /// Flush and close the write side.
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        match self {
            Self::Lines(framed) => framed.close().await,
            Self::WebSocket(sink) => sink
                .close()
                .await
                .map_err(|e| ProtocolError::WebSocket(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_endpoints() {
        let plain = Endpoint::public(TransportKind::Tcp, false);
        assert_eq!(plain.to_string(), "irc.chat.twitch.tv:6667");
        let tls = Endpoint::public(TransportKind::Tcp, true);
        assert_eq!(tls.port, 6697);

        let ws = Endpoint::public(TransportKind::WebSocket, false);
        assert_eq!(ws.url(), "ws://irc-ws.chat.twitch.tv:80");
        let wss = Endpoint::public(TransportKind::WebSocket, true);
        assert_eq!(wss.url(), "wss://irc-ws.chat.twitch.tv:443");
    }

    #[tokio::test]
    async fn test_lines_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let (mut reader, mut writer) = Transport::lines(client, MAX_LINE_LEN).split();
        let (mut server_reader, mut server_writer) =
            Transport::lines(server, MAX_LINE_LEN).split();

        writer.write_line("NICK justinfan123").await.unwrap();
        assert_eq!(
            server_reader.read_line().await.unwrap().as_deref(),
            Some("NICK justinfan123")
        );

        server_writer.write_line("PING :tmi.twitch.tv").await.unwrap();
        assert_eq!(
            reader.read_line().await.unwrap().as_deref(),
            Some("PING :tmi.twitch.tv")
        );

        server_writer.close().await.unwrap();
        drop(server_writer);
        drop(server_reader);
        assert_eq!(reader.read_line().await.unwrap(), None);
    }
}
