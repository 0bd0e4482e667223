//! A single chat connection.
//!
//! [`Connection`] owns the transport, the handshake and the receive loop.
//! Every parsed line is handed to an [`EventSink`] synchronously from the
//! loop. Link failures are reported through
//! [`EventSink::reconnect_requested`]; the connection never retries on its
//! own.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::caps::parse_list;
use crate::config::ClientOptions;
use crate::credentials::OAuthToken;
use crate::encode::Outgoing;
use crate::error::{ClientError, ProtocolError, Result};
use crate::message::ParsedLine;
use crate::model::Event;
use crate::parser::MessageParser;
use crate::state::{ConnectionState, StateCell};
use crate::transport::{Connector, Endpoint, TransportReader, TransportWriter};
use crate::validation::Validator;

/// Receiver of everything a [`Connection`] observes.
///
/// Callbacks run on the receive loop; they must not block.
pub trait EventSink: Send + Sync {
    /// The handshake was sent and lines are flowing.
    fn connected(&self) {}

    /// The link went down. `reason` is `None` for an explicit close.
    fn disconnected(&self, _reason: Option<&str>) {}

    /// A line arrived, before it is parsed.
    fn raw_received(&self, _line: &str) {}

    /// A line was written, credentials masked.
    fn raw_sent(&self, _line: &str) {}

    /// A line was parsed into an event.
    fn dispatch(&self, event: Event);

    /// The link failed or the server asked for a reconnect.
    fn reconnect_requested(&self, _reason: &str) {}
}

/// Login identity used for the handshake.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Lower-case login name.
    pub login: String,
    /// OAuth token; `None` for anonymous logins.
    pub token: Option<OAuthToken>,
}

/// State shared between the connection and its receive loop.
struct Shared {
    state: StateCell,
    writer: AsyncMutex<Option<TransportWriter>>,
    parser: MessageParser,
    sink: Arc<dyn EventSink>,
    /// Cancels the receive loop of the current session.
    session: Mutex<Option<CancellationToken>>,
}

impl Shared {
    async fn send(&self, cmd: Outgoing<'_>) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ClientError::NotConnected)?;
        if let Err(e) = writer.write_line(&cmd.to_string()).await {
            drop(guard);
            if matches!(e, ProtocolError::Io(_) | ProtocolError::WebSocket(_)) {
                let session = self.session.lock().clone();
                if let Some(session) = session {
                    self.fault(&session, &e.to_string());
                }
            }
            return Err(e.into());
        }
        drop(guard);

        let shown = cmd.redacted();
        trace!("sent: {}", shown);
        self.sink.raw_sent(&shown);
        Ok(())
    }

    /// Report a link failure unless the loop was cancelled on purpose.
    fn fault(&self, cancel: &CancellationToken, reason: &str) {
        if cancel.is_cancelled() {
            return;
        }
        if !self
            .state
            .transition_from(ConnectionState::Connected, ConnectionState::Reconnecting)
        {
            return;
        }

        warn!("connection lost: {}", reason);
        self.sink.disconnected(Some(reason));
        self.sink.reconnect_requested(reason);
    }
}

/// One connection to the chat server.
pub struct Connection {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    endpoint: Endpoint,
    options: ClientOptions,
    credentials: Credentials,
    validator: Validator,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("login", &self.credentials.login)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    /// Create a disconnected connection.
    pub fn new(
        options: ClientOptions,
        credentials: Credentials,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: StateCell::default(),
                writer: AsyncMutex::new(None),
                parser: MessageParser::new(options.parsing_mode),
                sink,
                session: Mutex::new(None),
            }),
            connector,
            endpoint: options.endpoint(),
            options,
            credentials,
            validator: Validator::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Whether lines can be sent.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// The login used for the handshake.
    pub fn login(&self) -> &str {
        &self.credentials.login
    }

    /// Connect, send the handshake and join `channels` (wire form, `#name`).
    ///
    /// Does nothing if already connecting or connected.
    pub async fn connect(&self, channels: &[String]) -> Result<()> {
        match self.state() {
            ConnectionState::Disposed => return Err(ClientError::Disposed),
            ConnectionState::Connecting | ConnectionState::Connected => return Ok(()),
            _ => {}
        }
        if self.shared.state.transition(ConnectionState::Connecting).is_none() {
            return Err(ClientError::Disposed);
        }

        info!("connecting to {}", self.endpoint);
        let connect = self
            .connector
            .connect(&self.endpoint, self.options.max_line_len);
        let transport = match tokio::time::timeout(self.options.connect_timeout, connect).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                warn!("connection to {} failed: {:#}", self.endpoint, e);
                self.shared
                    .state
                    .transition_from(ConnectionState::Connecting, ConnectionState::Disconnected);
                return Err(ClientError::Transport(format!("{:#}", e)));
            }
            Err(_) => {
                warn!("connection to {} timed out", self.endpoint);
                self.shared
                    .state
                    .transition_from(ConnectionState::Connecting, ConnectionState::Disconnected);
                return Err(ClientError::Timeout);
            }
        };
        if self.state() != ConnectionState::Connecting {
            debug!("connection closed while connecting");
            return Err(ClientError::NotConnected);
        }

        let (reader, writer) = transport.split();
        *self.shared.writer.lock().await = Some(writer);

        if let Err(e) = self.handshake(channels).await {
            warn!("handshake failed: {}", e);
            self.shared.writer.lock().await.take();
            self.shared.state.transition(ConnectionState::Disconnected);
            return Err(e);
        }

        if !self
            .shared
            .state
            .transition_from(ConnectionState::Connecting, ConnectionState::Connected)
        {
            debug!("connection closed during handshake");
            self.shared.writer.lock().await.take();
            return Err(ClientError::NotConnected);
        }

        info!("connected as {}", self.credentials.login);
        self.shared.sink.connected();

        let cancel = CancellationToken::new();
        if let Some(old) = self.shared.session.lock().replace(cancel.clone()) {
            old.cancel();
        }
        tokio::spawn(receive_loop(reader, Arc::clone(&self.shared), cancel));
        Ok(())
    }

    async fn handshake(&self, channels: &[String]) -> Result<()> {
        debug!("sending handshake for {}", self.credentials.login);
        self.shared
            .send(Outgoing::CapReq(&self.options.capabilities))
            .await?;
        if let Some(token) = &self.credentials.token {
            self.shared.send(Outgoing::Pass(token)).await?;
        }
        self.shared
            .send(Outgoing::Nick(&self.credentials.login))
            .await?;
        for channel in channels {
            self.shared.send(Outgoing::Join(channel)).await?;
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Disposed => Err(ClientError::Disposed),
            _ => Err(ClientError::NotConnected),
        }
    }

    /// Send a line as is.
    pub async fn send_raw(&self, line: &str) -> Result<()> {
        self.ensure_connected()?;
        self.shared.send(Outgoing::Raw(line)).await
    }

    /// Join `channel`, with or without `#`.
    pub async fn join_channel(&self, channel: &str) -> Result<()> {
        let channel = self.validator.format_channel(channel, true)?;
        self.ensure_connected()?;
        self.shared.send(Outgoing::Join(&channel)).await
    }

    /// Leave `channel`, with or without `#`.
    pub async fn leave_channel(&self, channel: &str) -> Result<()> {
        let channel = self.validator.format_channel(channel, true)?;
        self.ensure_connected()?;
        self.shared.send(Outgoing::Part(&channel)).await
    }

    /// Send a chat message to `channel`, with or without `#`.
    pub async fn send_message(&self, channel: &str, text: &str) -> Result<()> {
        let channel = self.validator.format_channel(channel, true)?;
        self.ensure_connected()?;
        self.shared
            .send(Outgoing::Privmsg {
                channel: &channel,
                text,
            })
            .await
    }

    /// Stop the receive loop and drop the transport.
    ///
    /// Idempotent. Reports `disconnected(None)` only if the link was up.
    pub async fn close(&self) {
        if let Some(cancel) = self.shared.session.lock().take() {
            cancel.cancel();
        }

        if let Some(mut writer) = self.shared.writer.lock().await.take() {
            if let Err(e) = writer.close().await {
                debug!("error closing transport: {}", e);
            }
        }

        match self.shared.state.transition(ConnectionState::Disconnected) {
            Some(ConnectionState::Connected) | Some(ConnectionState::Connecting) => {
                info!("disconnected");
                self.shared.sink.disconnected(None);
            }
            _ => {}
        }
    }

    /// Close and refuse every later operation.
    pub async fn dispose(&self) {
        self.close().await;
        self.shared.state.transition(ConnectionState::Disposed);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(cancel) = self.shared.session.lock().take() {
            cancel.cancel();
        }
    }
}

async fn receive_loop(mut reader: TransportReader, shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("receive loop cancelled");
                return;
            }
            line = reader.read_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                shared.fault(&cancel, "connection closed by peer");
                return;
            }
            Err(e) => {
                shared.fault(&cancel, &e.to_string());
                return;
            }
        };

        if line.is_empty() {
            continue;
        }

        trace!("received: {}", line);
        shared.sink.raw_received(&line);

        match shared.parser.parse(&line) {
            Some(Event::Ping(ping)) => {
                let answered = shared.send(Outgoing::Pong(&ping.payload)).await;
                shared.sink.dispatch(Event::Ping(ping));
                if let Err(e) = answered {
                    warn!("failed to answer PING: {}", e);
                    if cancel.is_cancelled() || !shared.state.get().is_connected() {
                        return;
                    }
                }
            }
            Some(Event::Reconnect) => {
                info!("server requested reconnect");
                shared.sink.dispatch(Event::Reconnect);
                shared.fault(&cancel, "server requested reconnect");
                return;
            }
            Some(event) => shared.sink.dispatch(event),
            None => log_unhandled(&line),
        }
    }
}

fn log_unhandled(line: &str) {
    let Ok(parsed) = ParsedLine::parse(line) else {
        trace!("ignored line: {}", line);
        return;
    };
    if parsed.command != "CAP" {
        trace!("ignored line: {}", line);
        return;
    }

    let list = parsed.trailing.unwrap_or_default();
    match parsed.param(1) {
        Some("ACK") => {
            for cap in parse_list(list) {
                debug!("capability acknowledged: {}", cap);
            }
        }
        Some("NAK") => {
            for cap in parse_list(list) {
                warn!("capability rejected: {}", cap);
            }
        }
        _ => trace!("ignored CAP reply: {}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Transport, MAX_LINE_LEN};
    use async_trait::async_trait;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{
        AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadBuf,
    };

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, s: String) {
            self.lines.lock().push(s);
        }

        fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl EventSink for Recorder {
        fn connected(&self) {
            self.push("connected".into());
        }

        fn disconnected(&self, reason: Option<&str>) {
            self.push(format!("disconnected {:?}", reason));
        }

        fn raw_sent(&self, line: &str) {
            self.push(format!("> {}", line));
        }

        fn dispatch(&self, event: Event) {
            self.push(format!("{:?}", event));
        }

        fn reconnect_requested(&self, reason: &str) {
            self.push(format!("reconnect {}", reason));
        }
    }

    #[derive(Debug)]
    struct OneShot(Mutex<Option<Transport>>);

    #[async_trait]
    impl Connector for OneShot {
        async fn connect(&self, _: &Endpoint, _: usize) -> anyhow::Result<Transport> {
            self.0
                .lock()
                .take()
                .ok_or_else(|| anyhow::anyhow!("already used"))
        }
    }

    /// A stream whose writes fail with `BrokenPipe` once `fail` is set.
    struct FailingWrites {
        inner: DuplexStream,
        fail: Arc<AtomicBool>,
    }

    impl AsyncRead for FailingWrites {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for FailingWrites {
        fn poll_write(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            if this.fail.load(Ordering::SeqCst) {
                return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
            }
            Pin::new(&mut this.inner).poll_write(cx, buf)
        }

        fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_flush(cx)
        }

        fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
        }
    }

    fn connection_over(transport: Transport, sink: Arc<Recorder>) -> Connection {
        Connection::new(
            ClientOptions::default(),
            Credentials {
                login: "justinfan123".into(),
                token: None,
            },
            Arc::new(OneShot(Mutex::new(Some(transport)))),
            sink,
        )
    }

    fn connection(client: DuplexStream, sink: Arc<Recorder>) -> Connection {
        connection_over(Transport::lines(client, MAX_LINE_LEN), sink)
    }

    async fn wait_for_state(conn: &Connection, state: ConnectionState) {
        for _ in 0..50 {
            if conn.state() == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_handshake_and_ping() {
        let (client, server) = tokio::io::duplex(MAX_LINE_LEN);
        let sink = Arc::new(Recorder::default());
        let conn = connection(client, Arc::clone(&sink));

        conn.connect(&["#lbnshlfe".to_string()]).await.unwrap();
        assert!(conn.is_connected());

        let (server_read, mut server_write) = tokio::io::split(server);
        let mut server_lines = BufReader::new(server_read).lines();
        assert_eq!(
            server_lines.next_line().await.unwrap().unwrap(),
            "CAP REQ :twitch.tv/commands twitch.tv/tags twitch.tv/membership"
        );
        assert_eq!(server_lines.next_line().await.unwrap().unwrap(), "NICK justinfan123");
        assert_eq!(server_lines.next_line().await.unwrap().unwrap(), "JOIN #lbnshlfe");

        server_write.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
        assert_eq!(
            server_lines.next_line().await.unwrap().unwrap(),
            "PONG :tmi.twitch.tv"
        );

        conn.close().await;
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        let lines = sink.lines();
        assert_eq!(lines.iter().filter(|l| l.starts_with("disconnected")).count(), 1);
        assert!(lines.contains(&"connected".to_string()));
    }

    #[tokio::test]
    async fn test_peer_close_requests_reconnect() {
        let (client, server) = tokio::io::duplex(MAX_LINE_LEN);
        let sink = Arc::new(Recorder::default());
        let conn = connection(client, Arc::clone(&sink));
        conn.connect(&[]).await.unwrap();

        drop(server);
        wait_for_state(&conn, ConnectionState::Reconnecting).await;
        assert_eq!(conn.state(), ConnectionState::Reconnecting);
        assert!(sink
            .lines()
            .iter()
            .any(|l| l.starts_with("reconnect")));
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let (client, server) = tokio::io::duplex(MAX_LINE_LEN);
        let sink = Arc::new(Recorder::default());
        let conn = connection(client, Arc::clone(&sink));
        conn.connect(&[]).await.unwrap();

        let (server_read, mut server_write) = tokio::io::split(server);
        let mut server_lines = BufReader::new(server_read).lines();
        server_lines.next_line().await.unwrap();
        server_lines.next_line().await.unwrap();

        server_write
            .write_all(b":u!u@u.tmi.twitch.tv PRIVMSG #lbnshlfe :\x02bold\r\n")
            .await
            .unwrap();
        server_write
            .write_all(b":u!u@u.tmi.twitch.tv PRIVMSG #lbnshlfe :\xff\xfe\r\n")
            .await
            .unwrap();
        server_write.write_all(b"PING :after\r\n").await.unwrap();

        assert_eq!(server_lines.next_line().await.unwrap().unwrap(), "PONG :after");
        assert_eq!(conn.state(), ConnectionState::Connected);
        let lines = sink.lines();
        assert!(!lines.iter().any(|l| l.starts_with("reconnect")));
        assert!(!lines.iter().any(|l| l.starts_with("disconnected")));
        assert!(lines.contains(&"> PONG :after".to_string()));
    }

    #[tokio::test]
    async fn test_write_failure_requests_reconnect() {
        let (client, server) = tokio::io::duplex(MAX_LINE_LEN);
        let fail = Arc::new(AtomicBool::new(false));
        let stream = FailingWrites {
            inner: client,
            fail: Arc::clone(&fail),
        };
        let sink = Arc::new(Recorder::default());
        let conn = connection_over(Transport::lines(stream, MAX_LINE_LEN), Arc::clone(&sink));
        conn.connect(&[]).await.unwrap();

        let mut server_lines = BufReader::new(server).lines();
        server_lines.next_line().await.unwrap();
        server_lines.next_line().await.unwrap();

        fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            conn.send_raw("PRIVMSG #lbnshlfe :hi").await,
            Err(ClientError::Transport(_))
        ));
        assert_eq!(conn.state(), ConnectionState::Reconnecting);

        let lines = sink.lines();
        assert_eq!(lines.iter().filter(|l| l.starts_with("reconnect")).count(), 1);
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("disconnected Some")).count(),
            1
        );
        assert!(!lines.iter().any(|l| l.contains("PRIVMSG")));
    }

    #[tokio::test]
    async fn test_invalid_channel_never_hits_transport() {
        let (client, _server) = tokio::io::duplex(MAX_LINE_LEN);
        let sink = Arc::new(Recorder::default());
        let conn = connection(client, sink);

        assert!(matches!(
            conn.join_channel("a b").await,
            Err(ClientError::Format(_))
        ));
        assert!(matches!(
            conn.send_message("lbnshlfe", "hi").await,
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disposed_refuses_connect() {
        let (client, _server) = tokio::io::duplex(MAX_LINE_LEN);
        let conn = connection(client, Arc::new(Recorder::default()));
        conn.dispose().await;
        assert!(matches!(conn.connect(&[]).await, Err(ClientError::Disposed)));
        assert!(matches!(conn.send_raw("PING").await, Err(ClientError::Disposed)));
    }
}
