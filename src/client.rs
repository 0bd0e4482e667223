//! The chat client facade.
//!
//! [`ChatClient`] ties a [`Connection`] to a [`ChannelRegistry`], keeps the
//! list of channels to rejoin after a reconnect, and fans events out to
//! subscribed handlers.
//!
//! # Example
//!
//! ```no_run
//! use slirc_tmi::{ChatClient, ClientEvent, ClientOptions};
//!
//! # async fn run() -> slirc_tmi::Result<()> {
//! let client = ChatClient::anonymous(ClientOptions::default());
//! client.subscribe(|event| {
//!     if let ClientEvent::ChatMessage(msg) = event {
//!         println!("#{} <{}> {}", msg.channel, msg.display_name, msg.message);
//!     }
//! });
//! client.join_channel("forsen").await?;
//! client.connect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::channel::ChannelRegistry;
use crate::config::ClientOptions;
use crate::connection::{Connection, Credentials, EventSink};
use crate::credentials::OAuthToken;
use crate::error::{ClientError, FormatError, Result};
use crate::event::{ClientEvent, EventHub, Subscription};
use crate::model::Event;
use crate::reconnect::{Reconnect, ReconnectCoordinator, ReconnectOutcome};
use crate::state::ConnectionState;
use crate::transport::{Connector, NetworkConnector};
use crate::validation::{unprefixed, Validator};

/// Login used by anonymous clients.
pub const ANONYMOUS_LOGIN: &str = "justinfan123";

/// State reachable from the receive loop.
struct Core {
    login: String,
    anonymous: bool,
    registry: RwLock<ChannelRegistry>,
    /// Channels to (re)join, wire form `#name`.
    retained: Mutex<Vec<String>>,
    hub: EventHub,
    validator: Validator,
}

struct Inner {
    core: Arc<Core>,
    connection: Connection,
    coordinator: ReconnectCoordinator,
    shutdown: Mutex<CancellationToken>,
}

#[async_trait]
impl Reconnect for Inner {
    fn is_live(&self) -> bool {
        self.connection.state().is_live()
    }

    async fn close(&self) {
        self.connection.close().await;
    }

    async fn connect(&self) -> Result<()> {
        let channels = self.core.retained.lock().clone();
        self.connection.connect(&channels).await
    }
}

/// Routes connection callbacks into the registry and the handlers.
struct ClientSink {
    core: Arc<Core>,
    inner: Weak<Inner>,
}

impl EventSink for ClientSink {
    fn connected(&self) {
        self.core.hub.emit(&ClientEvent::Connected);
    }

    fn disconnected(&self, reason: Option<&str>) {
        self.core.hub.emit(&ClientEvent::Disconnected {
            reason: reason.map(str::to_owned),
        });
    }

    fn raw_received(&self, line: &str) {
        if !self.core.hub.is_empty() {
            self.core.hub.emit(&ClientEvent::RawReceived(line.to_owned()));
        }
    }

    fn raw_sent(&self, line: &str) {
        if !self.core.hub.is_empty() {
            self.core.hub.emit(&ClientEvent::RawSent(line.to_owned()));
        }
    }

    fn dispatch(&self, event: Event) {
        let hub = &self.core.hub;
        match event {
            Event::ChatMessage(msg) => hub.emit(&ClientEvent::ChatMessage(msg)),
            Event::RoomState(update) => {
                self.core.registry.write().update(&update);
                hub.emit(&ClientEvent::RoomState(update));
            }
            Event::Join(join) => hub.emit(&ClientEvent::JoinedChannel(join)),
            Event::Part(part) => {
                if part.username == self.core.login {
                    self.core.registry.write().remove(&part.channel);
                }
                hub.emit(&ClientEvent::LeftChannel(part));
            }
            Event::Notice(notice) => hub.emit(&ClientEvent::Notice(notice)),
            Event::Ping(_) | Event::Pong | Event::Reconnect => {}
        }
    }

    fn reconnect_requested(&self, reason: &str) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        debug!("scheduling reconnect: {}", reason);

        let shutdown = inner.shutdown.lock().clone();
        tokio::spawn(async move {
            match inner.coordinator.reconnect(inner.as_ref(), &shutdown).await {
                ReconnectOutcome::Failed(e) => {
                    inner.core.hub.emit(&ClientEvent::Disconnected {
                        reason: Some(format!("reconnect failed: {}", e)),
                    });
                }
                outcome => debug!("reconnect finished: {:?}", outcome),
            }
        });
    }
}

/// A chat client: connection, room state, retained channels and events.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("login", &self.inner.core.login)
            .field("anonymous", &self.inner.core.anonymous)
            .field("state", &self.state())
            .finish()
    }
}

impl ChatClient {
    /// A receive-only client logged in as [`ANONYMOUS_LOGIN`].
    pub fn anonymous(options: ClientOptions) -> Self {
        Self::build(
            Credentials {
                login: ANONYMOUS_LOGIN.to_owned(),
                token: None,
            },
            true,
            options,
            Arc::new(NetworkConnector),
            Validator::new(),
        )
    }

    /// A client logged in as `login` with an OAuth token.
    ///
    /// Both are validated before any network activity.
    pub fn new(login: &str, token: &str, options: ClientOptions) -> Result<Self> {
        Self::with_connector(login, Some(token), options, Arc::new(NetworkConnector))
    }

    /// A client over a custom [`Connector`].
    ///
    /// A login matching `justinfan<digits>` is anonymous and needs no
    /// token; any other login requires one.
    pub fn with_connector(
        login: &str,
        token: Option<&str>,
        options: ClientOptions,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        let validator = Validator::new();
        let anonymous = validator.is_anonymous_login(login);
        let login = if anonymous {
            login.to_ascii_lowercase()
        } else {
            validator.format_login(login)?
        };

        let token = match (anonymous, token) {
            (true, _) => None,
            (false, Some(raw)) => Some(OAuthToken::new(raw)?),
            (false, None) => return Err(FormatError::OAuthToken.into()),
        };

        Ok(Self::build(
            Credentials { login, token },
            anonymous,
            options,
            connector,
            validator,
        ))
    }

    fn build(
        credentials: Credentials,
        anonymous: bool,
        options: ClientOptions,
        connector: Arc<dyn Connector>,
        validator: Validator,
    ) -> Self {
        let core = Arc::new(Core {
            login: credentials.login.clone(),
            anonymous,
            registry: RwLock::new(ChannelRegistry::new()),
            retained: Mutex::new(Vec::new()),
            hub: EventHub::default(),
            validator,
        });
        let coordinator = ReconnectCoordinator::new(options.reconnect_backoff, options.settle_delay);

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let sink = Arc::new(ClientSink {
                core: Arc::clone(&core),
                inner: weak.clone(),
            });
            Inner {
                connection: Connection::new(options, credentials, connector, sink),
                core,
                coordinator,
                shutdown: Mutex::new(CancellationToken::new()),
            }
        });

        Self { inner }
    }

    fn core(&self) -> &Core {
        &self.inner.core
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.state() == ConnectionState::Disposed {
            return Err(ClientError::Disposed);
        }
        Ok(())
    }

    /// Connect and join every retained channel.
    pub async fn connect(&self) -> Result<()> {
        self.ensure_usable()?;
        {
            let mut shutdown = self.inner.shutdown.lock();
            if shutdown.is_cancelled() {
                *shutdown = CancellationToken::new();
            }
        }
        let channels = self.core().retained.lock().clone();
        self.inner.connection.connect(&channels).await
    }

    /// Disconnect. Wins over any reconnect in progress.
    pub async fn disconnect(&self) {
        self.inner.shutdown.lock().cancel();
        self.inner.connection.close().await;
    }

    /// Join `channel` (with or without `#`) and keep it across reconnects.
    ///
    /// While disconnected the channel is only remembered.
    pub async fn join_channel(&self, channel: &str) -> Result<()> {
        self.ensure_usable()?;
        let channel = self.core().validator.format_channel(channel, true)?;
        {
            let mut retained = self.core().retained.lock();
            if !retained.contains(&channel) {
                retained.push(channel.clone());
            }
        }

        if self.is_connected() {
            self.inner.connection.join_channel(&channel).await?;
        }
        Ok(())
    }

    /// Join several channels, stopping at the first error.
    pub async fn join_channels<I, S>(&self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for channel in channels {
            self.join_channel(channel.as_ref()).await?;
        }
        Ok(())
    }

    /// Leave `channel` and forget it.
    pub async fn leave_channel(&self, channel: &str) -> Result<()> {
        self.ensure_usable()?;
        let channel = self.core().validator.format_channel(channel, true)?;
        self.core().retained.lock().retain(|c| *c != channel);
        self.core().registry.write().remove(&channel);

        if self.is_connected() {
            self.inner.connection.leave_channel(&channel).await?;
        }
        Ok(())
    }

    /// Leave several channels, stopping at the first error.
    pub async fn leave_channels<I, S>(&self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for channel in channels {
            self.leave_channel(channel.as_ref()).await?;
        }
        Ok(())
    }

    /// Leave every channel, retained or known.
    pub async fn leave_all_channels(&self) -> Result<()> {
        self.ensure_usable()?;
        let channels = std::mem::take(&mut *self.core().retained.lock());
        self.core().registry.write().clear();

        if self.is_connected() {
            for channel in &channels {
                self.inner.connection.leave_channel(channel).await?;
            }
        }
        Ok(())
    }

    fn ensure_can_send(&self) -> Result<()> {
        self.ensure_usable()?;
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        if self.core().anonymous {
            return Err(ClientError::Anonymous);
        }
        Ok(())
    }

    /// Send a chat message to a joined channel, named with or without `#`.
    pub async fn send_message(&self, channel: &str, text: &str) -> Result<()> {
        self.ensure_can_send()?;
        let prefixed = self
            .core()
            .registry
            .read()
            .get(channel)
            .map(|c| c.prefixed_name())
            .ok_or_else(|| ClientError::NotJoined(unprefixed(channel).to_owned()))?;
        self.inner.connection.send_message(&prefixed, text).await
    }

    /// Send a chat message to a joined channel, by owner id.
    pub async fn send_message_to_id(&self, channel_id: u64, text: &str) -> Result<()> {
        self.ensure_can_send()?;
        let prefixed = self
            .core()
            .registry
            .read()
            .get_by_id(channel_id)
            .map(|c| c.prefixed_name())
            .ok_or_else(|| ClientError::NotJoined(channel_id.to_string()))?;
        self.inner.connection.send_message(&prefixed, text).await
    }

    /// Send a raw line.
    pub async fn send_raw(&self, line: &str) -> Result<()> {
        self.inner.connection.send_raw(line).await
    }

    /// Read access to the room state of known channels.
    ///
    /// The receive loop cannot apply updates while the guard is held.
    pub fn channels(&self) -> RwLockReadGuard<'_, ChannelRegistry> {
        self.core().registry.read()
    }

    /// Retained channels, without `#`, in join order.
    pub fn channel_list(&self) -> Vec<String> {
        self.core()
            .retained
            .lock()
            .iter()
            .map(|c| unprefixed(c).to_owned())
            .collect()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Whether the client can send.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    /// Whether the client is logged in anonymously.
    pub fn is_anonymous(&self) -> bool {
        self.core().anonymous
    }

    /// The login name.
    pub fn login(&self) -> &str {
        &self.core().login
    }

    /// Register an event handler. Handlers run on the receive loop.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.core().hub.subscribe(handler)
    }

    /// Remove an event handler; `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.core().hub.unsubscribe(subscription)
    }

    /// Disconnect and release everything. Every later call fails with
    /// [`ClientError::Disposed`].
    pub async fn dispose(&self) {
        self.inner.shutdown.lock().cancel();
        self.inner.connection.dispose().await;
        self.core().hub.clear();
        self.core().registry.write().clear();
        self.core().retained.lock().clear();
        info!("client disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_client() {
        let client = ChatClient::anonymous(ClientOptions::default());
        assert!(client.is_anonymous());
        assert_eq!(client.login(), "justinfan123");
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_rejects_bad_credentials() {
        assert!(matches!(
            ChatClient::new("a b", "abcdefghijklmnopqrstuvwxyz0123", ClientOptions::default()),
            Err(ClientError::Format(FormatError::Login(_)))
        ));
        assert!(matches!(
            ChatClient::new("strbhlfe", "short", ClientOptions::default()),
            Err(ClientError::Format(FormatError::OAuthToken))
        ));
    }

    #[test]
    fn test_justinfan_login_is_anonymous() {
        let client = ChatClient::with_connector(
            "JustinFan4242",
            None,
            ClientOptions::default(),
            Arc::new(NetworkConnector),
        )
        .unwrap();
        assert!(client.is_anonymous());
        assert_eq!(client.login(), "justinfan4242");
    }

    #[tokio::test]
    async fn test_join_while_disconnected_is_remembered() {
        let client = ChatClient::anonymous(ClientOptions::default());
        client.join_channels(["Lbnshlfe", "#strbhlfe", "lbnshlfe"]).await.unwrap();
        assert_eq!(client.channel_list(), vec!["lbnshlfe", "strbhlfe"]);

        client.leave_channel("#LBNSHLFE").await.unwrap();
        assert_eq!(client.channel_list(), vec!["strbhlfe"]);

        client.leave_all_channels().await.unwrap();
        assert!(client.channel_list().is_empty());
    }

    #[tokio::test]
    async fn test_send_preconditions_in_order() {
        let client = ChatClient::anonymous(ClientOptions::default());
        assert!(matches!(
            client.send_message("lbnshlfe", "hi").await,
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            client.join_channel("#a").await,
            Err(ClientError::Format(FormatError::ChannelName(_)))
        ));
    }

    #[tokio::test]
    async fn test_dispose_is_terminal() {
        let client = ChatClient::anonymous(ClientOptions::default());
        client.dispose().await;
        assert_eq!(client.state(), ConnectionState::Disposed);
        assert!(matches!(client.connect().await, Err(ClientError::Disposed)));
        assert!(matches!(
            client.join_channel("lbnshlfe").await,
            Err(ClientError::Disposed)
        ));
    }
}
