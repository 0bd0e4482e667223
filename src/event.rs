//! Client events and handler registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::{ChatMessage, JoinEvent, Notice, PartEvent, RoomStateUpdate};

/// Something the client observed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientEvent {
    /// The connection is up and the handshake was sent.
    Connected,
    /// The connection went down. `reason` is `None` after
    /// [`disconnect`](crate::ChatClient::disconnect).
    Disconnected {
        /// Why the link dropped.
        reason: Option<String>,
    },
    /// A user (possibly this client) joined a channel.
    JoinedChannel(JoinEvent),
    /// A user (possibly this client) left a channel.
    LeftChannel(PartEvent),
    /// A channel's room state changed; already applied to the registry.
    RoomState(RoomStateUpdate),
    /// A chat message arrived.
    ChatMessage(ChatMessage),
    /// A server notice arrived.
    Notice(Notice),
    /// A raw line arrived, whether or not it parsed.
    RawReceived(String),
    /// A raw line was sent, credentials masked.
    RawSent(String),
}

type Handler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Handle returned by [`EventHub::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Registered event handlers.
#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(u64, Handler)>>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("handlers", &self.len())
            .finish()
    }
}

impl EventHub {
    /// Register `handler` for every later event.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((id, Arc::new(handler)));
        Subscription(id)
    }

    /// Remove a handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription.0);
        handlers.len() != before
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    /// Call every handler with `event`, in registration order.
    ///
    /// Handlers run without the registry lock held, so they may subscribe
    /// or unsubscribe.
    pub fn emit(&self, event: &ClientEvent) {
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }
}
