//! Room state of joined channels.

use std::collections::HashMap;

use crate::model::{RoomStateFlags, RoomStateUpdate, DISABLED};
use crate::validation::{unprefixed, CHANNEL_PREFIX};

/// The room state of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Channel {
    /// Channel name, lower case and without `#`.
    pub name: String,
    /// Numeric id of the channel owner.
    pub id: u64,
    /// Only emotes may be sent.
    pub emote_only: bool,
    /// Minimum follow age in minutes, or [`DISABLED`].
    pub followers_only_minutes: i32,
    /// Unique-message (r9k) mode.
    pub r9k: bool,
    /// Seconds between messages; `0` means off.
    pub slow_mode_seconds: i32,
    /// Only subscribers may chat.
    pub subs_only: bool,
}

impl Channel {
    /// A channel with every mode off.
    pub fn new(name: &str, id: u64) -> Self {
        Self {
            name: unprefixed(name).to_ascii_lowercase(),
            id,
            emote_only: false,
            followers_only_minutes: DISABLED,
            r9k: false,
            slow_mode_seconds: 0,
            subs_only: false,
        }
    }

    /// The wire form of the name, `#name`.
    pub fn prefixed_name(&self) -> String {
        let mut s = String::with_capacity(self.name.len() + 1);
        s.push(CHANNEL_PREFIX);
        s.push_str(&self.name);
        s
    }

    /// Whether followers-only mode is on.
    pub fn is_followers_only(&self) -> bool {
        self.followers_only_minutes != DISABLED
    }

    /// Whether slow mode is on.
    pub fn is_slow_mode(&self) -> bool {
        self.slow_mode_seconds > 0
    }

    /// Apply the fields flagged in `update`; the rest stay as they are.
    pub fn apply(&mut self, update: &RoomStateUpdate) {
        let changed = update.changed;
        if changed.contains(RoomStateFlags::EMOTE_ONLY) {
            self.emote_only = update.emote_only;
        }
        if changed.contains(RoomStateFlags::FOLLOWERS_ONLY) {
            self.followers_only_minutes = update.followers_only_minutes.max(DISABLED);
        }
        if changed.contains(RoomStateFlags::R9K) {
            self.r9k = update.r9k;
        }
        if changed.contains(RoomStateFlags::SLOW_MODE) {
            self.slow_mode_seconds = update.slow_mode_seconds.max(0);
        }
        if changed.contains(RoomStateFlags::SUBS_ONLY) {
            self.subs_only = update.subs_only;
        }
    }
}

/// Channels keyed by name and by owner id.
///
/// Never holds two entries with the same name or the same id.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    by_name: HashMap<String, Channel>,
    names_by_id: HashMap<u64, String>,
}

impl ChannelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `channel`, replacing entries that share its name or id.
    pub fn add(&mut self, channel: Channel) {
        if let Some(old) = self.by_name.remove(&channel.name) {
            self.names_by_id.remove(&old.id);
        }
        if let Some(old_name) = self.names_by_id.remove(&channel.id) {
            self.by_name.remove(&old_name);
        }

        self.names_by_id.insert(channel.id, channel.name.clone());
        self.by_name.insert(channel.name.clone(), channel);
    }

    /// Apply a room-state update, creating the channel if it is not known.
    ///
    /// Returns the channel after the update.
    pub fn update(&mut self, update: &RoomStateUpdate) -> &Channel {
        let name = unprefixed(&update.channel).to_ascii_lowercase();
        let id = update.channel_id;

        if let Some(other) = self.names_by_id.get(&id).filter(|other| **other != name) {
            let other = other.clone();
            self.by_name.remove(&other);
        }

        let channel = self
            .by_name
            .entry(name.clone())
            .or_insert_with(|| Channel::new(&name, id));
        if channel.id != id {
            self.names_by_id.remove(&channel.id);
            channel.id = id;
        }
        self.names_by_id.insert(id, name);

        channel.apply(update);
        channel
    }

    /// Remove a channel by name, with or without `#`.
    pub fn remove(&mut self, name: &str) -> Option<Channel> {
        let name = unprefixed(name).to_ascii_lowercase();
        let channel = self.by_name.remove(&name)?;
        self.names_by_id.remove(&channel.id);
        Some(channel)
    }

    /// Look up a channel by name, with or without `#`.
    pub fn get(&self, name: &str) -> Option<&Channel> {
        let name = unprefixed(name);
        match self.by_name.get(name) {
            Some(c) => Some(c),
            None if name.bytes().any(|b| b.is_ascii_uppercase()) => {
                self.by_name.get(&name.to_ascii_lowercase())
            }
            None => None,
        }
    }

    /// Look up a channel by owner id.
    pub fn get_by_id(&self, id: u64) -> Option<&Channel> {
        self.names_by_id
            .get(&id)
            .and_then(|name| self.by_name.get(name))
    }

    /// Whether a channel is known, by name with or without `#`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove every channel.
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.names_by_id.clear();
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no channel is known.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate over the channels in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.by_name.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RoomStateUpdate {
        RoomStateUpdate::new("strbhlfe", 87633910)
            .with_emote_only(true)
            .with_followers_only(15)
            .with_r9k(true)
            .with_slow_mode(10)
            .with_subs_only(true)
    }

    #[test]
    fn test_update_creates_channel() {
        let mut registry = ChannelRegistry::new();
        let channel = registry.update(&snapshot()).clone();
        assert_eq!(channel.name, "strbhlfe");
        assert_eq!(channel.prefixed_name(), "#strbhlfe");
        assert!(channel.emote_only && channel.r9k && channel.subs_only);
        assert_eq!(channel.followers_only_minutes, 15);
        assert_eq!(channel.slow_mode_seconds, 10);
        assert_eq!(registry.get_by_id(87633910), Some(&channel));
        assert_eq!(registry.get("#strbhlfe"), Some(&channel));
        assert_eq!(registry.get("StrBhlfe"), Some(&channel));
    }

    #[test]
    fn test_slow_mode_only_update_leaves_other_fields() {
        let mut registry = ChannelRegistry::new();
        registry.update(&snapshot());

        let slow = RoomStateUpdate::new("strbhlfe", 87633910).with_slow_mode(0);
        let channel = registry.update(&slow);
        assert_eq!(channel.slow_mode_seconds, 0);
        assert!(!channel.is_slow_mode());
        assert!(channel.emote_only);
        assert_eq!(channel.followers_only_minutes, 15);
        assert!(channel.r9k);
        assert!(channel.subs_only);
    }

    #[test]
    fn test_no_duplicates_by_name_or_id() {
        let mut registry = ChannelRegistry::new();
        registry.add(Channel::new("a_channel", 1));
        registry.add(Channel::new("b_channel", 2));

        registry.add(Channel::new("a_channel", 3));
        assert_eq!(registry.len(), 2);
        assert!(registry.get_by_id(1).is_none());
        assert_eq!(registry.get_by_id(3).unwrap().name, "a_channel");

        registry.add(Channel::new("renamed", 2));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("b_channel").is_none());
        assert_eq!(registry.get_by_id(2).unwrap().name, "renamed");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut registry = ChannelRegistry::new();
        registry.update(&snapshot());
        assert!(registry.remove("#strbhlfe").is_some());
        assert!(registry.get_by_id(87633910).is_none());
        assert!(registry.is_empty());

        registry.update(&snapshot());
        registry.add(Channel::new("other", 5));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }
}
