//! Room-state updates (`ROOMSTATE`).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::Text;

/// Set of room-state fields carried by an update.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RoomStateFlags(u8);

impl RoomStateFlags {
    /// No field changed.
    pub const NONE: Self = Self(0);
    /// `emote-only`
    pub const EMOTE_ONLY: Self = Self(1 << 0);
    /// `followers-only`
    pub const FOLLOWERS_ONLY: Self = Self(1 << 1);
    /// `r9k`
    pub const R9K: Self = Self(1 << 2);
    /// `slow`
    pub const SLOW_MODE: Self = Self(1 << 3);
    /// `subs-only`
    pub const SUBS_ONLY: Self = Self(1 << 4);
    /// Every field, as in the snapshot sent on join.
    pub const ALL: Self = Self(0b1_1111);

    /// Whether all flags in `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set the flags in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for RoomStateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RoomStateFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for RoomStateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(RoomStateFlags, &str); 5] = [
            (RoomStateFlags::EMOTE_ONLY, "EMOTE_ONLY"),
            (RoomStateFlags::FOLLOWERS_ONLY, "FOLLOWERS_ONLY"),
            (RoomStateFlags::R9K, "R9K"),
            (RoomStateFlags::SLOW_MODE, "SLOW_MODE"),
            (RoomStateFlags::SUBS_ONLY, "SUBS_ONLY"),
        ];

        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{}", name));
            }
        }
        set.finish()
    }
}

/// Value meaning "disabled" for the minute/second room settings.
pub const DISABLED: i32 = -1;

/// A change to a channel's room state.
///
/// Only the fields named in [`changed`](Self::changed) carry meaning; the
/// others hold their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RoomStateUpdate {
    /// Channel name, lower case and without `#`.
    pub channel: Text,
    /// Numeric id of the channel owner.
    pub channel_id: u64,
    /// Which fields this update carries.
    pub changed: RoomStateFlags,
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

impl RoomStateUpdate {
    /// An update for `channel` with nothing changed.
    pub fn new(channel: impl Into<Text>, channel_id: u64) -> Self {
        Self {
            channel: channel.into(),
            channel_id,
            changed: RoomStateFlags::NONE,
            emote_only: false,
            followers_only_minutes: DISABLED,
            r9k: false,
            slow_mode_seconds: 0,
            subs_only: false,
        }
    }

    /// Mark emote-only mode as changed to `on`.
    #[must_use]
    pub fn with_emote_only(mut self, on: bool) -> Self {
        self.emote_only = on;
        self.changed |= RoomStateFlags::EMOTE_ONLY;
        self
    }

    /// Mark followers-only mode as changed to `minutes` (negative disables).
    #[must_use]
    pub fn with_followers_only(mut self, minutes: i32) -> Self {
        self.followers_only_minutes = normalize_minutes(minutes);
        self.changed |= RoomStateFlags::FOLLOWERS_ONLY;
        self
    }

    /// Mark r9k mode as changed to `on`.
    #[must_use]
    pub fn with_r9k(mut self, on: bool) -> Self {
        self.r9k = on;
        self.changed |= RoomStateFlags::R9K;
        self
    }

    /// Mark slow mode as changed to `seconds` (zero or negative disables).
    #[must_use]
    pub fn with_slow_mode(mut self, seconds: i32) -> Self {
        self.slow_mode_seconds = seconds.max(0);
        self.changed |= RoomStateFlags::SLOW_MODE;
        self
    }

    /// Mark subs-only mode as changed to `on`.
    #[must_use]
    pub fn with_subs_only(mut self, on: bool) -> Self {
        self.subs_only = on;
        self.changed |= RoomStateFlags::SUBS_ONLY;
        self
    }

    /// Detach the channel name from the line buffer.
    #[must_use]
    pub fn into_owned(self) -> Self {
        Self {
            channel: self.channel.into_owned(),
            ..self
        }
    }
}

/// Negative minute counts all mean "disabled".
fn normalize_minutes(minutes: i32) -> i32 {
    if minutes < 0 {
        DISABLED
    } else {
        minutes
    }
}
