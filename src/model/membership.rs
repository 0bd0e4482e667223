//! Channel membership events (`JOIN` / `PART`).

/// A user joined a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct JoinEvent {
    /// Login name of the user, lower case.
    pub username: String,
    /// Channel name, lower case and without `#`.
    pub channel: String,
}

/// A user left a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PartEvent {
    /// Login name of the user, lower case.
    pub username: String,
    /// Channel name, lower case and without `#`.
    pub channel: String,
}
