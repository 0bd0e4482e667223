//! Keep-alive pings.

/// Command that answers a [`Ping`].
pub const PONG_PREFIX: &str = "PONG :";

/// A keep-alive probe from the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Ping {
    /// Payload to echo back; may be empty.
    pub payload: String,
}

impl Ping {
    /// The reply line that must be sent back, without CRLF.
    ///
    /// # Examples
    ///
    /// ```
    /// use slirc_tmi::Ping;
    ///
    /// let ping = Ping { payload: "tmi.twitch.tv".to_string() };
    /// assert_eq!(ping.reply(), "PONG :tmi.twitch.tv");
    /// ```
    pub fn reply(&self) -> String {
        let mut line = String::with_capacity(PONG_PREFIX.len() + self.payload.len());
        line.push_str(PONG_PREFIX);
        line.push_str(&self.payload);
        line
    }
}
