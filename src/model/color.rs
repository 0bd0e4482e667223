//! Display colors.

use std::fmt;

/// An RGB display color.
///
/// Users who never picked a color carry [`Color::DEFAULT`] (black), as does
/// any message whose `color` tag is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Color {
    /// The color used when none was sent.
    pub const DEFAULT: Color = Color::new(0, 0, 0);

    /// Build a color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parse `#RRGGBB` (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use slirc_tmi::Color;
    ///
    /// assert_eq!(Color::parse_hex("#C29900"), Some(Color::new(0xC2, 0x99, 0x00)));
    /// assert_eq!(Color::parse_hex("C29900"), None);
    /// assert_eq!(Color::parse_hex(""), None);
    /// ```
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse a `color` tag value, falling back to [`Color::DEFAULT`].
    pub fn from_tag(s: &str) -> Self {
        Self::parse_hex(s).unwrap_or(Self::DEFAULT)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}
