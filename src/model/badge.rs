//! Chat badges.

use super::Text;

/// A `name/level` badge, as found in the `badges` and `badge-info` tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Badge {
    /// Badge set name, e.g. `moderator` or `subscriber`.
    pub name: Text,
    /// Badge version or level, e.g. `1` or the subscribed month count.
    pub level: Text,
}

impl Badge {
    /// Detach both fields from any line buffer.
    #[must_use]
    pub fn into_owned(self) -> Self {
        Self {
            name: self.name.into_owned(),
            level: self.level.into_owned(),
        }
    }
}

/// Split a badge list (`a/1,b/2`) into `(name, level)` pairs, in order.
///
/// Entries without `/` get an empty level; empty entries are skipped.
pub(crate) fn split_badges(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split(',')
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.split_once('/').unwrap_or((entry, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_badges() {
        let badges: Vec<_> = split_badges("moderator/1,twitchconEU2022/1").collect();
        assert_eq!(badges, vec![("moderator", "1"), ("twitchconEU2022", "1")]);
    }

    #[test]
    fn test_split_empty_list() {
        assert_eq!(split_badges("").count(), 0);
    }

    #[test]
    fn test_split_missing_level() {
        let badges: Vec<_> = split_badges("glhf-pledge").collect();
        assert_eq!(badges, vec![("glhf-pledge", "")]);
    }
}
