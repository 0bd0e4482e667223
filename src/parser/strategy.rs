//! Parsing strategies.
//!
//! A strategy only decides where the strings of a parsed event live. The
//! event construction in [`super`] is shared, so every strategy produces the
//! same logical result for the same line.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::model::Text;

use super::pool::{BufferPool, PooledLine};

/// How the parser stores the strings of the events it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParsingMode {
    /// Copy every string into its own allocation.
    Eager,
    /// Copy the line once into a pooled buffer; every string is a view into
    /// it. The buffer is recycled once the event and all its views are gone.
    Pooled,
    /// Copy small fixed fields; keep only the message text as a view into a
    /// shared copy of the line.
    #[default]
    Balanced,
}

/// Whether a field is one of the small fixed fields or the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Small,
    Body,
}

/// The line a single event is built from, held the way the strategy wants.
///
/// `origin` is the line the tokenizer ran over; the stored copy has the same
/// content, so a slice of `origin` maps onto the copy by byte range.
pub(crate) struct Source<'a> {
    origin: &'a str,
    store: Store,
}

enum Store {
    Copied,
    Shared(Arc<str>),
    Pooled(Arc<PooledLine>),
}

impl Source<'_> {
    /// Materialize `part`, which must be a slice of the origin line.
    pub(crate) fn text(&self, field: Field, part: &str) -> Text {
        let view = match (&self.store, field) {
            (Store::Copied, _) | (Store::Shared(_), Field::Small) => None,
            _ => range_in(self.origin, part),
        };

        match (view, &self.store) {
            (Some(range), Store::Shared(src)) => Text::shared(src, range),
            (Some(range), Store::Pooled(src)) => Text::pooled(src, range),
            _ => Text::owned(part),
        }
    }

    /// Materialize a tag value that may have been unescaped into a new string.
    pub(crate) fn cow_text(&self, field: Field, value: &Cow<'_, str>) -> Text {
        match value {
            Cow::Borrowed(part) => self.text(field, part),
            Cow::Owned(s) => Text::owned(s),
        }
    }
}

/// Byte range of `part` inside `base`, if `part` is a slice of it.
fn range_in(base: &str, part: &str) -> Option<Range<usize>> {
    let start = (part.as_ptr() as usize).checked_sub(base.as_ptr() as usize)?;
    let end = start.checked_add(part.len())?;
    (end <= base.len() && base.is_char_boundary(start) && base.is_char_boundary(end))
        .then_some(start..end)
}

/// Storage policy for parsed events, chosen at parser construction.
pub(crate) trait ParseStrategy: Send + Sync + fmt::Debug {
    fn mode(&self) -> ParsingMode;

    fn prepare<'a>(&self, line: &'a str) -> Source<'a>;
}

#[derive(Debug, Default)]
pub(crate) struct EagerStrategy;

impl ParseStrategy for EagerStrategy {
    fn mode(&self) -> ParsingMode {
        ParsingMode::Eager
    }

    fn prepare<'a>(&self, line: &'a str) -> Source<'a> {
        Source {
            origin: line,
            store: Store::Copied,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PooledStrategy {
    pub(crate) pool: BufferPool,
}

impl ParseStrategy for PooledStrategy {
    fn mode(&self) -> ParsingMode {
        ParsingMode::Pooled
    }

    fn prepare<'a>(&self, line: &'a str) -> Source<'a> {
        Source {
            origin: line,
            store: Store::Pooled(self.pool.rent(line)),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BalancedStrategy;

impl ParseStrategy for BalancedStrategy {
    fn mode(&self) -> ParsingMode {
        ParsingMode::Balanced
    }

    fn prepare<'a>(&self, line: &'a str) -> Source<'a> {
        Source {
            origin: line,
            store: Store::Shared(Arc::from(line)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_in() {
        let base = "PRIVMSG #bar :hello";
        assert_eq!(range_in(base, &base[14..]), Some(14..19));
        let elsewhere = String::from("hello");
        assert_eq!(range_in(base, &elsewhere), None);
    }

    #[test]
    fn test_balanced_keeps_only_body_as_view() {
        let s = "abc def";
        let source = BalancedStrategy.prepare(s);
        assert!(!source.text(Field::Small, &s[..3]).is_view());
        assert!(source.text(Field::Body, &s[4..]).is_view());
    }

    #[test]
    fn test_pooled_views_everything() {
        let strategy = PooledStrategy::default();
        let s = "abc def";
        let source = strategy.prepare(s);
        let small = source.text(Field::Small, &s[..3]);
        assert!(small.is_view());
        assert_eq!(small, "abc");
    }

    #[test]
    fn test_eager_copies_everything() {
        let s = "abc def";
        let source = EagerStrategy.prepare(s);
        assert!(!source.text(Field::Body, &s[4..]).is_view());
    }
}
