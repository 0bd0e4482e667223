//! String storage shared by the parsed message types.
//!
//! A [`Text`] is either an owned string or a view into the line it was
//! parsed from. Which one depends on the [`ParsingMode`](crate::ParsingMode)
//! the parser runs with; equality, hashing and formatting only look at the
//! content, so the same line compares equal under every mode.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, Range};
use std::sync::Arc;

use crate::parser::pool::PooledLine;

/// An immutable string that may borrow from a shared or pooled line buffer.
#[derive(Clone)]
pub struct Text(Repr);

#[derive(Clone)]
enum Repr {
    Owned(Box<str>),
    Shared { src: Arc<str>, range: Range<usize> },
    Pooled { src: Arc<PooledLine>, range: Range<usize> },
}

impl Text {
    /// An owned text holding a copy of `s`.
    pub fn owned(s: &str) -> Self {
        Self(Repr::Owned(s.into()))
    }

    pub(crate) fn shared(src: &Arc<str>, range: Range<usize>) -> Self {
        debug_assert!(src.get(range.clone()).is_some());
        Self(Repr::Shared {
            src: Arc::clone(src),
            range,
        })
    }

    pub(crate) fn pooled(src: &Arc<PooledLine>, range: Range<usize>) -> Self {
        debug_assert!(src.as_str().get(range.clone()).is_some());
        Self(Repr::Pooled {
            src: Arc::clone(src),
            range,
        })
    }

    /// The text content.
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Owned(s) => s,
            Repr::Shared { src, range } => src.get(range.clone()).unwrap_or_default(),
            Repr::Pooled { src, range } => src.as_str().get(range.clone()).unwrap_or_default(),
        }
    }

    /// Whether this text keeps a line buffer alive.
    pub fn is_view(&self) -> bool {
        !matches!(self.0, Repr::Owned(_))
    }

    /// Copy the content out of any shared or pooled buffer.
    ///
    /// Owned texts are returned unchanged.
    #[must_use]
    pub fn into_owned(self) -> Self {
        match self.0 {
            Repr::Owned(_) => self,
            _ => Self::owned(self.as_str()),
        }
    }
}

impl Default for Text {
    fn default() -> Self {
        Self(Repr::Owned(Box::default()))
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Text {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Text {}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for Text {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::owned(s)
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self(Repr::Owned(s.into_boxed_str()))
    }
}

impl From<Text> for String {
    fn from(t: Text) -> Self {
        match t.0 {
            Repr::Owned(s) => s.into_string(),
            _ => t.as_str().to_string(),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Text {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_compare_by_content() {
        let src: Arc<str> = Arc::from("PRIVMSG #bar :hello");
        let view = Text::shared(&src, 14..19);
        assert_eq!(view, "hello");
        assert_eq!(view, Text::owned("hello"));
        assert!(view.is_view());
    }

    #[test]
    fn test_into_owned_detaches() {
        let src: Arc<str> = Arc::from("abc");
        let view = Text::shared(&src, 1..3);
        let owned = view.into_owned();
        assert!(!owned.is_view());
        assert_eq!(owned, "bc");
        assert_eq!(Arc::strong_count(&src), 1);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Text::default().is_empty());
    }
}
