//! Message tag splitting and escaping utilities.

use std::borrow::Cow;
use std::fmt::{Result as FmtResult, Write};

/// Escape a tag value for serialization.
///
/// Escapes special characters according to the message-tags escaping rules.
pub fn escape_tag_value(f: &mut dyn Write, value: &str) -> FmtResult {
    for c in value.chars() {
        match c {
            ';' => f.write_str("\\:")?,
            ' ' => f.write_str("\\s")?,
            '\\' => f.write_str("\\\\")?,
            '\r' => f.write_str("\\r")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Unescape a tag value from wire format.
///
/// Reverses the escaping applied by [`escape_tag_value`]. Values without a
/// backslash are returned borrowed.
pub fn unescape_tag_value(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }

    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars();
    while let Some(c) = iter.next() {
        let r = if c == '\\' {
            match iter.next() {
                Some(':') => ';',
                Some('s') => ' ',
                Some('\\') => '\\',
                Some('r') => '\r',
                Some('n') => '\n',
                Some(c) => c,
                None => break,
            }
        } else {
            c
        };
        unescaped.push(r);
    }
    Cow::Owned(unescaped)
}

/// One `key[=value]` entry of a tag block, value still escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRef<'a> {
    /// Tag key, including any vendor prefix.
    pub key: &'a str,
    /// Raw (escaped) value; empty when the tag had no `=`.
    pub raw_value: &'a str,
}

impl<'a> TagRef<'a> {
    /// The unescaped value.
    pub fn value(&self) -> Cow<'a, str> {
        unescape_tag_value(self.raw_value)
    }
}

/// Iterator over the `;`-separated entries of a raw tag block.
#[derive(Debug, Clone)]
pub struct TagIter<'a> {
    rest: Option<&'a str>,
}

impl<'a> TagIter<'a> {
    /// Iterate the tag block `raw` (without the leading `@`).
    pub fn new(raw: &'a str) -> Self {
        Self {
            rest: (!raw.is_empty()).then_some(raw),
        }
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = TagRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = self.rest?;
            let (entry, next) = match rest.split_once(';') {
                Some((entry, next)) => (entry, Some(next)),
                None => (rest, None),
            };
            self.rest = next;

            if entry.is_empty() {
                continue;
            }

            let (key, raw_value) = entry.split_once('=').unwrap_or((entry, ""));
            return Some(TagRef { key, raw_value });
        }
    }
}
