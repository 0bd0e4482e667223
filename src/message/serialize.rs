//! Re-serialization of tokenized lines.

use std::fmt::{Display, Formatter, Result as FmtResult};

use super::nom_parser::ParsedLine;
use super::tags::escape_tag_value;

impl Display for ParsedLine<'_> {
    /// Writes the line back in wire format, without the CRLF terminator.
    ///
    /// Tag values are re-escaped, so escape sequences come out in canonical
    /// form even if the input used a redundant one.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.tags.is_some() {
            f.write_str("@")?;
            for (i, tag) in self.tags().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                f.write_str(tag.key)?;
                if !tag.raw_value.is_empty() {
                    f.write_str("=")?;
                    escape_tag_value(f, &tag.value())?;
                }
            }
            f.write_str(" ")?;
        }

        if let Some(prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        f.write_str(self.command)?;

        for param in &self.params {
            write!(f, " {}", param)?;
        }

        if let Some(trailing) = self.trailing {
            write!(f, " :{}", trailing)?;
        }

        Ok(())
    }
}
