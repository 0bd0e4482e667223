//! Protocol line tokenizing.

mod nom_parser;
mod serialize;
pub mod tags;

pub use self::nom_parser::ParsedLine;
pub use self::tags::{TagIter, TagRef};
