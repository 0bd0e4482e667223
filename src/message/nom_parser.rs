//! Nom-based line tokenizer.
//!
//! This module splits one protocol line into its tag block, prefix,
//! command, middle parameters and trailing parameter without copying.

use std::borrow::Cow;

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::{context, ErrorKind, VerboseError},
    sequence::preceded,
    IResult,
};

use crate::error::MessageParseError;
use crate::prefix::PrefixRef;

use super::tags::TagIter;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse the tag block (the part after `@` and before the first space).
fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context("parsing message tags", preceded(char('@'), take_until(" ")))(input)
}

/// Parse the line prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_while1(|c| c != ' ')),
    )(input)
}

/// Parse the command name (letters or a numeric reply code).
fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context("parsing command", take_while1(|c: char| c.is_ascii_alphanumeric()))(input)
}

/// Tokenize a complete line into its components.
///
/// Line format:
/// ```text
/// [@tags] [:prefix] <command> [params...] [:trailing]
/// ```
pub fn parse_line(input: &str) -> ParseResult<&str, ParsedLine<'_>> {
    let (input, tags) = context("parsing optional tags", opt(parse_tags))(input)?;
    let (input, _) = space0(input)?;

    let (input, prefix) = context("parsing optional prefix", opt(parse_prefix))(input)?;
    let (input, _) = space0(input)?;

    let (input, command) = context("parsing required command", parse_command)(input)?;

    let mut params: Vec<&str> = Vec::new();
    let mut trailing = None;
    let mut rest = input;

    loop {
        let skipped = rest.trim_start_matches(' ');
        if skipped.len() == rest.len() {
            break;
        }
        rest = skipped;

        if let Some(after_colon) = rest.strip_prefix(':') {
            // Everything after `:` until line end, spaces included
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            trailing = Some(&after_colon[..end]);
            rest = &after_colon[end..];
            break;
        }

        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        if end == 0 {
            break;
        }
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    Ok((
        rest,
        ParsedLine {
            tags,
            prefix,
            command,
            params,
            trailing,
        },
    ))
}

/// A tokenized protocol line with borrowed string slices.
///
/// Holds references into the original input for zero-copy parsing.
/// An empty trailing parameter (`PRIVMSG #ch :`) is `Some("")`, which is
/// distinct from no trailing parameter at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Raw tag block (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw prefix (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command name or numeric.
    pub command: &'a str,
    /// Middle parameters.
    pub params: Vec<&'a str>,
    /// Trailing parameter (without the leading `:`), if present.
    pub trailing: Option<&'a str>,
}

impl<'a> ParsedLine<'a> {
    /// Tokenize a line into a `ParsedLine`.
    ///
    /// A trailing CR/LF is tolerated. Unknown commands are not an error.
    pub fn parse(input: &'a str) -> Result<Self, MessageParseError> {
        let line = input.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        match parse_line(line) {
            Ok((_remaining, parsed)) => Ok(parsed),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let mut context_info = "parsing line";
                let mut position = line.len();
                let mut saw_command = false;

                for (error_input, error_kind) in &e.errors {
                    position = line.len() - error_input.len();
                    match error_kind {
                        nom::error::VerboseErrorKind::Context(ctx) => {
                            context_info = *ctx;
                            saw_command |= *ctx == "parsing command";
                        }
                        nom::error::VerboseErrorKind::Nom(ErrorKind::TakeWhile1) => {
                            saw_command = true;
                        }
                        _ => {}
                    }
                }

                if saw_command {
                    Err(MessageParseError::InvalidCommand)
                } else {
                    Err(MessageParseError::ParseContext {
                        position,
                        context: context_info,
                    })
                }
            }
            Err(nom::Err::Incomplete(_)) => Err(MessageParseError::ParseContext {
                position: line.len(),
                context: "incomplete input",
            }),
        }
    }

    /// Iterate over the tags of this line.
    pub fn tags(&self) -> TagIter<'a> {
        TagIter::new(self.tags.unwrap_or(""))
    }

    /// Look up a single tag value, unescaped.
    ///
    /// Returns `Some("")` for a key present without a value.
    pub fn tag(&self, key: &str) -> Option<Cow<'a, str>> {
        self.tags().find(|t| t.key == key).map(|t| t.value())
    }

    /// The parsed prefix, if any.
    pub fn prefix(&self) -> Option<PrefixRef<'a>> {
        self.prefix.map(PrefixRef::parse)
    }

    /// The `n`th middle parameter.
    pub fn param(&self, n: usize) -> Option<&'a str> {
        self.params.get(n).copied()
    }

    /// The first middle parameter, falling back to the trailing one.
    ///
    /// Some servers send the target of `JOIN`/`PART` as trailing.
    pub fn target(&self) -> Option<&'a str> {
        self.param(0).or(self.trailing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let msg = ParsedLine::parse("RECONNECT").unwrap();
        assert_eq!(msg.command, "RECONNECT");
        assert!(msg.tags.is_none());
        assert!(msg.prefix.is_none());
        assert!(msg.params.is_empty());
        assert!(msg.trailing.is_none());
    }

    #[test]
    fn test_parse_command_with_params() {
        let msg = ParsedLine::parse("PRIVMSG #channel :Hello, world!").unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#channel"]);
        assert_eq!(msg.trailing, Some("Hello, world!"));
    }

    #[test]
    fn test_parse_with_prefix() {
        let msg = ParsedLine::parse(":nick!user@host PART #channel").unwrap();
        assert_eq!(msg.prefix, Some("nick!user@host"));
        assert_eq!(msg.prefix().unwrap().nick(), Some("nick"));
        assert_eq!(msg.command, "PART");
        assert_eq!(msg.params, vec!["#channel"]);
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn test_parse_with_tags() {
        let msg = ParsedLine::parse("@room-id=1;slow=10 :tmi.twitch.tv ROOMSTATE #ch").unwrap();
        assert_eq!(msg.tags, Some("room-id=1;slow=10"));
        assert_eq!(msg.tag("slow").as_deref(), Some("10"));
        assert_eq!(msg.tag("missing"), None);
        assert_eq!(msg.prefix, Some("tmi.twitch.tv"));
        assert_eq!(msg.command, "ROOMSTATE");
    }

    #[test]
    fn test_parse_with_crlf() {
        let msg = ParsedLine::parse("PING :tmi.twitch.tv\r\n").unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.trailing, Some("tmi.twitch.tv"));
    }

    #[test]
    fn test_parse_numeric_response() {
        let msg = ParsedLine::parse(":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!").unwrap();
        assert_eq!(msg.command, "001");
        assert_eq!(msg.params, vec!["justinfan123"]);
        assert_eq!(msg.trailing, Some("Welcome, GLHF!"));
    }

    #[test]
    fn test_empty_trailing_is_distinct() {
        let empty = ParsedLine::parse("PRIVMSG #channel :").unwrap();
        assert_eq!(empty.trailing, Some(""));

        let none = ParsedLine::parse("PRIVMSG #channel").unwrap();
        assert_eq!(none.trailing, None);
    }

    #[test]
    fn test_trailing_keeps_colons_and_spaces() {
        let msg = ParsedLine::parse("PRIVMSG #ch :a :b  c").unwrap();
        assert_eq!(msg.trailing, Some("a :b  c"));
    }

    #[test]
    fn test_unknown_command_is_returned() {
        let msg = ParsedLine::parse(":tmi.twitch.tv USERSTATE #ch").unwrap();
        assert_eq!(msg.command, "USERSTATE");
    }

    #[test]
    fn test_missing_command_fails() {
        assert_eq!(ParsedLine::parse(""), Err(MessageParseError::EmptyMessage));
        assert_eq!(
            ParsedLine::parse(":prefix.only "),
            Err(MessageParseError::InvalidCommand)
        );
    }

    #[test]
    fn test_target_falls_back_to_trailing() {
        let msg = ParsedLine::parse(":a!a@a JOIN :#channel").unwrap();
        assert_eq!(msg.target(), Some("#channel"));
    }
}
