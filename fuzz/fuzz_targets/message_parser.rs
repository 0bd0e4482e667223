//! Fuzz target for line parsing
//!
//! Feeds arbitrary input to the tokenizer and every parsing mode, and to
//! the outgoing line sanitizer. None of them may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_tmi::{MessageParser, ParsedLine, ParsingMode};
use std::str;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = str::from_utf8(data) else {
        return;
    };
    if input.is_empty() || input.len() > slirc_tmi::MAX_LINE_LEN {
        return;
    }

    let _ = ParsedLine::parse(input);

    for mode in [ParsingMode::Eager, ParsingMode::Pooled, ParsingMode::Balanced] {
        if let Some(event) = MessageParser::new(mode).parse(input) {
            let _ = event.into_owned();
        }
    }

    let _ = slirc_tmi::transport::sanitize(input);
});
