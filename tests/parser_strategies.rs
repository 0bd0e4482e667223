//! Integration tests for the parsing strategies.
//!
//! All three modes must agree on content; they differ only in whether the
//! resulting text fields keep a line buffer alive.

use slirc_tmi::parser::pool::BufferPool;
use slirc_tmi::{Color, Event, MessageParser, NoticeType, ParsingMode};

const PRIVMSG: &str = "@badge-info=subscriber/22;badges=moderator/1,subscriber/12;\
client-nonce=fe4b5b1e5b4bfb8d4a6c2bc1b8e2f4f1;color=#19E6E6;display-name=Strbhlfe;emotes=;\
first-msg=0;flags=;id=7eb848c9-1060-4e5e-9f4c-612877982e79;mod=1;room-id=616177816;\
subscriber=1;tmi-sent-ts=1654020883875;turbo=0;user-id=87633910;user-type=mod \
:strbhlfe!strbhlfe@strbhlfe.tmi.twitch.tv PRIVMSG #lbnshlfe :xd xd xd";

const ACTION: &str = "@color=;display-name=Strbhlfe;room-id=616177816;user-id=87633910 \
:strbhlfe!strbhlfe@strbhlfe.tmi.twitch.tv PRIVMSG #lbnshlfe :\x01ACTION waves\x01";

const NOTICE: &str = "@msg-id=msg_channel_suspended :tmi.twitch.tv NOTICE #lbnshlfe \
:This channel does not exist or has been suspended.";

fn chat(parser: &MessageParser, line: &str) -> slirc_tmi::ChatMessage {
    match parser.parse(line) {
        Some(Event::ChatMessage(msg)) => msg,
        other => panic!("Expected chat message, got {:?}", other),
    }
}

#[test]
fn test_all_modes_read_the_same_message() {
    for mode in [ParsingMode::Eager, ParsingMode::Pooled, ParsingMode::Balanced] {
        let parser = MessageParser::new(mode);
        assert_eq!(parser.mode(), mode);

        let msg = chat(&parser, PRIVMSG);
        assert_eq!(msg.username, "strbhlfe");
        assert_eq!(msg.display_name, "Strbhlfe");
        assert_eq!(msg.channel, "lbnshlfe");
        assert_eq!(msg.message, "xd xd xd");
        assert_eq!(msg.channel_id, 616177816);
        assert_eq!(msg.user_id, 87633910);
        assert_eq!(msg.tmi_sent_ts, 1654020883875);
        assert_eq!(msg.color, Color::parse_hex("#19E6E6").unwrap());
        assert!(msg.is_moderator && msg.is_subscriber);
        assert!(!msg.is_turbo && !msg.is_first_message && !msg.is_action);
        assert_eq!(msg.id.to_string(), "7eb848c9-1060-4e5e-9f4c-612877982e79");
        assert_eq!(msg.badges.len(), 2);
    }
}

#[test]
fn test_action_in_every_mode() {
    for mode in [ParsingMode::Eager, ParsingMode::Pooled, ParsingMode::Balanced] {
        let msg = chat(&MessageParser::new(mode), ACTION);
        assert!(msg.is_action);
        assert_eq!(msg.message, "waves");
        assert_eq!(msg.color, Color::DEFAULT);
    }
}

#[test]
fn test_eager_owns_everything() {
    let msg = chat(&MessageParser::new(ParsingMode::Eager), PRIVMSG);
    assert!(!msg.message.is_view());
    assert!(!msg.username.is_view());
    assert!(!msg.channel.is_view());
}

#[test]
fn test_balanced_shares_only_the_body() {
    let msg = chat(&MessageParser::new(ParsingMode::Balanced), PRIVMSG);
    assert!(msg.message.is_view());
    assert!(!msg.username.is_view());
    assert!(!msg.channel.is_view());
    assert!(!msg.display_name.is_view());
}

#[test]
fn test_pooled_views_everything() {
    let msg = chat(&MessageParser::new(ParsingMode::Pooled), PRIVMSG);
    assert!(msg.message.is_view());
    assert!(msg.username.is_view());
    assert!(msg.channel.is_view());
}

#[test]
fn test_pooled_buffers_are_recycled() {
    let pool = BufferPool::new(4);
    let parser = MessageParser::pooled(pool.clone());
    assert_eq!(pool.idle(), 0);

    let first = chat(&parser, PRIVMSG);
    let second = chat(&parser, PRIVMSG);
    assert_eq!(pool.idle(), 0);

    drop(first);
    assert_eq!(pool.idle(), 1);

    // An owned copy releases the buffer too.
    let owned = Event::ChatMessage(second).into_owned();
    assert_eq!(pool.idle(), 2);

    let third = chat(&parser, PRIVMSG);
    assert_eq!(pool.idle(), 1);
    assert_eq!(Event::ChatMessage(third), owned);
}

#[test]
fn test_pool_keeps_at_most_max_idle() {
    let pool = BufferPool::new(2);
    let parser = MessageParser::pooled(pool.clone());

    let held: Vec<_> = (0..5).map(|_| chat(&parser, PRIVMSG)).collect();
    drop(held);
    assert_eq!(pool.idle(), 2);
}

#[test]
fn test_notice_in_every_mode() {
    for mode in [ParsingMode::Eager, ParsingMode::Pooled, ParsingMode::Balanced] {
        match MessageParser::new(mode).parse(NOTICE) {
            Some(Event::Notice(notice)) => {
                assert_eq!(notice.kind, NoticeType::MsgChannelSuspended);
                assert_eq!(notice.channel, "lbnshlfe");
                assert!(!notice.is_global());
            }
            other => panic!("Expected notice, got {:?}", other),
        }
    }
}

#[test]
fn test_unhandled_lines() {
    for mode in [ParsingMode::Eager, ParsingMode::Pooled, ParsingMode::Balanced] {
        let parser = MessageParser::new(mode);
        assert!(parser.parse(":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!").is_none());
        assert!(parser.parse(":tmi.twitch.tv CAP * ACK :twitch.tv/tags").is_none());
        assert!(parser.parse("").is_none());
        assert!(parser.parse("@ :").is_none());
    }
}
