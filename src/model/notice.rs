//! Server notices (`NOTICE`).

use std::fmt;

use super::Text;

macro_rules! notice_types {
    ($($variant:ident => $id:literal,)*) => {
        /// Classification of a notice, taken from its `msg-id` tag.
        ///
        /// Notices without a `msg-id`, or with one not listed here, are
        /// [`NoticeType::Unknown`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        #[non_exhaustive]
        pub enum NoticeType {
            $(
                #[doc = concat!("`", $id, "`")]
                $variant,
            )*
            /// Missing or unrecognized `msg-id`.
            Unknown,
        }

        impl NoticeType {
            /// Map a `msg-id` tag value.
            pub fn from_msg_id(id: &str) -> Self {
                match id {
                    $($id => Self::$variant,)*
                    _ => Self::Unknown,
                }
            }

            /// The `msg-id` this type was mapped from, if any.
            pub fn msg_id(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($id),)*
                    Self::Unknown => None,
                }
            }
        }
    };
}

notice_types! {
    AlreadyBanned => "already_banned",
    AlreadyEmoteOnlyOff => "already_emote_only_off",
    AlreadyEmoteOnlyOn => "already_emote_only_on",
    AlreadyFollowersOff => "already_followers_off",
    AlreadyFollowersOn => "already_followers_on",
    AlreadyR9kOff => "already_r9k_off",
    AlreadyR9kOn => "already_r9k_on",
    AlreadySlowOff => "already_slow_off",
    AlreadySlowOn => "already_slow_on",
    AlreadySubsOff => "already_subs_off",
    AlreadySubsOn => "already_subs_on",
    BadBanSelf => "bad_ban_self",
    BadDeleteMessageError => "bad_delete_message_error",
    BadTimeoutSelf => "bad_timeout_self",
    BanSuccess => "ban_success",
    CmdsAvailable => "cmds_available",
    ColorChanged => "color_changed",
    DeleteMessageSuccess => "delete_message_success",
    EmoteOnlyOff => "emote_only_off",
    EmoteOnlyOn => "emote_only_on",
    FollowersOff => "followers_off",
    FollowersOn => "followers_on",
    FollowersOnZero => "followers_on_zero",
    InvalidUser => "invalid_user",
    MsgBanned => "msg_banned",
    MsgChannelSuspended => "msg_channel_suspended",
    MsgDuplicate => "msg_duplicate",
    MsgEmoteOnly => "msg_emoteonly",
    MsgFollowersOnly => "msg_followersonly",
    MsgFollowersOnlyFollowed => "msg_followersonly_followed",
    MsgFollowersOnlyZero => "msg_followersonly_zero",
    MsgR9k => "msg_r9k",
    MsgRateLimit => "msg_ratelimit",
    MsgRejected => "msg_rejected",
    MsgRejectedMandatory => "msg_rejected_mandatory",
    MsgRequiresVerifiedPhoneNumber => "msg_requires_verified_phone_number",
    MsgSlowMode => "msg_slowmode",
    MsgSubsOnly => "msg_subsonly",
    MsgSuspended => "msg_suspended",
    MsgTimedOut => "msg_timedout",
    MsgVerifiedEmail => "msg_verified_email",
    NoPermission => "no_permission",
    R9kOff => "r9k_off",
    R9kOn => "r9k_on",
    SlowOff => "slow_off",
    SlowOn => "slow_on",
    SubsOff => "subs_off",
    SubsOn => "subs_on",
    TimeoutSuccess => "timeout_success",
    UnbanSuccess => "unban_success",
    UnrecognizedCmd => "unrecognized_cmd",
    UntimeoutSuccess => "untimeout_success",
}

impl Default for NoticeType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for NoticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg_id().unwrap_or("unknown"))
    }
}

/// A notice from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Notice {
    /// Classified notice type.
    pub kind: NoticeType,
    /// Channel without `#`, or `*` for notices not bound to a channel.
    pub channel: Text,
    /// Notice text, verbatim.
    pub message: Text,
}

impl Notice {
    /// Whether the notice is bound to a channel.
    pub fn is_global(&self) -> bool {
        self.channel == "*"
    }

    /// Detach every string field from the line buffer.
    #[must_use]
    pub fn into_owned(self) -> Self {
        Self {
            kind: self.kind,
            channel: self.channel.into_owned(),
            message: self.message.into_owned(),
        }
    }
}
