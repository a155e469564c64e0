//! Core domain types for chatwrapped
//!
//! These types represent the normalized event model every statistic
//! consumes: a conversation is an ordered stream of [`Event`]s, each either
//! a [`Message`] or a [`Reaction`]. Trackers pattern-match the variant
//! instead of inspecting runtime flags.
//!
//! All timestamps are naive wall-clock times in the run's single timezone;
//! ingest normalizes them before they reach this model and nothing below
//! this layer converts timezones again.

use chrono::NaiveDateTime;
use serde::Serialize;

// ============================================
// Senders
// ============================================

/// Identifier key for a message sender within one conversation.
///
/// An absent sender is a real, distinct bucket: events without a sender are
/// grouped under [`SenderKey::Unknown`], never merged with any named key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SenderKey {
    /// Sender identifier from the export (usually a phone number, or a
    /// self marker like "You").
    Named(String),
    /// Event carried no sender field.
    Unknown,
}

impl SenderKey {
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(s) => SenderKey::Named(s),
            None => SenderKey::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SenderKey::Named(s) => s,
            SenderKey::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SenderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for SenderKey {
    fn from(s: &str) -> Self {
        SenderKey::Named(s.to_string())
    }
}

/// Per-sender counter summary, built by the single pass over a thread.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SenderSummary {
    /// Display name as seen on the first event from this sender
    pub name: String,
    /// Messages sent (reactions excluded)
    pub messages_sent: u64,
    /// Reactions sent
    pub reactions_sent: u64,
    /// Unsent (retracted) items
    pub messages_unsent: u64,
    /// Messages carrying an attachment
    pub attachments_sent: u64,
}

// ============================================
// Events
// ============================================

/// A single conversation event: a message or a reaction to one.
#[derive(Debug, Clone)]
pub enum Event {
    Message(Message),
    Reaction(Reaction),
}

impl Event {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Event::Message(m) => m.timestamp,
            Event::Reaction(r) => r.timestamp,
        }
    }

    pub fn sender(&self) -> &SenderKey {
        match self {
            Event::Message(m) => &m.sender,
            Event::Reaction(r) => &r.sender,
        }
    }

    pub fn sender_name(&self) -> &str {
        match self {
            Event::Message(m) => &m.sender_name,
            Event::Reaction(r) => &r.sender_name,
        }
    }

    pub fn guid(&self) -> &str {
        match self {
            Event::Message(m) => &m.guid,
            Event::Reaction(r) => &r.guid,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Event::Message(m) => m.text.as_deref(),
            Event::Reaction(r) => r.text.as_deref(),
        }
    }

    pub fn is_unsent(&self) -> bool {
        match self {
            Event::Message(m) => m.is_unsent,
            Event::Reaction(r) => r.is_unsent,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Event::Message(m) => Some(m),
            Event::Reaction(_) => None,
        }
    }

    pub fn as_reaction(&self) -> Option<&Reaction> {
        match self {
            Event::Reaction(r) => Some(r),
            Event::Message(_) => None,
        }
    }
}

/// A standard message (not a reaction). Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Message {
    /// Row id from the export; may repeat across records mapped to the
    /// same underlying item, so it is never used as a lookup key.
    pub id: i64,
    /// Unique within the conversation
    pub guid: String,
    /// Localized wall-clock time
    pub timestamp: NaiveDateTime,
    pub sender: SenderKey,
    pub sender_name: String,
    /// Absent and empty are distinct for word-count purposes
    pub text: Option<String>,
    /// Unsent items are excluded from emoji/word-count extraction but still
    /// count as messages sent
    pub is_unsent: bool,
    /// Attachment filename or type hint, if any
    pub attachment: Option<String>,
    /// Whether this message is a threaded reply
    pub is_reply: bool,
    /// Guid of the message that started the reply thread
    pub thread_originator_guid: Option<String>,
    /// Guids of replies to this message, as recorded in the export
    pub reply_guids: Vec<String>,
}

impl Message {
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }
}

/// A reaction to a message. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub id: i64,
    pub guid: String,
    pub timestamp: NaiveDateTime,
    pub sender: SenderKey,
    pub sender_name: String,
    /// Raw reaction text, e.g. `Loved "see you there"`
    pub text: Option<String>,
    pub is_unsent: bool,
    /// Guid of the message this reacts to. The parent may appear later in
    /// the stream (or never); linkage is deferred, never fatal.
    pub assoc_guid: String,
    /// Parsed reaction kind
    pub kind: ReactionKind,
}

// ============================================
// Reaction kinds
// ============================================

/// The tapback kind carried by a reaction, parsed from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Loved,
    Liked,
    Disliked,
    Laughed,
    Emphasized,
    Questioned,
    RemovedLove,
    RemovedLike,
    RemovedDislike,
    RemovedLaugh,
    RemovedEmphasis,
    RemovedQuestion,
    /// A bare emoji reaction
    Emoji,
    Unknown,
}

impl ReactionKind {
    /// Text prefixes the export uses for each tapback kind. Longer removal
    /// prefixes come first so they are not shadowed by the short forms.
    const PREFIXES: &'static [(&'static str, ReactionKind)] = &[
        ("Removed a heart from", ReactionKind::RemovedLove),
        ("Removed a like from", ReactionKind::RemovedLike),
        ("Removed a dislike from", ReactionKind::RemovedDislike),
        ("Removed a laugh from", ReactionKind::RemovedLaugh),
        ("Removed an emphasis from", ReactionKind::RemovedEmphasis),
        ("Removed a question mark from", ReactionKind::RemovedQuestion),
        ("Loved", ReactionKind::Loved),
        ("Liked", ReactionKind::Liked),
        ("Disliked", ReactionKind::Disliked),
        ("Laughed at", ReactionKind::Laughed),
        ("Emphasized", ReactionKind::Emphasized),
        ("Questioned", ReactionKind::Questioned),
    ];

    /// Parse the reaction kind from its raw text.
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return ReactionKind::Unknown;
        };

        let lower = text.to_lowercase();
        for (prefix, kind) in Self::PREFIXES {
            if lower.starts_with(&prefix.to_lowercase()) {
                return *kind;
            }
        }

        // A reaction whose text opens with an emoji is a custom emoji tapback.
        if text
            .chars()
            .next()
            .map(|c| {
                let mut buf = [0u8; 4];
                emojis::get(c.encode_utf8(&mut buf)).is_some()
            })
            .unwrap_or(false)
        {
            return ReactionKind::Emoji;
        }

        ReactionKind::Unknown
    }

    /// Display emoji for this kind, if one applies.
    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            ReactionKind::Loved => Some("\u{2764}\u{FE0F}"),
            ReactionKind::Liked => Some("\u{1F44D}"),
            ReactionKind::Disliked => Some("\u{1F44E}"),
            ReactionKind::Laughed => Some("\u{1F602}"),
            ReactionKind::Emphasized => Some("\u{203C}\u{FE0F}"),
            ReactionKind::Questioned => Some("\u{2753}"),
            ReactionKind::RemovedLove => Some("\u{1F494}"),
            ReactionKind::RemovedLike => Some("\u{1F44E}"),
            ReactionKind::RemovedDislike => Some("\u{1F44D}"),
            ReactionKind::RemovedLaugh => Some("\u{1F610}"),
            ReactionKind::RemovedEmphasis => Some("\u{2796}"),
            ReactionKind::RemovedQuestion => Some("\u{2754}"),
            ReactionKind::Emoji | ReactionKind::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Loved => "loved",
            ReactionKind::Liked => "liked",
            ReactionKind::Disliked => "disliked",
            ReactionKind::Laughed => "laughed",
            ReactionKind::Emphasized => "emphasized",
            ReactionKind::Questioned => "questioned",
            ReactionKind::RemovedLove => "removed_love",
            ReactionKind::RemovedLike => "removed_like",
            ReactionKind::RemovedDislike => "removed_dislike",
            ReactionKind::RemovedLaugh => "removed_laugh",
            ReactionKind::RemovedEmphasis => "removed_emphasis",
            ReactionKind::RemovedQuestion => "removed_question",
            ReactionKind::Emoji => "emoji",
            ReactionKind::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_key_from_raw() {
        assert_eq!(
            SenderKey::from_raw(Some("+15551234567".into())),
            SenderKey::Named("+15551234567".into())
        );
        assert_eq!(SenderKey::from_raw(None), SenderKey::Unknown);
    }

    #[test]
    fn test_reaction_kind_parsing() {
        assert_eq!(
            ReactionKind::from_text(Some("Loved \"see you there\"")),
            ReactionKind::Loved
        );
        assert_eq!(
            ReactionKind::from_text(Some("Removed a like from \"ok\"")),
            ReactionKind::RemovedLike
        );
        assert_eq!(
            ReactionKind::from_text(Some("Laughed at \"no way\"")),
            ReactionKind::Laughed
        );
        assert_eq!(
            ReactionKind::from_text(Some("\u{1F602} to \"no way\"")),
            ReactionKind::Emoji
        );
        assert_eq!(ReactionKind::from_text(None), ReactionKind::Unknown);
    }

    #[test]
    fn test_removed_prefixes_not_shadowed() {
        // "Removed a dislike from" must not parse as a plain dislike.
        assert_eq!(
            ReactionKind::from_text(Some("Removed a dislike from \"hm\"")),
            ReactionKind::RemovedDislike
        );
    }
}
