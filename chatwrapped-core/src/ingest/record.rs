//! Raw export record parsing.
//!
//! One element of a `chat_*.json` array. Uses `#[serde(default)]`
//! liberally: a record missing a truly required field (guid, timestamp)
//! fails conversion for that record alone; the surrounding pass skips it
//! and continues, so one bad row never corrupts the rest of the timeline.

use crate::error::{Error, Result};
use crate::ingest::RunTimezone;
use crate::types::{Event, Message, Reaction, ReactionKind, SenderKey};

/// A single record as exported, before normalization.
#[derive(Debug, serde::Deserialize, Default)]
#[serde(default)]
pub struct RawRecord {
    pub id: Option<i64>,
    pub guid: Option<String>,
    /// ISO-8601, with timezone offset
    pub timestamp: Option<String>,
    pub sender: Option<String>,
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub is_reaction: bool,
    pub is_unsent: bool,
    pub attachment: Option<String>,
    pub is_reply: bool,
    pub reply_guids: Vec<String>,
    pub thread_originator_guid: Option<String>,
    /// Reaction only: guid of the message reacted to
    pub assoc_guid: Option<String>,
}

impl RawRecord {
    /// Convert into the normalized event model, localizing the timestamp
    /// into the run timezone.
    pub fn into_event(self, timezone: &RunTimezone, file: &str) -> Result<Event> {
        let guid = self.guid.ok_or_else(|| Error::Parse {
            file: file.to_string(),
            message: "record missing guid".to_string(),
        })?;
        let raw_ts = self.timestamp.ok_or_else(|| Error::Parse {
            file: file.to_string(),
            message: format!("record {guid} missing timestamp"),
        })?;
        let timestamp = timezone.normalize(&raw_ts).map_err(|e| Error::Parse {
            file: file.to_string(),
            message: format!("record {guid}: {e}"),
        })?;

        let id = self.id.unwrap_or_default();
        let sender = SenderKey::from_raw(self.sender);
        let sender_name = self.sender_name.unwrap_or_default();

        if self.is_reaction {
            let assoc_guid = self.assoc_guid.ok_or_else(|| Error::Parse {
                file: file.to_string(),
                message: format!("reaction {guid} missing assoc_guid"),
            })?;
            let kind = ReactionKind::from_text(self.text.as_deref());
            Ok(Event::Reaction(Reaction {
                id,
                guid,
                timestamp,
                sender,
                sender_name,
                text: self.text,
                is_unsent: self.is_unsent,
                assoc_guid,
                kind,
            }))
        } else {
            Ok(Event::Message(Message {
                id,
                guid,
                timestamp,
                sender,
                sender_name,
                text: self.text,
                is_unsent: self.is_unsent,
                attachment: self.attachment,
                is_reply: self.is_reply,
                thread_originator_guid: self.thread_originator_guid,
                reply_guids: self.reply_guids,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn eastern() -> RunTimezone {
        RunTimezone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap())
    }

    fn record(json: &str) -> RawRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_message_record_parses() {
        let raw = record(
            r#"{
                "id": 372484,
                "guid": "8ED96FF7",
                "timestamp": "2025-11-09T04:35:20.907900+00:00",
                "sender": null,
                "sender_name": "You",
                "text": "on my way",
                "is_reaction": false,
                "is_unsent": false,
                "attachment": null,
                "is_reply": false,
                "reply_guids": [],
                "thread_originator_guid": null
            }"#,
        );

        let event = raw.into_event(&eastern(), "chat_1.json").unwrap();
        let Event::Message(msg) = event else {
            panic!("expected message");
        };
        assert_eq!(msg.guid, "8ED96FF7");
        assert_eq!(msg.sender, SenderKey::Unknown);
        // 04:35 UTC is 23:35 the previous day in UTC-5.
        assert_eq!(
            msg.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            "2025-11-08 23:35"
        );
    }

    #[test]
    fn test_reaction_record_parses() {
        let raw = record(
            r#"{
                "id": 2,
                "guid": "R-1",
                "timestamp": "2025-11-09T04:36:00+00:00",
                "sender": "+15551234567",
                "sender_name": "Sam",
                "text": "Loved \"on my way\"",
                "is_reaction": true,
                "is_unsent": false,
                "assoc_guid": "8ED96FF7"
            }"#,
        );

        let event = raw.into_event(&eastern(), "chat_1.json").unwrap();
        let Event::Reaction(reaction) = event else {
            panic!("expected reaction");
        };
        assert_eq!(reaction.assoc_guid, "8ED96FF7");
        assert_eq!(reaction.kind, ReactionKind::Loved);
    }

    #[test]
    fn test_missing_timestamp_fails_single_record() {
        let raw = record(r#"{"guid": "X"}"#);
        assert!(raw.into_event(&eastern(), "chat_1.json").is_err());
    }

    #[test]
    fn test_reaction_without_assoc_guid_fails() {
        let raw = record(
            r#"{"guid": "X", "timestamp": "2025-01-01T00:00:00+00:00", "is_reaction": true}"#,
        );
        assert!(raw.into_event(&eastern(), "chat_1.json").is_err());
    }
}
