//! Attachment volume tracker.

use crate::period::Period;
use crate::stats::{BaseStatistic, ByHour, Timeline};
use crate::types::{Event, SenderKey};

/// Counts messages carrying an attachment. Reactions never qualify.
#[derive(Debug, Clone, Default)]
pub struct AttachmentStatistic {
    base: BaseStatistic,
}

impl AttachmentStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        if let Event::Message(msg) = event {
            if msg.has_attachment() {
                self.base.record(&msg.sender, msg.timestamp);
            }
        }
    }

    pub fn timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.base.timeline(sender, period)
    }

    pub fn by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.base.by_hour(sender)
    }

    pub fn total(&self) -> u64 {
        self.base.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use chrono::NaiveDate;

    fn message(attachment: Option<&str>) -> Event {
        Event::Message(Message {
            id: 1,
            guid: "m1".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 4, 10)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            sender: SenderKey::from("alice"),
            sender_name: "Alice".to_string(),
            text: None,
            is_unsent: false,
            attachment: attachment.map(String::from),
            is_reply: false,
            thread_originator_guid: None,
            reply_guids: Vec::new(),
        })
    }

    #[test]
    fn test_only_messages_with_attachments_count() {
        let mut stat = AttachmentStatistic::new();
        stat.record(&message(Some("IMG_0001.heic")));
        stat.record(&message(None));

        assert_eq!(stat.total(), 1);
    }
}
