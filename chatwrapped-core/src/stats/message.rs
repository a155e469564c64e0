//! Message volume tracker (messages and reactions).

use crate::period::Period;
use crate::stats::{BaseStatistic, ByHour, Timeline};
use crate::types::{Event, SenderKey};

/// Counts every event in the stream, reactions included.
#[derive(Debug, Clone, Default)]
pub struct MessageStatistic {
    base: BaseStatistic,
}

impl MessageStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        self.base.record(event.sender(), event.timestamp());
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

    pub(crate) fn base(&self) -> &BaseStatistic {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Reaction, ReactionKind};
    use chrono::NaiveDate;

    fn message(guid: &str, sender: &str, hour: u32) -> Event {
        Event::Message(Message {
            id: 1,
            guid: guid.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 4, 10)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            sender: SenderKey::from(sender),
            sender_name: sender.to_string(),
            text: Some("hey".to_string()),
            is_unsent: false,
            attachment: None,
            is_reply: false,
            thread_originator_guid: None,
            reply_guids: Vec::new(),
        })
    }

    fn reaction(guid: &str, sender: &str, hour: u32) -> Event {
        Event::Reaction(Reaction {
            id: 2,
            guid: guid.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 4, 10)
                .unwrap()
                .and_hms_opt(hour, 5, 0)
                .unwrap(),
            sender: SenderKey::from(sender),
            sender_name: sender.to_string(),
            text: Some("Loved \"hey\"".to_string()),
            is_unsent: false,
            assoc_guid: "m1".to_string(),
            kind: ReactionKind::Loved,
        })
    }

    #[test]
    fn test_counts_messages_and_reactions() {
        let mut stat = MessageStatistic::new();
        stat.record(&message("m1", "alice", 9));
        stat.record(&reaction("r1", "bob", 9));

        assert_eq!(stat.total(), 2);
        assert_eq!(stat.timeline(None, Period::Day).counts, vec![2]);
    }
}
