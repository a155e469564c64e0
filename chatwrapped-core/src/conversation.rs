//! A single conversation and its statistics.
//!
//! Construction runs the entire pipeline: index messages by guid, attach
//! reactions to their parents (deferring reactions that arrive before the
//! parent), build the per-sender summary table, and feed every event once,
//! in order, to all six statistic trackers. The finished value exposes no
//! mutating methods: trackers are populated exactly once and queried
//! thereafter, which is what makes it safe to hand many conversations to
//! the aggregator (or to build them on parallel threads) without locks.
//!
//! The event stream must already be in non-decreasing timestamp order;
//! double-text and response-time detection are sequence-dependent and are
//! undefined on a re-ordered or partial stream.

use crate::period::Period;
use crate::stats::{
    AttachmentStatistic, Average, ByHour, DoubleTextStatistic, EmojiByHour, EmojiStatistic,
    EmojiTimeline, MessageStatistic, MinutesByHour, MinutesTimeline, RatioTimeline,
    ResponseTimeStatistic, Timeline, WordCountStatistic, WordsByHour, WordsTimeline,
};
use crate::types::{Event, SenderKey, SenderSummary};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

/// One conversation: its ordered thread, linkage indexes, sender summary
/// and fully-populated statistic trackers.
#[derive(Debug)]
pub struct Conversation {
    name: String,
    thread: Vec<Event>,
    /// guid -> index into `thread`, messages only
    message_index: HashMap<String, usize>,
    /// parent message guid -> reaction indices into `thread`
    reaction_links: HashMap<String, Vec<usize>>,
    /// Reactions whose parent never appeared; retained in the thread but
    /// unattached.
    orphan_reactions: Vec<usize>,
    senders: BTreeMap<SenderKey, SenderSummary>,
    skipped_records: u64,

    message_stats: MessageStatistic,
    attachment_stats: AttachmentStatistic,
    emoji_stats: EmojiStatistic,
    double_text_stats: DoubleTextStatistic,
    response_time_stats: ResponseTimeStatistic,
    word_count_stats: WordCountStatistic,
}

impl Conversation {
    /// Build a conversation from an already-ordered event stream.
    ///
    /// `skipped_records` is the count of malformed records the parser
    /// dropped before this point; it is carried for diagnostics.
    pub fn from_events(name: impl Into<String>, events: Vec<Event>, skipped_records: u64) -> Self {
        let name = name.into();

        // Link reactions to parents. A reaction may precede its parent in
        // the stream; hold it in a pending table keyed by the referenced
        // guid and drain when the parent shows up.
        let mut message_index: HashMap<String, usize> = HashMap::new();
        let mut reaction_links: HashMap<String, Vec<usize>> = HashMap::new();
        let mut pending: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, event) in events.iter().enumerate() {
            match event {
                Event::Message(msg) => {
                    message_index.insert(msg.guid.clone(), idx);
                    if let Some(waiting) = pending.remove(&msg.guid) {
                        reaction_links
                            .entry(msg.guid.clone())
                            .or_default()
                            .extend(waiting);
                    }
                }
                Event::Reaction(reaction) => {
                    if message_index.contains_key(&reaction.assoc_guid) {
                        reaction_links
                            .entry(reaction.assoc_guid.clone())
                            .or_default()
                            .push(idx);
                    } else {
                        pending
                            .entry(reaction.assoc_guid.clone())
                            .or_default()
                            .push(idx);
                    }
                }
            }
        }

        let orphan_reactions: Vec<usize> = {
            let mut orphans: Vec<usize> = pending.into_values().flatten().collect();
            orphans.sort_unstable();
            orphans
        };
        if !orphan_reactions.is_empty() {
            tracing::debug!(
                conversation = %name,
                count = orphan_reactions.len(),
                "reactions reference messages not present in this conversation"
            );
        }

        // The single statistics pass.
        let mut senders: BTreeMap<SenderKey, SenderSummary> = BTreeMap::new();
        let mut message_stats = MessageStatistic::new();
        let mut attachment_stats = AttachmentStatistic::new();
        let mut emoji_stats = EmojiStatistic::new();
        let mut double_text_stats = DoubleTextStatistic::new();
        let mut response_time_stats = ResponseTimeStatistic::new();
        let mut word_count_stats = WordCountStatistic::new();

        for event in &events {
            let summary = senders.entry(event.sender().clone()).or_insert_with(|| {
                SenderSummary {
                    name: event.sender_name().to_string(),
                    ..Default::default()
                }
            });

            match event {
                Event::Message(msg) => {
                    summary.messages_sent += 1;
                    if msg.has_attachment() {
                        summary.attachments_sent += 1;
                    }
                }
                Event::Reaction(_) => summary.reactions_sent += 1,
            }
            if event.is_unsent() {
                summary.messages_unsent += 1;
            }

            message_stats.record(event);
            attachment_stats.record(event);
            emoji_stats.record(event);
            double_text_stats.record(event);
            response_time_stats.record(event);
            word_count_stats.record(event);
        }

        tracing::debug!(
            conversation = %name,
            events = events.len(),
            senders = senders.len(),
            skipped = skipped_records,
            "conversation statistics computed"
        );

        Self {
            name,
            thread: events,
            message_index,
            reaction_links,
            orphan_reactions,
            senders,
            skipped_records,
            message_stats,
            attachment_stats,
            emoji_stats,
            double_text_stats,
            response_time_stats,
            word_count_stats,
        }
    }

    // ============================================
    // Structure accessors
    // ============================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thread(&self) -> &[Event] {
        &self.thread
    }

    pub fn senders(&self) -> &BTreeMap<SenderKey, SenderSummary> {
        &self.senders
    }

    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    /// Look up a message event by guid.
    pub fn message(&self, guid: &str) -> Option<&Event> {
        self.message_index.get(guid).map(|idx| &self.thread[*idx])
    }

    /// Reactions attached to the message with the given guid.
    pub fn reactions_to(&self, guid: &str) -> impl Iterator<Item = &Event> {
        self.reaction_links
            .get(guid)
            .into_iter()
            .flatten()
            .map(|idx| &self.thread[*idx])
    }

    /// Reactions whose parent message never appeared.
    pub fn orphan_reactions(&self) -> impl Iterator<Item = &Event> {
        self.orphan_reactions.iter().map(|idx| &self.thread[*idx])
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.thread.first().map(Event::timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.thread.last().map(Event::timestamp)
    }

    // ============================================
    // Statistic queries
    // ============================================

    pub fn messages_timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.message_stats.timeline(sender, period)
    }

    pub fn messages_by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.message_stats.by_hour(sender)
    }

    pub fn attachments_timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.attachment_stats.timeline(sender, period)
    }

    pub fn attachments_by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.attachment_stats.by_hour(sender)
    }

    pub fn emoji_totals(&self, sender: Option<&SenderKey>) -> Vec<(String, u64)> {
        self.emoji_stats.totals(sender)
    }

    pub fn emoji_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        top_n: usize,
        include_all: bool,
    ) -> EmojiTimeline {
        self.emoji_stats.item_timeline(sender, period, top_n, include_all)
    }

    pub fn emoji_by_hour(
        &self,
        sender: Option<&SenderKey>,
        top_n: usize,
        include_all: bool,
    ) -> EmojiByHour {
        self.emoji_stats.item_by_hour(sender, top_n, include_all)
    }

    pub fn double_texts_timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.double_text_stats.timeline(sender, period)
    }

    pub fn double_texts_by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.double_text_stats.by_hour(sender)
    }

    pub fn time_between_double_texts_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        average: Average,
    ) -> MinutesTimeline {
        self.double_text_stats
            .time_between_timeline(sender, period, average)
    }

    pub fn time_between_double_texts_by_hour(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> MinutesByHour {
        self.double_text_stats.time_between_by_hour(sender, average)
    }

    pub fn sent_received_ratio_timeline(
        &self,
        sender: &SenderKey,
        period: Period,
    ) -> RatioTimeline {
        self.double_text_stats
            .sent_received_ratio_timeline(sender, period)
    }

    pub fn response_times_timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.response_time_stats.timeline(sender, period)
    }

    pub fn response_times_by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.response_time_stats.by_hour(sender)
    }

    pub fn response_time_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        average: Average,
    ) -> MinutesTimeline {
        self.response_time_stats
            .response_time_timeline(sender, period, average)
    }

    pub fn response_time_by_hour(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> MinutesByHour {
        self.response_time_stats.response_time_by_hour(sender, average)
    }

    pub fn total_words_timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.word_count_stats.total_words_timeline(sender, period)
    }

    pub fn words_per_message_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        average: Average,
    ) -> WordsTimeline {
        self.word_count_stats
            .words_per_message_timeline(sender, period, average)
    }

    pub fn words_per_message_by_hour(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> WordsByHour {
        self.word_count_stats.words_per_message_by_hour(sender, average)
    }

    pub fn overall_words_per_message(&self, sender: Option<&SenderKey>, average: Average) -> f64 {
        self.word_count_stats.overall_words_per_message(sender, average)
    }

    // ============================================
    // Raw tracker access for the aggregator
    // ============================================

    pub(crate) fn message_stats(&self) -> &MessageStatistic {
        &self.message_stats
    }

    pub(crate) fn double_text_stats(&self) -> &DoubleTextStatistic {
        &self.double_text_stats
    }

    pub(crate) fn response_time_stats(&self) -> &ResponseTimeStatistic {
        &self.response_time_stats
    }

    pub(crate) fn word_count_stats(&self) -> &WordCountStatistic {
        &self.word_count_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Reaction, ReactionKind};
    use chrono::NaiveDate;

    fn message(guid: &str, sender: &str, minute: u32) -> Event {
        Event::Message(Message {
            id: 1,
            guid: guid.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(9, minute, 0)
                .unwrap(),
            sender: SenderKey::from(sender),
            sender_name: sender.to_string(),
            text: Some("hello there".to_string()),
            is_unsent: false,
            attachment: None,
            is_reply: false,
            thread_originator_guid: None,
            reply_guids: Vec::new(),
        })
    }

    fn reaction(guid: &str, assoc: &str, sender: &str, minute: u32) -> Event {
        Event::Reaction(Reaction {
            id: 2,
            guid: guid.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(9, minute, 0)
                .unwrap(),
            sender: SenderKey::from(sender),
            sender_name: sender.to_string(),
            text: Some("Loved \"hello there\"".to_string()),
            is_unsent: false,
            assoc_guid: assoc.to_string(),
            kind: ReactionKind::Loved,
        })
    }

    #[test]
    fn test_sender_summary_counters() {
        let convo = Conversation::from_events(
            "test",
            vec![
                message("m1", "alice", 0),
                message("m2", "alice", 1),
                reaction("r1", "m1", "bob", 2),
            ],
            0,
        );

        let alice = &convo.senders()[&SenderKey::from("alice")];
        assert_eq!(alice.messages_sent, 2);
        assert_eq!(alice.reactions_sent, 0);

        let bob = &convo.senders()[&SenderKey::from("bob")];
        assert_eq!(bob.messages_sent, 0);
        assert_eq!(bob.reactions_sent, 1);
    }

    #[test]
    fn test_reaction_attaches_to_parent() {
        let convo = Conversation::from_events(
            "test",
            vec![message("m1", "alice", 0), reaction("r1", "m1", "bob", 1)],
            0,
        );

        let attached: Vec<_> = convo.reactions_to("m1").collect();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].guid(), "r1");
        assert_eq!(convo.orphan_reactions().count(), 0);
    }

    #[test]
    fn test_reaction_before_parent_is_deferred_then_attached() {
        // The reaction arrives first; linkage happens when the parent shows
        // up later in the stream.
        let convo = Conversation::from_events(
            "test",
            vec![reaction("r1", "m1", "bob", 0), message("m1", "alice", 1)],
            0,
        );

        let attached: Vec<_> = convo.reactions_to("m1").collect();
        assert_eq!(attached.len(), 1);
        assert_eq!(convo.orphan_reactions().count(), 0);
    }

    #[test]
    fn test_orphan_reaction_retained_not_fatal() {
        let convo = Conversation::from_events(
            "test",
            vec![message("m1", "alice", 0), reaction("r1", "missing", "bob", 1)],
            0,
        );

        assert_eq!(convo.orphan_reactions().count(), 1);
        // The orphan still participates in the thread and statistics.
        assert_eq!(convo.thread().len(), 2);
        assert_eq!(convo.messages_timeline(None, Period::Day).counts, vec![2]);
    }

    #[test]
    fn test_all_trackers_fed() {
        let convo = Conversation::from_events(
            "test",
            vec![
                message("m1", "alice", 0),
                message("m2", "alice", 5),
                message("m3", "bob", 10),
            ],
            0,
        );

        assert_eq!(convo.messages_timeline(None, Period::Day).counts, vec![3]);
        assert_eq!(
            convo
                .double_texts_timeline(Some(&SenderKey::from("alice")), Period::Day)
                .counts,
            vec![1]
        );
        assert_eq!(
            convo
                .response_time_timeline(Some(&SenderKey::from("bob")), Period::Day, Average::Median)
                .avg_minutes,
            vec![5.0]
        );
        assert_eq!(
            convo.total_words_timeline(None, Period::Day).counts,
            vec![6]
        );
    }

    #[test]
    fn test_first_last_timestamps() {
        let convo = Conversation::from_events(
            "test",
            vec![message("m1", "alice", 0), message("m2", "bob", 30)],
            0,
        );
        assert_eq!(
            convo.first_timestamp().unwrap().format("%H:%M").to_string(),
            "09:00"
        );
        assert_eq!(
            convo.last_timestamp().unwrap().format("%H:%M").to_string(),
            "09:30"
        );
    }
}
