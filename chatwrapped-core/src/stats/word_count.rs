//! Word-count tracker.
//!
//! Applies to messages only (never reactions) with non-empty text. A word
//! is a whitespace-delimited token. Messages with zero words — empty or
//! whitespace-only text — are recorded nowhere: not even as a zero entry.
//!
//! Two aggregations are maintained and exposed separately: the list of
//! per-message counts per bucket (for median/mean words-per-message) and a
//! running total per bucket (for sum views).

use crate::period::{bucket_key, hour_of_day, hour_slot, BucketKey, Period};
use crate::stats::double_text::{merge_hour_lists, merge_value_timelines};
use crate::stats::{Average, BaseStatistic, ByHour, Timeline, WordsByHour, WordsTimeline};
use crate::types::{Event, SenderKey};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

/// Tracks words-per-message distributions and total word volume.
#[derive(Debug, Clone, Default)]
pub struct WordCountStatistic {
    base: BaseStatistic,
    words_per_message_timeline: HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>>,
    words_per_message_by_hour: HashMap<SenderKey, [Vec<f64>; 24]>,
    total_words_timeline: HashMap<SenderKey, BTreeMap<NaiveDateTime, u64>>,
    total_words_by_hour: HashMap<SenderKey, [u64; 24]>,
    messages_seen: u64,
    messages_recorded: u64,
}

impl WordCountStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        let Event::Message(msg) = event else {
            return;
        };
        self.messages_seen += 1;

        if msg.is_unsent {
            return;
        }
        let Some(text) = msg.text.as_deref() else {
            return;
        };

        let word_count = text.split_whitespace().count() as u64;
        if word_count == 0 {
            return;
        }
        self.messages_recorded += 1;

        let slot = hour_slot(msg.timestamp);
        let hour = hour_of_day(msg.timestamp) as usize;

        self.words_per_message_timeline
            .entry(msg.sender.clone())
            .or_default()
            .entry(slot)
            .or_default()
            .push(word_count as f64);
        self.words_per_message_by_hour
            .entry(msg.sender.clone())
            .or_default()[hour]
            .push(word_count as f64);
        *self
            .total_words_timeline
            .entry(msg.sender.clone())
            .or_default()
            .entry(slot)
            .or_insert(0) += word_count;
        self.total_words_by_hour
            .entry(msg.sender.clone())
            .or_insert([0; 24])[hour] += word_count;

        self.base.record(&msg.sender, msg.timestamp);
    }

    /// Count of messages with text, over time.
    pub fn timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.base.timeline(sender, period)
    }

    /// Count of messages with text, by hour of day.
    pub fn by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.base.by_hour(sender)
    }

    /// Total words over time (sum view).
    pub fn total_words_timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        let combined;
        let source = match sender {
            Some(key) => match self.total_words_timeline.get(key) {
                Some(timeline) => timeline,
                None => return Timeline::empty(),
            },
            None => {
                combined = merge_count_timelines(self.total_words_timeline.values());
                &combined
            }
        };

        let mut aggregated: BTreeMap<BucketKey, u64> = BTreeMap::new();
        for (slot, count) in source {
            *aggregated.entry(bucket_key(*slot, period)).or_insert(0) += count;
        }
        Timeline::from_map(aggregated)
    }

    /// Words per message over time, median or mean per bucket.
    pub fn words_per_message_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        average: Average,
    ) -> WordsTimeline {
        let combined;
        let source = match sender {
            Some(key) => match self.words_per_message_timeline.get(key) {
                Some(timeline) => timeline,
                None => return WordsTimeline::empty(),
            },
            None => {
                combined = merge_value_timelines(self.words_per_message_timeline.values());
                &combined
            }
        };

        let mut aggregated: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();
        for (slot, counts) in source {
            aggregated
                .entry(bucket_key(*slot, period))
                .or_default()
                .extend_from_slice(counts);
        }

        let mut dates = Vec::with_capacity(aggregated.len());
        let mut avg_words = Vec::with_capacity(aggregated.len());
        for (key, counts) in aggregated {
            dates.push(key);
            avg_words.push(average.reduce(&counts));
        }
        WordsTimeline { dates, avg_words }
    }

    /// Words per message by hour of day, median or mean.
    ///
    /// The per-hour lists carry no date information, so this view cannot be
    /// date-filtered; it always reflects the conversation's full span.
    pub fn words_per_message_by_hour(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> WordsByHour {
        let combined;
        let source = match sender {
            Some(key) => match self.words_per_message_by_hour.get(key) {
                Some(hours) => hours,
                None => {
                    return WordsByHour {
                        hours: (0..24).collect(),
                        avg_words: vec![0.0; 24],
                    }
                }
            },
            None => {
                combined = merge_hour_lists(self.words_per_message_by_hour.values());
                &combined
            }
        };

        WordsByHour {
            hours: (0..24).collect(),
            avg_words: source.iter().map(|counts| average.reduce(counts)).collect(),
        }
    }

    /// Overall words per message across all time.
    pub fn overall_words_per_message(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> f64 {
        let combined;
        let source = match sender {
            Some(key) => match self.words_per_message_timeline.get(key) {
                Some(timeline) => timeline,
                None => return 0.0,
            },
            None => {
                combined = merge_value_timelines(self.words_per_message_timeline.values());
                &combined
            }
        };

        let all_counts: Vec<f64> = source.values().flatten().copied().collect();
        average.reduce(&all_counts)
    }

    /// Raw per-message count lists at hour resolution.
    pub(crate) fn words_per_message_slots(
        &self,
    ) -> &HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>> {
        &self.words_per_message_timeline
    }

    /// Raw per-message count lists by hour of day.
    pub(crate) fn words_per_message_hours(&self) -> &HashMap<SenderKey, [Vec<f64>; 24]> {
        &self.words_per_message_by_hour
    }

    /// Raw word totals at hour resolution.
    pub(crate) fn total_words_slots(
        &self,
    ) -> &HashMap<SenderKey, BTreeMap<NaiveDateTime, u64>> {
        &self.total_words_timeline
    }

    /// (seen, recorded) message counts, for pass diagnostics.
    pub fn recording_stats(&self) -> (u64, u64) {
        (self.messages_seen, self.messages_recorded)
    }
}

/// Merge several per-sender hour-slot count maps into one.
pub(crate) fn merge_count_timelines<'a>(
    sources: impl Iterator<Item = &'a BTreeMap<NaiveDateTime, u64>>,
) -> BTreeMap<NaiveDateTime, u64> {
    let mut merged: BTreeMap<NaiveDateTime, u64> = BTreeMap::new();
    for source in sources {
        for (slot, count) in source {
            *merged.entry(*slot).or_insert(0) += count;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use chrono::NaiveDate;

    fn message(sender: &str, hour: u32, text: Option<&str>) -> Event {
        Event::Message(Message {
            id: 1,
            guid: format!("{sender}-{hour}"),
            timestamp: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            sender: SenderKey::from(sender),
            sender_name: sender.to_string(),
            text: text.map(String::from),
            is_unsent: false,
            attachment: None,
            is_reply: false,
            thread_originator_guid: None,
            reply_guids: Vec::new(),
        })
    }

    #[test]
    fn test_whitespace_only_recorded_nowhere() {
        let mut stat = WordCountStatistic::new();
        stat.record(&message("a", 9, Some("   ")));

        assert!(stat.words_per_message_slots().is_empty());
        assert!(stat.total_words_slots().is_empty());
        assert_eq!(stat.timeline(None, Period::Day).counts, Vec::<u64>::new());
        assert_eq!(stat.recording_stats(), (1, 0));
    }

    #[test]
    fn test_missing_text_recorded_nowhere() {
        let mut stat = WordCountStatistic::new();
        stat.record(&message("a", 9, None));
        assert!(stat.total_words_slots().is_empty());
    }

    #[test]
    fn test_word_counting() {
        let mut stat = WordCountStatistic::new();
        stat.record(&message("a", 9, Some("one two  three")));
        stat.record(&message("a", 9, Some("four")));

        let a = SenderKey::from("a");
        let totals = stat.total_words_timeline(Some(&a), Period::Day);
        assert_eq!(totals.counts, vec![4]);

        let per_message =
            stat.words_per_message_timeline(Some(&a), Period::Day, Average::Median);
        assert_eq!(per_message.avg_words, vec![2.0]);
    }

    #[test]
    fn test_overall_average() {
        let mut stat = WordCountStatistic::new();
        stat.record(&message("a", 9, Some("one")));
        stat.record(&message("a", 10, Some("one two")));
        stat.record(&message("a", 11, Some("one two three four five six")));

        assert_eq!(
            stat.overall_words_per_message(Some(&SenderKey::from("a")), Average::Median),
            2.0
        );
        assert_eq!(
            stat.overall_words_per_message(None, Average::Mean),
            3.0
        );
        assert_eq!(stat.overall_words_per_message(Some(&SenderKey::from("b")), Average::Median), 0.0);
    }

    #[test]
    fn test_unsent_excluded() {
        let mut stat = WordCountStatistic::new();
        let Event::Message(mut msg) = message("a", 9, Some("should not count")) else {
            unreachable!()
        };
        msg.is_unsent = true;
        stat.record(&Event::Message(msg));

        assert!(stat.total_words_slots().is_empty());
    }
}
