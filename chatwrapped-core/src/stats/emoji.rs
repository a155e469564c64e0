//! Emoji usage tracker.
//!
//! A keyed variant of the base shape: one counter per (emoji, bucket)
//! rather than one per bucket. Extraction segments message text into
//! grapheme clusters and classifies each cluster against the maintained
//! emoji table, so ZWJ sequences and skin-tone modifiers count as one
//! emoji instead of several fragments.

use crate::period::{bucket_key, hour_of_day, hour_slot, BucketKey, Period};
use crate::stats::{EmojiByHour, EmojiTimeline};
use crate::types::{Event, Message, SenderKey};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use unicode_segmentation::UnicodeSegmentation;

/// All emoji grapheme clusters in a message's text.
///
/// Unsent messages contribute nothing.
pub fn extract_emojis(msg: &Message) -> Vec<&str> {
    if msg.is_unsent {
        return Vec::new();
    }
    let Some(text) = msg.text.as_deref() else {
        return Vec::new();
    };
    text.graphemes(true)
        .filter(|grapheme| emojis::get(grapheme).is_some())
        .collect()
}

/// Tracks per-emoji usage over time and by hour of day.
#[derive(Debug, Clone, Default)]
pub struct EmojiStatistic {
    item_timeline: HashMap<String, BTreeMap<NaiveDateTime, u64>>,
    item_timeline_by_sender: HashMap<SenderKey, HashMap<String, BTreeMap<NaiveDateTime, u64>>>,
    item_by_hour: HashMap<String, [u64; 24]>,
    item_by_hour_by_sender: HashMap<SenderKey, HashMap<String, [u64; 24]>>,
    totals: HashMap<String, u64>,
    totals_by_sender: HashMap<SenderKey, HashMap<String, u64>>,
}

impl EmojiStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record emojis from a message. Reactions are excluded: their text is
    /// boilerplate ("Loved ..."), not authored emoji usage.
    pub fn record(&mut self, event: &Event) {
        let Event::Message(msg) = event else {
            return;
        };
        let found: Vec<String> = extract_emojis(msg)
            .into_iter()
            .map(String::from)
            .collect();
        if found.is_empty() {
            return;
        }

        let slot = hour_slot(msg.timestamp);
        let hour = hour_of_day(msg.timestamp) as usize;

        for emoji in found {
            *self
                .item_timeline
                .entry(emoji.clone())
                .or_default()
                .entry(slot)
                .or_insert(0) += 1;
            *self
                .item_timeline_by_sender
                .entry(msg.sender.clone())
                .or_default()
                .entry(emoji.clone())
                .or_default()
                .entry(slot)
                .or_insert(0) += 1;
            self.item_by_hour.entry(emoji.clone()).or_insert([0; 24])[hour] += 1;
            self.item_by_hour_by_sender
                .entry(msg.sender.clone())
                .or_default()
                .entry(emoji.clone())
                .or_insert([0; 24])[hour] += 1;
            *self.totals.entry(emoji.clone()).or_insert(0) += 1;
            *self
                .totals_by_sender
                .entry(msg.sender.clone())
                .or_default()
                .entry(emoji)
                .or_insert(0) += 1;
        }
    }

    /// Total usage per emoji, unordered.
    pub fn totals(&self, sender: Option<&SenderKey>) -> Vec<(String, u64)> {
        let source = match sender {
            Some(key) => match self.totals_by_sender.get(key) {
                Some(map) => map,
                None => return Vec::new(),
            },
            None => &self.totals,
        };
        source
            .iter()
            .map(|(emoji, count)| (emoji.clone(), *count))
            .collect()
    }

    /// Emoji usage over time for line graphing.
    ///
    /// When `include_all` is false, the emoji set is the "frequently
    /// prominent" selection: for every bucket, find which emojis rank in
    /// that bucket's top `top_n`, then keep the `top_n` emojis that placed
    /// most often. This differs deliberately from a global top-N by total:
    /// a briefly-viral emoji loses to one that is steadily near the top.
    pub fn item_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        top_n: usize,
        include_all: bool,
    ) -> EmojiTimeline {
        let source = match sender {
            Some(key) => match self.item_timeline_by_sender.get(key) {
                Some(map) => map,
                None => return EmojiTimeline::empty(),
            },
            None => &self.item_timeline,
        };

        let mut aggregated: HashMap<&str, BTreeMap<BucketKey, u64>> = HashMap::new();
        for (emoji, slots) in source {
            let buckets = aggregated.entry(emoji.as_str()).or_default();
            for (slot, count) in slots {
                *buckets.entry(bucket_key(*slot, period)).or_insert(0) += count;
            }
        }

        let selected: Vec<&str> = if include_all {
            let mut all: Vec<&str> = aggregated.keys().copied().collect();
            all.sort_unstable();
            all
        } else {
            Self::frequently_prominent(&aggregated, top_n)
        };

        let dates: Vec<BucketKey> = selected
            .iter()
            .flat_map(|emoji| aggregated[emoji].keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut emojis = BTreeMap::new();
        for emoji in selected {
            let buckets = &aggregated[emoji];
            let counts = dates
                .iter()
                .map(|date| buckets.get(date).copied().unwrap_or(0))
                .collect();
            emojis.insert(emoji.to_string(), counts);
        }

        EmojiTimeline { dates, emojis }
    }

    /// Emoji usage by hour of day.
    ///
    /// Selection here is a plain global-total top-N, not the per-bucket
    /// prominence vote used by [`Self::item_timeline`].
    pub fn item_by_hour(
        &self,
        sender: Option<&SenderKey>,
        top_n: usize,
        include_all: bool,
    ) -> EmojiByHour {
        let source = match sender {
            Some(key) => match self.item_by_hour_by_sender.get(key) {
                Some(map) => map,
                None => return EmojiByHour::empty(),
            },
            None => &self.item_by_hour,
        };

        let mut selected: Vec<(&str, u64)> = source
            .iter()
            .map(|(emoji, hours)| (emoji.as_str(), hours.iter().sum()))
            .collect();
        selected.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        if !include_all {
            selected.truncate(top_n);
        }

        let mut emojis = BTreeMap::new();
        for (emoji, _) in selected {
            emojis.insert(emoji.to_string(), source[emoji].to_vec());
        }

        EmojiByHour {
            hours: (0..24).collect(),
            emojis,
        }
    }

    /// The per-bucket top-N vote behind the timeline selection. Ties break
    /// lexicographically for determinism.
    fn frequently_prominent<'a>(
        aggregated: &HashMap<&'a str, BTreeMap<BucketKey, u64>>,
        top_n: usize,
    ) -> Vec<&'a str> {
        let all_buckets: BTreeSet<BucketKey> = aggregated
            .values()
            .flat_map(|buckets| buckets.keys().copied())
            .collect();

        let mut placements: HashMap<&str, u64> = HashMap::new();
        for bucket in &all_buckets {
            let mut in_bucket: Vec<(&str, u64)> = aggregated
                .iter()
                .map(|(emoji, buckets)| (*emoji, buckets.get(bucket).copied().unwrap_or(0)))
                .collect();
            in_bucket.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (emoji, _) in in_bucket.into_iter().take(top_n) {
                *placements.entry(emoji).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, u64)> = placements.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(top_n);
        ranked.into_iter().map(|(emoji, _)| emoji).collect()
    }
}
