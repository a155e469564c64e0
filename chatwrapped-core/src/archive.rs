//! Cross-conversation aggregation.
//!
//! [`MessageArchive`] combines the same statistic across many
//! independently-computed conversations. Every conversation handed to it
//! is already fully populated and immutable, so aggregation is a pure read.
//!
//! The subtle part is date filtering: a week bucket keyed by its Monday can
//! begin before the range start yet contain in-range days. Filtering coarse
//! bucket keys directly would drop (or keep) whole weeks wrongly, so every
//! range-filtered combination of counts pulls daily resolution, filters
//! individual days, then re-buckets into the requested period.
//! List-valued statistics (response times, word counts, double-text gaps)
//! are filtered at their hour-resolution keys, which is exact.

use crate::conversation::Conversation;
use crate::period::{bucket_key, bucket_key_for_date, BucketKey, Period};
use crate::stats::{
    self, Average, ByHour, EmojiByHour, EmojiTimeline, MinutesByHour, MinutesTimeline,
    RatioTimeline, Timeline, WordsByHour, WordsTimeline,
};
use crate::types::SenderKey;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Minimum span, in days, for a conversation to participate in the
/// messages-per-day comparison sort. Tiny samples distort rate rankings.
const MIN_DAYS_FOR_RATE_RANKING: i64 = 5;

/// Conversation-name fragments that mark a chat as a group.
const GROUP_NAME_KEYWORDS: &[&str] = &["family", "group", "crew", "squad", "team", "club", "fam"];

// ============================================
// Date range
// ============================================

/// An inclusive date range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether any bound is set (an unbounded range filters nothing).
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Inclusive containment on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

// ============================================
// Per-conversation metadata
// ============================================

/// Summary metadata computed once per conversation at archive build time.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationMeta {
    pub name: String,
    pub is_group_chat: bool,
    pub participant_count: usize,
    pub participant_names: Vec<String>,
    pub total_messages: u64,
    pub total_reactions: u64,
    pub total_attachments: u64,
    pub first_message: Option<NaiveDateTime>,
    pub last_message: Option<NaiveDateTime>,
    /// Span between first and last event, floored at one day so rates are
    /// always defined.
    pub duration_days: i64,
    pub messages_per_day: f64,
    pub messages_sent_self: u64,
    pub messages_per_day_self: f64,
    pub median_words_per_message: f64,
    pub mean_words_per_message: f64,
    pub median_response_time_minutes: f64,
    pub mean_response_time_minutes: f64,
    pub total_double_texts: u64,
    pub double_texts_per_day: f64,
}

/// One row of the conversation comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub name: String,
    pub participant_names: Vec<String>,
    pub is_group_chat: bool,
    pub participant_count: usize,
    pub total_messages: u64,
    pub messages_per_day: f64,
    pub messages_sent_self: u64,
    pub messages_per_day_self: f64,
    pub duration_days: i64,
    pub total_reactions: u64,
    pub total_attachments: u64,
    pub median_words_per_message: f64,
    pub median_response_time_minutes: f64,
}

/// Metric to sort the comparison table by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMetric {
    TotalMessages,
    /// Rate sort; conversations spanning fewer than five days are excluded
    /// from this sort only.
    MessagesPerDay,
    MessagesPerDaySelf,
    MessagesSentSelf,
    ParticipantCount,
    TotalReactions,
    TotalAttachments,
    DurationDays,
    MedianResponseTime,
}

impl ComparisonMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMetric::TotalMessages => "total_messages",
            ComparisonMetric::MessagesPerDay => "messages_per_day",
            ComparisonMetric::MessagesPerDaySelf => "messages_per_day_self",
            ComparisonMetric::MessagesSentSelf => "messages_sent_self",
            ComparisonMetric::ParticipantCount => "participant_count",
            ComparisonMetric::TotalReactions => "total_reactions",
            ComparisonMetric::TotalAttachments => "total_attachments",
            ComparisonMetric::DurationDays => "duration_days",
            ComparisonMetric::MedianResponseTime => "median_response_time",
        }
    }
}

impl std::str::FromStr for ComparisonMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_messages" => Ok(ComparisonMetric::TotalMessages),
            "messages_per_day" => Ok(ComparisonMetric::MessagesPerDay),
            "messages_per_day_self" => Ok(ComparisonMetric::MessagesPerDaySelf),
            "messages_sent_self" => Ok(ComparisonMetric::MessagesSentSelf),
            "participant_count" => Ok(ComparisonMetric::ParticipantCount),
            "total_reactions" => Ok(ComparisonMetric::TotalReactions),
            "total_attachments" => Ok(ComparisonMetric::TotalAttachments),
            "duration_days" => Ok(ComparisonMetric::DurationDays),
            "median_response_time" => Ok(ComparisonMetric::MedianResponseTime),
            _ => Err(format!("unknown comparison metric: {}", s)),
        }
    }
}

/// Fastest and slowest conversations by response time.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseTimeExtremes {
    /// Slowest first (largest median/mean minutes)
    pub top: Vec<(String, f64)>,
    /// Fastest first
    pub bottom: Vec<(String, f64)>,
}

/// Per-conversation timelines for the top chats, on a shared date axis.
#[derive(Debug, Clone, Serialize)]
pub struct TopChatsTimeline {
    pub dates: Vec<BucketKey>,
    pub conversations: BTreeMap<String, Vec<u64>>,
}

/// Combined by-hour view whose values are medians or means of per-hour-slot
/// counts rather than plain sums.
#[derive(Debug, Clone, Serialize)]
pub struct AveragedByHour {
    pub hours: Vec<u32>,
    pub counts: Vec<f64>,
}

// ============================================
// Archive
// ============================================

/// Aggregates N fully-populated conversations.
pub struct MessageArchive {
    conversations: Vec<Conversation>,
    metadata: Vec<ConversationMeta>,
    self_label: String,
}

impl MessageArchive {
    /// Build an archive. `self_label` is the caller-facing label for the
    /// archive owner (typically "You"), resolved per conversation when
    /// self-centric metrics are computed.
    pub fn new(conversations: Vec<Conversation>, self_label: impl Into<String>) -> Self {
        let self_label = self_label.into();
        let metadata = conversations
            .iter()
            .map(|convo| Self::compute_metadata(convo, &self_label))
            .collect();

        tracing::info!(
            conversations = conversations.len(),
            "message archive assembled"
        );

        Self {
            conversations,
            metadata,
            self_label,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn metadata(&self) -> &[ConversationMeta] {
        &self.metadata
    }

    pub fn self_label(&self) -> &str {
        &self.self_label
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn compute_metadata(convo: &Conversation, self_label: &str) -> ConversationMeta {
        let total_messages: u64 = convo.senders().values().map(|s| s.messages_sent).sum();
        let total_reactions: u64 = convo.senders().values().map(|s| s.reactions_sent).sum();
        let total_attachments: u64 = convo.senders().values().map(|s| s.attachments_sent).sum();

        let first_message = convo.first_timestamp();
        let last_message = convo.last_timestamp();
        let duration_days = match (first_message, last_message) {
            (Some(first), Some(last)) => (last - first).num_days().max(1),
            _ => 1,
        };

        let self_key = resolve_sender_in(convo, Some(self_label));
        let messages_sent_self = self_key
            .as_ref()
            .and_then(|key| convo.senders().get(key))
            .map(|s| s.messages_sent)
            .unwrap_or(0);

        // Response-time summary: median/mean over the conversation's
        // non-zero daily medians.
        let daily = convo.response_time_timeline(None, Period::Day, Average::Median);
        let non_zero: Vec<f64> = daily
            .avg_minutes
            .iter()
            .copied()
            .filter(|m| *m > 0.0)
            .collect();

        let total_double_texts: u64 = convo
            .double_texts_timeline(None, Period::Day)
            .counts
            .iter()
            .sum();

        ConversationMeta {
            name: convo.name().to_string(),
            is_group_chat: is_group(convo),
            participant_count: convo.senders().len(),
            participant_names: convo.senders().values().map(|s| s.name.clone()).collect(),
            total_messages,
            total_reactions,
            total_attachments,
            first_message,
            last_message,
            duration_days,
            messages_per_day: total_messages as f64 / duration_days as f64,
            messages_sent_self,
            messages_per_day_self: messages_sent_self as f64 / duration_days as f64,
            median_words_per_message: convo.overall_words_per_message(None, Average::Median),
            mean_words_per_message: convo.overall_words_per_message(None, Average::Mean),
            median_response_time_minutes: stats::median(&non_zero),
            mean_response_time_minutes: stats::mean(&non_zero),
            total_double_texts,
            double_texts_per_day: total_double_texts as f64 / duration_days as f64,
        }
    }

    fn resolve_sender(&self, convo: &Conversation, label: Option<&str>) -> Option<SenderKey> {
        resolve_sender_in(convo, label)
    }

    // ============================================
    // Combined count timelines
    // ============================================

    /// Shared combination path for count timelines. Under an active range
    /// with a multi-day period, pulls daily data, filters days, re-buckets;
    /// otherwise filters the native bucket keys (exact at hour/day
    /// resolution).
    fn combined_count_timeline<F>(
        &self,
        label: Option<&str>,
        period: Period,
        range: &DateRange,
        query: F,
    ) -> Timeline
    where
        F: Fn(&Conversation, Option<&SenderKey>, Period) -> Timeline,
    {
        let mut aggregated: BTreeMap<BucketKey, u64> = BTreeMap::new();

        for convo in &self.conversations {
            let resolved = self.resolve_sender(convo, label);
            if range.is_active() && period.is_coarser_than_day() {
                let daily = query(convo, resolved.as_ref(), Period::Day);
                for (date, count) in daily.dates.iter().zip(&daily.counts) {
                    if !range.contains(date.date()) {
                        continue;
                    }
                    *aggregated
                        .entry(bucket_key_for_date(date.date(), period))
                        .or_insert(0) += count;
                }
            } else {
                let data = query(convo, resolved.as_ref(), period);
                for (key, count) in data.dates.iter().zip(&data.counts) {
                    if range.is_active() && !range.contains(key.date()) {
                        continue;
                    }
                    *aggregated.entry(*key).or_insert(0) += count;
                }
            }
        }

        Timeline::from_map(aggregated)
    }

    /// Combined message counts over time.
    pub fn combined_messages_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        range: &DateRange,
    ) -> Timeline {
        self.combined_count_timeline(label, period, range, |convo, sender, period| {
            convo.messages_timeline(sender, period)
        })
    }

    /// Combined attachment counts over time.
    pub fn combined_attachments_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        range: &DateRange,
    ) -> Timeline {
        self.combined_count_timeline(label, period, range, |convo, sender, period| {
            convo.attachments_timeline(sender, period)
        })
    }

    /// Combined double-text counts over time.
    pub fn combined_double_texts_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        range: &DateRange,
    ) -> Timeline {
        self.combined_count_timeline(label, period, range, |convo, sender, period| {
            convo.double_texts_timeline(sender, period)
        })
    }

    /// Combined total words over time.
    pub fn combined_total_words_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        range: &DateRange,
    ) -> Timeline {
        self.combined_count_timeline(label, period, range, |convo, sender, period| {
            convo.total_words_timeline(sender, period)
        })
    }

    // ============================================
    // Combined by-hour views
    // ============================================

    /// Message activity by hour: median or mean of the per-hour-slot counts
    /// observed across all conversations (one observation per slot), not a
    /// plain sum.
    pub fn combined_messages_by_hour(
        &self,
        label: Option<&str>,
        average: Average,
        range: &DateRange,
    ) -> AveragedByHour {
        let mut hour_values: [Vec<f64>; 24] = Default::default();

        for convo in &self.conversations {
            let stats = convo.message_stats();
            let slots = match label {
                Some(_) => {
                    let Some(resolved) = self.resolve_sender(convo, label) else {
                        continue;
                    };
                    match stats.base().sender_slots(&resolved) {
                        Some(slots) => slots,
                        None => continue,
                    }
                }
                None => stats.base().all_slots(),
            };

            for (slot, count) in slots {
                if range.is_active() && !range.contains(slot.date()) {
                    continue;
                }
                hour_values[chrono::Timelike::hour(slot) as usize].push(*count as f64);
            }
        }

        AveragedByHour {
            hours: (0..24).collect(),
            counts: hour_values.iter().map(|v| average.reduce(v)).collect(),
        }
    }

    /// Combined double-text counts by hour (plain sum).
    pub fn combined_double_texts_by_hour(&self, label: Option<&str>) -> ByHour {
        self.summed_by_hour(label, |convo, sender| convo.double_texts_by_hour(sender))
    }

    /// Combined attachment counts by hour (plain sum).
    pub fn combined_attachments_by_hour(&self, label: Option<&str>) -> ByHour {
        self.summed_by_hour(label, |convo, sender| convo.attachments_by_hour(sender))
    }

    fn summed_by_hour<F>(&self, label: Option<&str>, query: F) -> ByHour
    where
        F: Fn(&Conversation, Option<&SenderKey>) -> ByHour,
    {
        let mut counts = [0u64; 24];
        for convo in &self.conversations {
            let resolved = self.resolve_sender(convo, label);
            let data = query(convo, resolved.as_ref());
            for (hour, count) in data.counts.iter().enumerate() {
                counts[hour] += count;
            }
        }
        ByHour::from_counts(counts)
    }

    // ============================================
    // Combined emoji views
    // ============================================

    /// Top emojis across all conversations, descending by total use.
    pub fn combined_emoji_totals(
        &self,
        label: Option<&str>,
        top_n: usize,
        range: &DateRange,
    ) -> Vec<(String, u64)> {
        let mut totals: HashMap<String, u64> = HashMap::new();

        for convo in &self.conversations {
            let resolved = self.resolve_sender(convo, label);
            if range.is_active() {
                // Rebuild totals from daily buckets so the range applies.
                let data = convo.emoji_timeline(resolved.as_ref(), Period::Day, 0, true);
                for (emoji, counts) in &data.emojis {
                    for (date, count) in data.dates.iter().zip(counts) {
                        if !range.contains(date.date()) {
                            continue;
                        }
                        *totals.entry(emoji.clone()).or_insert(0) += count;
                    }
                }
            } else {
                for (emoji, count) in convo.emoji_totals(resolved.as_ref()) {
                    *totals.entry(emoji).or_insert(0) += count;
                }
            }
        }

        let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_n);
        ranked
    }

    /// Combined usage timeline for the top emojis.
    pub fn combined_emoji_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        top_n: usize,
        range: &DateRange,
    ) -> EmojiTimeline {
        let top_emojis: BTreeSet<String> = self
            .combined_emoji_totals(label, top_n, range)
            .into_iter()
            .map(|(emoji, _)| emoji)
            .collect();

        let mut timelines: BTreeMap<String, BTreeMap<BucketKey, u64>> = BTreeMap::new();

        for convo in &self.conversations {
            let resolved = self.resolve_sender(convo, label);
            if range.is_active() && period.is_coarser_than_day() {
                let data = convo.emoji_timeline(resolved.as_ref(), Period::Day, 0, true);
                for (emoji, counts) in &data.emojis {
                    if !top_emojis.contains(emoji) {
                        continue;
                    }
                    let buckets = timelines.entry(emoji.clone()).or_default();
                    for (date, count) in data.dates.iter().zip(counts) {
                        if !range.contains(date.date()) {
                            continue;
                        }
                        *buckets
                            .entry(bucket_key_for_date(date.date(), period))
                            .or_insert(0) += count;
                    }
                }
            } else {
                let data = convo.emoji_timeline(resolved.as_ref(), period, 0, true);
                for (emoji, counts) in &data.emojis {
                    if !top_emojis.contains(emoji) {
                        continue;
                    }
                    let buckets = timelines.entry(emoji.clone()).or_default();
                    for (key, count) in data.dates.iter().zip(counts) {
                        if range.is_active() && !range.contains(key.date()) {
                            continue;
                        }
                        *buckets.entry(*key).or_insert(0) += count;
                    }
                }
            }
        }

        let dates: Vec<BucketKey> = timelines
            .values()
            .flat_map(|buckets| buckets.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut emojis = BTreeMap::new();
        for (emoji, buckets) in timelines {
            let counts = dates
                .iter()
                .map(|date| buckets.get(date).copied().unwrap_or(0))
                .collect();
            emojis.insert(emoji, counts);
        }

        EmojiTimeline { dates, emojis }
    }

    /// Combined emoji usage by hour. The per-hour representation carries no
    /// dates, so this view has no range parameter.
    pub fn combined_emoji_by_hour(
        &self,
        label: Option<&str>,
        top_n: usize,
        include_all: bool,
    ) -> EmojiByHour {
        let top_emojis: Option<BTreeSet<String>> = if include_all {
            None
        } else {
            Some(
                self.combined_emoji_totals(label, top_n, &DateRange::unbounded())
                    .into_iter()
                    .map(|(emoji, _)| emoji)
                    .collect(),
            )
        };

        let mut sums: BTreeMap<String, [u64; 24]> = BTreeMap::new();
        for convo in &self.conversations {
            let resolved = self.resolve_sender(convo, label);
            let data = convo.emoji_by_hour(resolved.as_ref(), 0, true);
            for (emoji, counts) in &data.emojis {
                if let Some(top) = &top_emojis {
                    if !top.contains(emoji) {
                        continue;
                    }
                }
                let hours = sums.entry(emoji.clone()).or_insert([0; 24]);
                for (hour, count) in counts.iter().enumerate() {
                    hours[hour] += count;
                }
            }
        }

        EmojiByHour {
            hours: (0..24).collect(),
            emojis: sums
                .into_iter()
                .map(|(emoji, hours)| (emoji, hours.to_vec()))
                .collect(),
        }
    }

    // ============================================
    // Combined list-valued statistics
    // ============================================

    fn combined_value_slots<F>(
        &self,
        label: Option<&str>,
        range: &DateRange,
        slots_of: F,
    ) -> BTreeMap<NaiveDateTime, Vec<f64>>
    where
        F: Fn(&Conversation) -> &HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>>,
    {
        let mut merged: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();

        for convo in &self.conversations {
            let by_sender = slots_of(convo);
            let combined;
            let source = match label {
                Some(_) => {
                    let Some(resolved) = self.resolve_sender(convo, label) else {
                        continue;
                    };
                    match by_sender.get(&resolved) {
                        Some(slots) => slots,
                        None => continue,
                    }
                }
                None => {
                    combined = merge_sender_values(by_sender);
                    &combined
                }
            };

            for (slot, values) in source {
                if range.is_active() && !range.contains(slot.date()) {
                    continue;
                }
                merged.entry(*slot).or_default().extend_from_slice(values);
            }
        }

        merged
    }

    fn reduce_slots_to_minutes(
        slots: BTreeMap<NaiveDateTime, Vec<f64>>,
        period: Period,
        average: Average,
    ) -> MinutesTimeline {
        let mut aggregated: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();
        for (slot, values) in slots {
            aggregated
                .entry(bucket_key(slot, period))
                .or_default()
                .extend(values);
        }

        let mut dates = Vec::with_capacity(aggregated.len());
        let mut avg_minutes = Vec::with_capacity(aggregated.len());
        for (key, values) in aggregated {
            dates.push(key);
            avg_minutes.push(average.reduce(&values));
        }
        MinutesTimeline { dates, avg_minutes }
    }

    /// Combined response time over time.
    pub fn combined_response_time_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        average: Average,
        range: &DateRange,
    ) -> MinutesTimeline {
        let slots =
            self.combined_value_slots(label, range, |convo| convo.response_time_stats().response_slots());
        Self::reduce_slots_to_minutes(slots, period, average)
    }

    /// Combined response time by hour of day. Under an active range the
    /// per-hour lists are rebuilt from hour-slot keys so the range applies;
    /// otherwise the precomputed per-hour buckets are used directly.
    pub fn combined_response_time_by_hour(
        &self,
        label: Option<&str>,
        average: Average,
        range: &DateRange,
    ) -> MinutesByHour {
        let mut hour_values: [Vec<f64>; 24] = Default::default();

        if range.is_active() {
            let slots = self
                .combined_value_slots(label, range, |convo| convo.response_time_stats().response_slots());
            for (slot, values) in slots {
                hour_values[chrono::Timelike::hour(&slot) as usize].extend(values);
            }
        } else {
            for convo in &self.conversations {
                let by_sender = convo.response_time_stats().response_hours();
                let combined;
                let source = match label {
                    Some(_) => {
                        let Some(resolved) = self.resolve_sender(convo, label) else {
                            continue;
                        };
                        match by_sender.get(&resolved) {
                            Some(hours) => hours,
                            None => continue,
                        }
                    }
                    None => {
                        combined = merge_sender_hours(by_sender);
                        &combined
                    }
                };
                for (hour, values) in source.iter().enumerate() {
                    hour_values[hour].extend_from_slice(values);
                }
            }
        }

        MinutesByHour {
            hours: (0..24).collect(),
            avg_minutes: hour_values.iter().map(|v| average.reduce(v)).collect(),
        }
    }

    /// Combined time between double texts over time.
    pub fn combined_time_between_double_texts_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        average: Average,
        range: &DateRange,
    ) -> MinutesTimeline {
        let slots = self
            .combined_value_slots(label, range, |convo| convo.double_text_stats().time_between_slots());
        Self::reduce_slots_to_minutes(slots, period, average)
    }

    /// Combined time between double texts by hour. No date axis exists in
    /// this representation, so no range applies.
    pub fn combined_time_between_double_texts_by_hour(
        &self,
        label: Option<&str>,
        average: Average,
    ) -> MinutesByHour {
        let mut hour_values: [Vec<f64>; 24] = Default::default();

        for convo in &self.conversations {
            let by_sender = convo.double_text_stats().time_between_hours();
            let combined;
            let source = match label {
                Some(_) => {
                    let Some(resolved) = self.resolve_sender(convo, label) else {
                        continue;
                    };
                    match by_sender.get(&resolved) {
                        Some(hours) => hours,
                        None => continue,
                    }
                }
                None => {
                    combined = merge_sender_hours(by_sender);
                    &combined
                }
            };
            for (hour, values) in source.iter().enumerate() {
                hour_values[hour].extend_from_slice(values);
            }
        }

        MinutesByHour {
            hours: (0..24).collect(),
            avg_minutes: hour_values.iter().map(|v| average.reduce(v)).collect(),
        }
    }

    /// Combined words per message over time.
    pub fn combined_words_per_message_timeline(
        &self,
        label: Option<&str>,
        period: Period,
        average: Average,
        range: &DateRange,
    ) -> WordsTimeline {
        let slots = self
            .combined_value_slots(label, range, |convo| convo.word_count_stats().words_per_message_slots());
        let reduced = Self::reduce_slots_to_minutes(slots, period, average);
        WordsTimeline {
            dates: reduced.dates,
            avg_words: reduced.avg_minutes,
        }
    }

    /// Combined words per message by hour. No date axis exists in this
    /// representation, so no range applies.
    pub fn combined_words_per_message_by_hour(
        &self,
        label: Option<&str>,
        average: Average,
    ) -> WordsByHour {
        let mut hour_values: [Vec<f64>; 24] = Default::default();

        for convo in &self.conversations {
            let by_sender = convo.word_count_stats().words_per_message_hours();
            let combined;
            let source = match label {
                Some(_) => {
                    let Some(resolved) = self.resolve_sender(convo, label) else {
                        continue;
                    };
                    match by_sender.get(&resolved) {
                        Some(hours) => hours,
                        None => continue,
                    }
                }
                None => {
                    combined = merge_sender_hours(by_sender);
                    &combined
                }
            };
            for (hour, values) in source.iter().enumerate() {
                hour_values[hour].extend_from_slice(values);
            }
        }

        WordsByHour {
            hours: (0..24).collect(),
            avg_words: hour_values.iter().map(|v| average.reduce(v)).collect(),
        }
    }

    /// Combined sent/received ratio for one sender across conversations.
    pub fn combined_sent_received_ratio_timeline(
        &self,
        label: &str,
        period: Period,
    ) -> RatioTimeline {
        let mut sent_agg: BTreeMap<BucketKey, u64> = BTreeMap::new();
        let mut recv_agg: BTreeMap<BucketKey, u64> = BTreeMap::new();

        for convo in &self.conversations {
            let Some(resolved) = self.resolve_sender(convo, Some(label)) else {
                continue;
            };
            for (sender, slots) in convo.double_text_stats().sent_slots() {
                let target = if *sender == resolved {
                    &mut sent_agg
                } else {
                    &mut recv_agg
                };
                for (slot, count) in slots {
                    *target.entry(bucket_key(*slot, period)).or_insert(0) += count;
                }
            }
        }

        let dates: Vec<BucketKey> = sent_agg
            .keys()
            .chain(recv_agg.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut ratios = Vec::with_capacity(dates.len());
        let mut sent_counts = Vec::with_capacity(dates.len());
        let mut received_counts = Vec::with_capacity(dates.len());
        for date in &dates {
            let sent = sent_agg.get(date).copied().unwrap_or(0);
            let received = recv_agg.get(date).copied().unwrap_or(0);
            let total = sent + received;
            ratios.push(if total > 0 {
                sent as f64 / total as f64
            } else {
                0.5
            });
            sent_counts.push(sent);
            received_counts.push(received);
        }

        RatioTimeline {
            dates,
            ratios,
            sent_counts,
            received_counts,
        }
    }

    // ============================================
    // Totals and rankings
    // ============================================

    /// Total messages sent by `label` within the range.
    pub fn total_messages_sent(&self, label: &str, range: &DateRange) -> u64 {
        if !range.is_active() {
            // No range: the per-conversation sender counters already hold
            // the answer.
            return self
                .conversations
                .iter()
                .filter_map(|convo| {
                    let resolved = self.resolve_sender(convo, Some(label))?;
                    convo.senders().get(&resolved).map(|s| s.messages_sent)
                })
                .sum();
        }

        let mut total = 0;
        for convo in &self.conversations {
            let resolved = self.resolve_sender(convo, Some(label));
            let daily = convo.messages_timeline(resolved.as_ref(), Period::Day);
            for (date, count) in daily.dates.iter().zip(&daily.counts) {
                if range.contains(date.date()) {
                    total += count;
                }
            }
        }
        total
    }

    /// Number of 1-on-1 conversations where `label` sent at least
    /// `min_messages` messages within the range.
    pub fn count_direct_chats_with_min_messages(
        &self,
        label: &str,
        min_messages: u64,
        range: &DateRange,
    ) -> usize {
        self.conversations
            .iter()
            .filter(|convo| !is_group(convo))
            .filter(|convo| {
                let resolved = self.resolve_sender(convo, Some(label));
                let daily = convo.messages_timeline(resolved.as_ref(), Period::Day);
                let total: u64 = daily
                    .dates
                    .iter()
                    .zip(&daily.counts)
                    .filter(|(date, _)| !range.is_active() || range.contains(date.date()))
                    .map(|(_, count)| count)
                    .sum();
                total >= min_messages
            })
            .count()
    }

    /// Top conversations by messages `label` sent, descending.
    pub fn top_chats_by_messages_sent(
        &self,
        label: &str,
        n: usize,
        range: &DateRange,
    ) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .conversations
            .iter()
            .map(|convo| {
                let resolved = self.resolve_sender(convo, Some(label));
                let total = if range.is_active() {
                    let daily = convo.messages_timeline(resolved.as_ref(), Period::Day);
                    daily
                        .dates
                        .iter()
                        .zip(&daily.counts)
                        .filter(|(date, _)| range.contains(date.date()))
                        .map(|(_, count)| count)
                        .sum()
                } else {
                    resolved
                        .and_then(|key| convo.senders().get(&key))
                        .map(|s| s.messages_sent)
                        .unwrap_or(0)
                };
                (convo.name().to_string(), total)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Top 1-on-1 conversations by `label`'s average messages per day
    /// within the range. A conversation's day span is measured between its
    /// first and last in-range active days; conversations with no in-range
    /// activity are skipped.
    pub fn top_chats_by_avg_messages_per_day(
        &self,
        label: &str,
        n: usize,
        range: &DateRange,
    ) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .conversations
            .iter()
            .filter(|convo| !is_group(convo))
            .filter_map(|convo| {
                let resolved = self.resolve_sender(convo, Some(label));
                let daily = convo.messages_timeline(resolved.as_ref(), Period::Day);

                let mut dates: Vec<NaiveDate> = Vec::new();
                let mut total: u64 = 0;
                for (date, count) in daily.dates.iter().zip(&daily.counts) {
                    if range.is_active() && !range.contains(date.date()) {
                        continue;
                    }
                    dates.push(date.date());
                    total += count;
                }

                let first = *dates.first()?;
                let last = *dates.last()?;
                let days = (last - first).num_days() + 1;
                if days <= 0 {
                    return None;
                }
                Some((convo.name().to_string(), total as f64 / days as f64))
            })
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Slowest and fastest 1-on-1 conversations by `label`'s response time.
    pub fn top_bottom_chats_by_response_time(
        &self,
        label: &str,
        n: usize,
        average: Average,
        range: &DateRange,
    ) -> ResponseTimeExtremes {
        let mut ranked: Vec<(String, f64)> = self
            .conversations
            .iter()
            .filter(|convo| !is_group(convo))
            .filter_map(|convo| {
                let resolved = self.resolve_sender(convo, Some(label))?;
                let slots = convo.response_time_stats().response_slots().get(&resolved)?;

                let mut all_times: Vec<f64> = Vec::new();
                for (slot, times) in slots {
                    if range.is_active() && !range.contains(slot.date()) {
                        continue;
                    }
                    all_times.extend_from_slice(times);
                }
                if all_times.is_empty() {
                    return None;
                }
                Some((convo.name().to_string(), average.reduce(&all_times)))
            })
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let top = ranked.iter().take(n).cloned().collect();
        let bottom = ranked.iter().rev().take(n).cloned().collect();
        ResponseTimeExtremes { top, bottom }
    }

    /// Top conversations by attachments `label` sent, descending.
    pub fn top_chats_by_attachments_sent(
        &self,
        label: &str,
        n: usize,
        range: &DateRange,
    ) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .conversations
            .iter()
            .map(|convo| {
                let resolved = self.resolve_sender(convo, Some(label));
                let daily = convo.attachments_timeline(resolved.as_ref(), Period::Day);
                let total = daily
                    .dates
                    .iter()
                    .zip(&daily.counts)
                    .filter(|(date, _)| !range.is_active() || range.contains(date.date()))
                    .map(|(_, count)| count)
                    .sum();
                (convo.name().to_string(), total)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Aligned per-conversation timelines for the top `n` chats by message
    /// count within the range.
    pub fn top_chats_messages_timeline(
        &self,
        label: &str,
        n: usize,
        period: Period,
        range: &DateRange,
    ) -> TopChatsTimeline {
        struct Entry {
            name: String,
            total: u64,
            buckets: Vec<(BucketKey, u64)>,
        }

        let mut entries: Vec<Entry> = self
            .conversations
            .iter()
            .filter_map(|convo| {
                let resolved = self.resolve_sender(convo, Some(label));
                let data = convo.messages_timeline(resolved.as_ref(), period);

                let mut buckets = Vec::new();
                let mut total = 0;
                for (key, count) in data.dates.iter().zip(&data.counts) {
                    if range.is_active() && !range.contains(key.date()) {
                        continue;
                    }
                    buckets.push((*key, *count));
                    total += count;
                }
                if total == 0 {
                    return None;
                }
                Some(Entry {
                    name: convo.name().to_string(),
                    total,
                    buckets,
                })
            })
            .collect();

        entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        entries.truncate(n);

        let dates: Vec<BucketKey> = entries
            .iter()
            .flat_map(|entry| entry.buckets.iter().map(|(key, _)| *key))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut conversations = BTreeMap::new();
        for entry in entries {
            let lookup: BTreeMap<BucketKey, u64> = entry.buckets.into_iter().collect();
            let counts = dates
                .iter()
                .map(|date| lookup.get(date).copied().unwrap_or(0))
                .collect();
            conversations.insert(entry.name, counts);
        }

        TopChatsTimeline {
            dates,
            conversations,
        }
    }

    // ============================================
    // Comparison table
    // ============================================

    /// Conversation comparison, sorted descending by `metric`, truncated to
    /// `top_n` when given. With an active range the message totals, self
    /// counts, span and rates are recomputed from in-range daily data;
    /// otherwise precomputed metadata is used.
    pub fn conversation_comparison(
        &self,
        metric: ComparisonMetric,
        top_n: Option<usize>,
        range: &DateRange,
    ) -> Vec<ComparisonEntry> {
        let mut entries: Vec<ComparisonEntry> = self
            .conversations
            .iter()
            .zip(&self.metadata)
            .map(|(convo, meta)| {
                let (total_messages, messages_sent_self, duration_days) = if range.is_active() {
                    let daily = convo.messages_timeline(None, Period::Day);
                    let mut total = 0;
                    let mut in_range_dates: Vec<NaiveDate> = Vec::new();
                    for (date, count) in daily.dates.iter().zip(&daily.counts) {
                        if !range.contains(date.date()) {
                            continue;
                        }
                        total += count;
                        in_range_dates.push(date.date());
                    }

                    let resolved = self.resolve_sender(convo, Some(&self.self_label));
                    let self_daily = convo.messages_timeline(resolved.as_ref(), Period::Day);
                    let self_total = self_daily
                        .dates
                        .iter()
                        .zip(&self_daily.counts)
                        .filter(|(date, _)| range.contains(date.date()))
                        .map(|(_, count)| count)
                        .sum();

                    let span = match (range.start, range.end) {
                        (Some(start), Some(end)) => (end - start).num_days() + 1,
                        _ => match (in_range_dates.first(), in_range_dates.last()) {
                            (Some(first), Some(last)) => (*last - *first).num_days() + 1,
                            _ => 0,
                        },
                    };

                    (total, self_total, span.max(0))
                } else {
                    (
                        meta.total_messages,
                        meta.messages_sent_self,
                        meta.duration_days,
                    )
                };

                let per_day = |count: u64| {
                    if duration_days > 0 {
                        count as f64 / duration_days as f64
                    } else {
                        0.0
                    }
                };

                ComparisonEntry {
                    name: meta.name.clone(),
                    participant_names: meta.participant_names.clone(),
                    is_group_chat: meta.is_group_chat,
                    participant_count: meta.participant_count,
                    total_messages,
                    messages_per_day: per_day(total_messages),
                    messages_sent_self,
                    messages_per_day_self: per_day(messages_sent_self),
                    duration_days,
                    total_reactions: meta.total_reactions,
                    total_attachments: meta.total_attachments,
                    median_words_per_message: meta.median_words_per_message,
                    median_response_time_minutes: meta.median_response_time_minutes,
                }
            })
            .collect();

        match metric {
            ComparisonMetric::MessagesPerDay => {
                entries.retain(|entry| entry.duration_days >= MIN_DAYS_FOR_RATE_RANKING);
                entries.sort_by(|a, b| {
                    b.messages_per_day_self.total_cmp(&a.messages_per_day_self)
                });
            }
            ComparisonMetric::MessagesPerDaySelf => entries.sort_by(|a, b| {
                b.messages_per_day_self.total_cmp(&a.messages_per_day_self)
            }),
            ComparisonMetric::TotalMessages => {
                entries.sort_by(|a, b| b.total_messages.cmp(&a.total_messages))
            }
            ComparisonMetric::MessagesSentSelf => {
                entries.sort_by(|a, b| b.messages_sent_self.cmp(&a.messages_sent_self))
            }
            ComparisonMetric::ParticipantCount => {
                entries.sort_by(|a, b| b.participant_count.cmp(&a.participant_count))
            }
            ComparisonMetric::TotalReactions => {
                entries.sort_by(|a, b| b.total_reactions.cmp(&a.total_reactions))
            }
            ComparisonMetric::TotalAttachments => {
                entries.sort_by(|a, b| b.total_attachments.cmp(&a.total_attachments))
            }
            ComparisonMetric::DurationDays => {
                entries.sort_by(|a, b| b.duration_days.cmp(&a.duration_days))
            }
            ComparisonMetric::MedianResponseTime => entries.sort_by(|a, b| {
                b.median_response_time_minutes
                    .total_cmp(&a.median_response_time_minutes)
            }),
        }

        if let Some(top_n) = top_n {
            entries.truncate(top_n);
        }
        entries
    }
}

// ============================================
// Free helpers
// ============================================

/// Resolve a caller-facing sender label to a conversation's internal key:
/// direct key match first, then display name, else the label passes through
/// unchanged (best effort, never an error). `None` means "all senders".
fn resolve_sender_in(convo: &Conversation, label: Option<&str>) -> Option<SenderKey> {
    let label = label?;
    let direct = SenderKey::Named(label.to_string());
    if convo.senders().contains_key(&direct) {
        return Some(direct);
    }
    for (key, summary) in convo.senders() {
        if summary.name == label {
            return Some(key.clone());
        }
    }
    Some(direct)
}

/// Group-chat detection: separators or group-ish keywords in the mapped
/// name, with active-participant count as the fallback.
fn is_group(convo: &Conversation) -> bool {
    let name = convo.name();
    if name.contains(',') || name.contains('+') || name.contains(" & ") {
        return true;
    }
    let lower = name.to_lowercase();
    if lower.contains(" and ") || GROUP_NAME_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return true;
    }
    convo.senders().len() > 2
}

fn merge_sender_values(
    by_sender: &HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>>,
) -> BTreeMap<NaiveDateTime, Vec<f64>> {
    let mut merged: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
    for slots in by_sender.values() {
        for (slot, values) in slots {
            merged.entry(*slot).or_default().extend_from_slice(values);
        }
    }
    merged
}

fn merge_sender_hours(by_sender: &HashMap<SenderKey, [Vec<f64>; 24]>) -> [Vec<f64>; 24] {
    let mut merged: [Vec<f64>; 24] = Default::default();
    for hours in by_sender.values() {
        for (hour, values) in hours.iter().enumerate() {
            merged[hour].extend_from_slice(values);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, Message};
    use chrono::NaiveDate;

    fn message(guid: &str, sender: &str, name: &str, date: NaiveDate, hour: u32) -> Event {
        Event::Message(Message {
            id: 1,
            guid: guid.to_string(),
            timestamp: date.and_hms_opt(hour, 0, 0).unwrap(),
            sender: SenderKey::from(sender),
            sender_name: name.to_string(),
            text: Some("hello world".to_string()),
            is_unsent: false,
            attachment: None,
            is_reply: false,
            thread_originator_guid: None,
            reply_guids: Vec::new(),
        })
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn single_convo_archive(events: Vec<Event>) -> MessageArchive {
        MessageArchive::new(vec![Conversation::from_events("alice", events, 0)], "You")
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::bounded(day(2), day(4));
        assert!(range.contains(day(2)));
        assert!(range.contains(day(4)));
        assert!(!range.contains(day(5)));
        assert!(!DateRange::unbounded().is_active());
        assert!(DateRange::unbounded().contains(day(1)));
    }

    #[test]
    fn test_range_filter_rebuckets_from_daily() {
        // Mon Jun 2 = 3 messages, Tue Jun 3 = 4 messages, same week.
        // Filtering [Tue, Tue] at weekly granularity must yield counts=[4]
        // keyed by the week's Monday, even though that Monday is outside
        // the filter range.
        let mut events = Vec::new();
        for i in 0..3 {
            events.push(message(&format!("mon-{i}"), "+1555", "Alice", day(2), 9 + i));
        }
        for i in 0..4 {
            events.push(message(&format!("tue-{i}"), "+1555", "Alice", day(3), 9 + i));
        }
        let archive = single_convo_archive(events);

        let range = DateRange::bounded(day(3), day(3));
        let weekly = archive.combined_messages_timeline(None, Period::Week, &range);
        assert_eq!(weekly.dates, vec![BucketKey::Date(day(2))]);
        assert_eq!(weekly.counts, vec![4]);

        // Unfiltered: the whole week.
        let all = archive.combined_messages_timeline(None, Period::Week, &DateRange::unbounded());
        assert_eq!(all.counts, vec![7]);
    }

    #[test]
    fn test_sender_label_resolution() {
        // Sender key is a phone number; display name is "Alice". Both the
        // key and the display label resolve to the same data.
        let events = vec![
            message("m1", "+15550001", "Alice", day(2), 9),
            message("m2", "+15550002", "Bob", day(2), 10),
        ];
        let archive = single_convo_archive(events);

        let by_name =
            archive.combined_messages_timeline(Some("Alice"), Period::Day, &DateRange::unbounded());
        let by_key = archive.combined_messages_timeline(
            Some("+15550001"),
            Period::Day,
            &DateRange::unbounded(),
        );
        assert_eq!(by_name.counts, vec![1]);
        assert_eq!(by_key.counts, by_name.counts);

        // An unresolvable label passes through and simply matches nothing.
        let missing =
            archive.combined_messages_timeline(Some("Nobody"), Period::Day, &DateRange::unbounded());
        assert!(missing.counts.is_empty());
    }

    #[test]
    fn test_combined_sums_across_conversations() {
        let convo_a = Conversation::from_events(
            "alice",
            vec![message("a1", "+1", "Alice", day(2), 9)],
            0,
        );
        let convo_b = Conversation::from_events(
            "bob",
            vec![message("b1", "+2", "Bob", day(2), 9)],
            0,
        );
        let archive = MessageArchive::new(vec![convo_a, convo_b], "You");

        let combined =
            archive.combined_messages_timeline(None, Period::Day, &DateRange::unbounded());
        assert_eq!(combined.counts, vec![2]);
    }

    #[test]
    fn test_missing_statistic_contributes_zero() {
        // One conversation has attachments, the other none at all: the
        // empty one is silently skipped, never an error.
        let Event::Message(template) = message("a1", "+1", "Alice", day(2), 9) else {
            unreachable!()
        };
        let with = Conversation::from_events(
            "alice",
            vec![Event::Message(Message {
                attachment: Some("IMG.heic".to_string()),
                ..template
            })],
            0,
        );
        let without =
            Conversation::from_events("bob", vec![message("b1", "+2", "Bob", day(2), 9)], 0);
        let archive = MessageArchive::new(vec![with, without], "You");

        let combined =
            archive.combined_attachments_timeline(None, Period::Day, &DateRange::unbounded());
        assert_eq!(combined.counts, vec![1]);
    }

    #[test]
    fn test_group_detection() {
        let group_by_name = Conversation::from_events(
            "ski crew",
            vec![message("m1", "+1", "A", day(2), 9)],
            0,
        );
        assert!(is_group(&group_by_name));

        let group_by_count = Conversation::from_events(
            "chat_12",
            vec![
                message("m1", "+1", "A", day(2), 9),
                message("m2", "+2", "B", day(2), 10),
                message("m3", "+3", "C", day(2), 11),
            ],
            0,
        );
        assert!(is_group(&group_by_count));

        let direct = Conversation::from_events(
            "chat_13",
            vec![
                message("m1", "+1", "A", day(2), 9),
                message("m2", "+2", "B", day(2), 10),
            ],
            0,
        );
        assert!(!is_group(&direct));
    }

    #[test]
    fn test_rate_ranking_excludes_short_spans() {
        // Short conversation: huge rate over 1 day. Long conversation:
        // modest rate over 9 days. The rate sort keeps only the long one.
        let mut short_events = Vec::new();
        for i in 0..10 {
            short_events.push(message(&format!("s{i}"), "You", "You", day(2), 9 + (i % 8)));
        }
        let short = Conversation::from_events("brief", short_events, 0);

        let mut long_events = Vec::new();
        for d in 2..=10 {
            long_events.push(message(&format!("l{d}"), "You", "You", day(d), 9));
        }
        let long = Conversation::from_events("steady", long_events, 0);

        let archive = MessageArchive::new(vec![short, long], "You");
        let ranked = archive.conversation_comparison(
            ComparisonMetric::MessagesPerDay,
            None,
            &DateRange::unbounded(),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "steady");

        // Other sorts keep both.
        let by_total = archive.conversation_comparison(
            ComparisonMetric::TotalMessages,
            None,
            &DateRange::unbounded(),
        );
        assert_eq!(by_total.len(), 2);
        assert_eq!(by_total[0].name, "brief");
    }

    #[test]
    fn test_top_chats_by_messages_sent() {
        let a = Conversation::from_events(
            "alice",
            vec![
                message("a1", "You", "You", day(2), 9),
                message("a2", "You", "You", day(2), 10),
            ],
            0,
        );
        let b =
            Conversation::from_events("bob", vec![message("b1", "You", "You", day(2), 9)], 0);
        let archive = MessageArchive::new(vec![a, b], "You");

        let ranked = archive.top_chats_by_messages_sent("You", 5, &DateRange::unbounded());
        assert_eq!(
            ranked,
            vec![("alice".to_string(), 2), ("bob".to_string(), 1)]
        );
    }

    #[test]
    fn test_response_time_extremes() {
        // alice replies to You in 10 minutes, bob in 2.
        let a = Conversation::from_events(
            "alice",
            vec![
                message("a1", "You", "You", day(2), 9),
                message("a2", "+1", "Alice", day(2), 10),
            ],
            0,
        );
        let b = Conversation::from_events(
            "bob",
            vec![
                message("b1", "You", "You", day(2), 9),
                message("b2", "+2", "Bob", day(2), 10),
            ],
            0,
        );
        let archive = MessageArchive::new(vec![a, b], "You");

        // Measure the *other* side's responses by label per conversation:
        // here both respond in 60 minutes, so use self responses instead.
        let extremes = archive.top_bottom_chats_by_response_time(
            "Alice",
            1,
            Average::Median,
            &DateRange::unbounded(),
        );
        assert_eq!(extremes.top.len(), 1);
        assert_eq!(extremes.top[0].0, "alice");
    }

    #[test]
    fn test_top_chats_timeline_aligned() {
        let a = Conversation::from_events(
            "alice",
            vec![message("a1", "You", "You", day(2), 9)],
            0,
        );
        let b = Conversation::from_events(
            "bob",
            vec![message("b1", "You", "You", day(3), 9)],
            0,
        );
        let archive = MessageArchive::new(vec![a, b], "You");

        let top =
            archive.top_chats_messages_timeline("You", 5, Period::Day, &DateRange::unbounded());
        assert_eq!(top.dates.len(), 2);
        assert_eq!(top.conversations["alice"], vec![1, 0]);
        assert_eq!(top.conversations["bob"], vec![0, 1]);
    }

    #[test]
    fn test_total_messages_sent_range_and_fast_path() {
        let events = vec![
            message("m1", "You", "You", day(2), 9),
            message("m2", "You", "You", day(3), 9),
            message("m3", "+1", "Alice", day(3), 10),
        ];
        let archive = single_convo_archive(events);

        assert_eq!(
            archive.total_messages_sent("You", &DateRange::unbounded()),
            2
        );
        assert_eq!(
            archive.total_messages_sent("You", &DateRange::bounded(day(3), day(3))),
            1
        );
    }

    #[test]
    fn test_combined_messages_by_hour_median() {
        // Two conversations, each with 2 messages in hour 9 on the same
        // day: two hour-slot observations of 2 -> median 2.0.
        let a = Conversation::from_events(
            "alice",
            vec![
                message("a1", "+1", "Alice", day(2), 9),
                message("a2", "+1", "Alice", day(2), 9),
            ],
            0,
        );
        let b = Conversation::from_events(
            "bob",
            vec![
                message("b1", "+2", "Bob", day(2), 9),
                message("b2", "+2", "Bob", day(2), 9),
            ],
            0,
        );
        let archive = MessageArchive::new(vec![a, b], "You");

        let by_hour =
            archive.combined_messages_by_hour(None, Average::Median, &DateRange::unbounded());
        assert_eq!(by_hour.counts[9], 2.0);
        assert_eq!(by_hour.counts[10], 0.0);
        assert_eq!(by_hour.counts.len(), 24);
    }

    #[test]
    fn test_combined_emoji_totals_respects_range() {
        let mut events = vec![message("m1", "+1", "Alice", day(2), 9)];
        if let Event::Message(m) = &mut events[0] {
            m.text = Some("\u{1F602}".to_string());
        }
        let mut out_of_range = message("m2", "+1", "Alice", day(9), 9);
        if let Event::Message(m) = &mut out_of_range {
            m.text = Some("\u{1F44D}\u{1F44D}".to_string());
        }
        events.push(out_of_range);

        let archive = single_convo_archive(events);

        let all = archive.combined_emoji_totals(None, 10, &DateRange::unbounded());
        assert_eq!(all[0], ("\u{1F44D}".to_string(), 2));

        let ranged =
            archive.combined_emoji_totals(None, 10, &DateRange::bounded(day(1), day(5)));
        assert_eq!(ranged, vec![("\u{1F602}".to_string(), 1)]);
    }
}
