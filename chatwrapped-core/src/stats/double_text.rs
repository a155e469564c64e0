//! Double-text tracker.
//!
//! A double-text is a message from the same sender as the immediately
//! preceding message, with nothing from anyone else in between. Detection
//! is a sequential state machine over Messages only; reactions neither
//! count as double-texts nor break a streak.

use crate::period::{bucket_key, hour_of_day, hour_slot, BucketKey, Period};
use crate::stats::{
    Average, BaseStatistic, ByHour, MinutesByHour, MinutesTimeline, RatioTimeline, Timeline,
};
use crate::types::{Event, SenderKey};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
struct StreakState {
    last_sender: SenderKey,
    last_time: NaiveDateTime,
    /// Anchor for "time since" measurements. Re-assigned to the previous
    /// message on every detected double-text, so gaps are measured against
    /// the immediately preceding message of the streak, not its first.
    streak_anchor: Option<NaiveDateTime>,
}

/// Tracks double-texting patterns and the sent/received balance.
#[derive(Debug, Clone, Default)]
pub struct DoubleTextStatistic {
    base: BaseStatistic,
    time_between_timeline: HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>>,
    time_between_by_hour: HashMap<SenderKey, [Vec<f64>; 24]>,
    /// Every message (double-text or not) lands here; the sent/received
    /// ratio is derived from it, fully decoupled from streak detection.
    sent_timeline: HashMap<SenderKey, BTreeMap<NaiveDateTime, u64>>,
    state: Option<StreakState>,
}

impl DoubleTextStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        // Reactions don't count for double texting and don't break streaks.
        let Event::Message(msg) = event else {
            return;
        };

        let slot = hour_slot(msg.timestamp);
        let hour = hour_of_day(msg.timestamp) as usize;

        *self
            .sent_timeline
            .entry(msg.sender.clone())
            .or_default()
            .entry(slot)
            .or_insert(0) += 1;

        let next_anchor = match &self.state {
            // Two unknown-sender messages in a row are not a double text:
            // there is no evidence they came from the same person.
            Some(state)
                if state.last_sender == msg.sender && msg.sender != SenderKey::Unknown =>
            {
                // Double text.
                self.base.record(&msg.sender, msg.timestamp);
                tracing::debug!(
                    sender = %msg.sender,
                    at = %msg.timestamp,
                    "double text detected"
                );

                if let Some(anchor) = state.streak_anchor {
                    let minutes =
                        (msg.timestamp - anchor).num_seconds() as f64 / 60.0;
                    self.time_between_timeline
                        .entry(msg.sender.clone())
                        .or_default()
                        .entry(slot)
                        .or_default()
                        .push(minutes);
                    self.time_between_by_hour
                        .entry(msg.sender.clone())
                        .or_default()[hour]
                        .push(minutes);
                }

                // Advance the anchor to the previous message in the streak.
                Some(state.last_time)
            }
            // Sender changed (or first message): open a potential streak.
            _ => Some(msg.timestamp),
        };

        self.state = Some(StreakState {
            last_sender: msg.sender.clone(),
            last_time: msg.timestamp,
            streak_anchor: next_anchor,
        });
    }

    pub fn timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.base.timeline(sender, period)
    }

    pub fn by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.base.by_hour(sender)
    }

    /// Minutes between consecutive messages of a streak, over time.
    pub fn time_between_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        average: Average,
    ) -> MinutesTimeline {
        let combined;
        let source = match sender {
            Some(key) => match self.time_between_timeline.get(key) {
                Some(timeline) => timeline,
                None => return MinutesTimeline::empty(),
            },
            None => {
                combined = merge_value_timelines(self.time_between_timeline.values());
                &combined
            }
        };

        reduce_value_timeline(source, period, average)
    }

    /// Minutes between consecutive messages of a streak, by hour of day.
    pub fn time_between_by_hour(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> MinutesByHour {
        let combined;
        let source = match sender {
            Some(key) => match self.time_between_by_hour.get(key) {
                Some(hours) => hours,
                None => {
                    return MinutesByHour {
                        hours: (0..24).collect(),
                        avg_minutes: vec![0.0; 24],
                    }
                }
            },
            None => {
                combined = merge_hour_lists(self.time_between_by_hour.values());
                &combined
            }
        };

        MinutesByHour {
            hours: (0..24).collect(),
            avg_minutes: source.iter().map(|values| average.reduce(values)).collect(),
        }
    }

    /// Sent vs received balance for one sender over time.
    ///
    /// `ratio = sent / (sent + received)` where received is every other
    /// sender's messages in the same bucket. An empty bucket is 0.5.
    pub fn sent_received_ratio_timeline(
        &self,
        sender: &SenderKey,
        period: Period,
    ) -> RatioTimeline {
        if !self.sent_timeline.contains_key(sender) {
            return RatioTimeline::empty();
        }

        let mut sent_agg: BTreeMap<BucketKey, u64> = BTreeMap::new();
        let mut recv_agg: BTreeMap<BucketKey, u64> = BTreeMap::new();
        for (key, timeline) in &self.sent_timeline {
            let target = if key == sender {
                &mut sent_agg
            } else {
                &mut recv_agg
            };
            for (slot, count) in timeline {
                *target.entry(bucket_key(*slot, period)).or_insert(0) += count;
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

    /// Raw per-sender sent counts at hour resolution.
    pub(crate) fn sent_slots(&self) -> &HashMap<SenderKey, BTreeMap<NaiveDateTime, u64>> {
        &self.sent_timeline
    }

    /// Raw time-between observation lists at hour resolution.
    pub(crate) fn time_between_slots(
        &self,
    ) -> &HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>> {
        &self.time_between_timeline
    }

    /// Raw time-between observation lists by hour of day.
    pub(crate) fn time_between_hours(&self) -> &HashMap<SenderKey, [Vec<f64>; 24]> {
        &self.time_between_by_hour
    }
}

/// Merge several per-sender hour-slot observation maps into one.
pub(crate) fn merge_value_timelines<'a>(
    sources: impl Iterator<Item = &'a BTreeMap<NaiveDateTime, Vec<f64>>>,
) -> BTreeMap<NaiveDateTime, Vec<f64>> {
    let mut merged: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
    for source in sources {
        for (slot, values) in source {
            merged.entry(*slot).or_default().extend_from_slice(values);
        }
    }
    merged
}

/// Merge several per-sender hour-of-day observation arrays into one.
pub(crate) fn merge_hour_lists<'a>(
    sources: impl Iterator<Item = &'a [Vec<f64>; 24]>,
) -> [Vec<f64>; 24] {
    let mut merged: [Vec<f64>; 24] = Default::default();
    for source in sources {
        for (hour, values) in source.iter().enumerate() {
            merged[hour].extend_from_slice(values);
        }
    }
    merged
}

/// Re-bucket hour-slot observation lists into `period` and reduce each
/// bucket with `average`.
pub(crate) fn reduce_value_timeline(
    source: &BTreeMap<NaiveDateTime, Vec<f64>>,
    period: Period,
    average: Average,
) -> MinutesTimeline {
    let mut aggregated: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();
    for (slot, values) in source {
        aggregated
            .entry(bucket_key(*slot, period))
            .or_default()
            .extend_from_slice(values);
    }

    let mut dates = Vec::with_capacity(aggregated.len());
    let mut avg_minutes = Vec::with_capacity(aggregated.len());
    for (key, values) in aggregated {
        dates.push(key);
        avg_minutes.push(average.reduce(&values));
    }
    MinutesTimeline { dates, avg_minutes }
}
