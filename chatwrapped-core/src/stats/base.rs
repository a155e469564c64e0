//! Generic incremental tracker shared by every statistic.
//!
//! Maintains four parallel indexes over hour-resolution slots: a combined
//! timeline, a per-sender timeline, a combined hour-of-day histogram, and a
//! per-sender hour-of-day histogram. The hour-resolution slot is the single
//! source of truth; every coarser view is derived from it at query time.

use crate::period::{bucket_key, hour_of_day, hour_slot, BucketKey, Period};
use crate::stats::{ByHour, Timeline};
use crate::types::SenderKey;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

/// Incremental counter indexed by (sender, hour slot) and (sender, hour).
#[derive(Debug, Clone, Default)]
pub struct BaseStatistic {
    timeline: BTreeMap<NaiveDateTime, u64>,
    timeline_by_sender: HashMap<SenderKey, BTreeMap<NaiveDateTime, u64>>,
    by_hour: [u64; 24],
    by_hour_by_sender: HashMap<SenderKey, [u64; 24]>,
}

impl BaseStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence at `ts` for `sender`.
    ///
    /// Increments all four indexes; never fails for well-formed input.
    pub fn record(&mut self, sender: &SenderKey, ts: NaiveDateTime) {
        let slot = hour_slot(ts);
        let hour = hour_of_day(ts) as usize;

        *self.timeline.entry(slot).or_insert(0) += 1;
        *self
            .timeline_by_sender
            .entry(sender.clone())
            .or_default()
            .entry(slot)
            .or_insert(0) += 1;
        self.by_hour[hour] += 1;
        self.by_hour_by_sender.entry(sender.clone()).or_default()[hour] += 1;
    }

    /// Counts over time, re-bucketed to `period`, sorted ascending.
    ///
    /// A sender that was never recorded yields empty lists, not an error:
    /// "never seen" and "seen zero times" are indistinguishable to callers.
    pub fn timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        let source = match sender {
            Some(key) => match self.timeline_by_sender.get(key) {
                Some(timeline) => timeline,
                None => return Timeline::empty(),
            },
            None => &self.timeline,
        };

        let mut aggregated: BTreeMap<BucketKey, u64> = BTreeMap::new();
        for (slot, count) in source {
            *aggregated.entry(bucket_key(*slot, period)).or_insert(0) += count;
        }
        Timeline::from_map(aggregated)
    }

    /// Counts by hour of day. Always all 24 hours, zero-filled — never a
    /// sparse or shortened result, even for unseen senders.
    pub fn by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        match sender {
            Some(key) => match self.by_hour_by_sender.get(key) {
                Some(counts) => ByHour::from_counts(*counts),
                None => ByHour::zeroed(),
            },
            None => ByHour::from_counts(self.by_hour),
        }
    }

    /// Raw hour-slot counts for one sender, if any were recorded.
    pub(crate) fn sender_slots(&self, sender: &SenderKey) -> Option<&BTreeMap<NaiveDateTime, u64>> {
        self.timeline_by_sender.get(sender)
    }

    /// Raw hour-slot counts across all senders.
    pub(crate) fn all_slots(&self) -> &BTreeMap<NaiveDateTime, u64> {
        &self.timeline
    }

    /// Senders that have recorded at least one occurrence.
    pub fn senders(&self) -> impl Iterator<Item = &SenderKey> {
        self.timeline_by_sender.keys()
    }

    /// Total recorded occurrences.
    pub fn total(&self) -> u64 {
        self.timeline.values().sum()
    }
}
