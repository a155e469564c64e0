//! Statistic trackers
//!
//! Each tracker consumes one conversation's ordered event stream exactly
//! once and builds multi-dimensional indexes (by sender, by hour-resolution
//! time slot, by hour of day). After the pass they are query-only.
//!
//! The order-sensitive trackers ([`DoubleTextStatistic`],
//! [`ResponseTimeStatistic`]) are sequential state machines: their output
//! is undefined on a re-ordered or partial stream.

pub mod attachment;
pub mod base;
pub mod double_text;
pub mod emoji;
pub mod message;
pub mod response_time;
pub mod word_count;

pub use attachment::AttachmentStatistic;
pub use base::BaseStatistic;
pub use double_text::DoubleTextStatistic;
pub use emoji::EmojiStatistic;
pub use message::MessageStatistic;
pub use response_time::ResponseTimeStatistic;
pub use word_count::WordCountStatistic;

use crate::period::BucketKey;
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================
// Averaging
// ============================================

/// How to reduce a list of observations to one representative value.
///
/// Median is the default everywhere for robustness to outliers; mean is
/// selectable on every query that reduces lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Average {
    #[default]
    Median,
    Mean,
}

impl Average {
    /// Reduce a list of observations. Empty input is defined as 0.0 —
    /// never NaN — so downstream consumers can assume numeric output.
    pub fn reduce(&self, values: &[f64]) -> f64 {
        match self {
            Average::Median => median(values),
            Average::Mean => mean(values),
        }
    }
}

/// Median: sort ascending, even-length lists average the two central
/// elements, odd-length lists take the exact center. Empty list is 0.0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Mean with the same empty-is-zero convention as [`median`].
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// ============================================
// Query output shapes
// ============================================
//
// Stable contracts for the plotting/reporting collaborator: arrays are
// always index-aligned and sorted ascending by date; by-hour results are
// always length 24, zero-filled.

/// Counts over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub dates: Vec<BucketKey>,
    pub counts: Vec<u64>,
}

impl Timeline {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Build from an already-bucketed map (BTreeMap iteration is ascending).
    pub(crate) fn from_map(map: BTreeMap<BucketKey, u64>) -> Self {
        let mut dates = Vec::with_capacity(map.len());
        let mut counts = Vec::with_capacity(map.len());
        for (key, count) in map {
            dates.push(key);
            counts.push(count);
        }
        Self { dates, counts }
    }
}

/// Median/mean minutes over time (response times, double-text gaps).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinutesTimeline {
    pub dates: Vec<BucketKey>,
    pub avg_minutes: Vec<f64>,
}

impl MinutesTimeline {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            avg_minutes: Vec::new(),
        }
    }
}

/// Median/mean words per message over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordsTimeline {
    pub dates: Vec<BucketKey>,
    pub avg_words: Vec<f64>,
}

impl WordsTimeline {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            avg_words: Vec::new(),
        }
    }
}

/// Counts by hour of day. Always 24 entries, zero-filled for unseen hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ByHour {
    pub hours: Vec<u32>,
    pub counts: Vec<u64>,
}

impl ByHour {
    pub fn zeroed() -> Self {
        Self {
            hours: (0..24).collect(),
            counts: vec![0; 24],
        }
    }

    pub fn from_counts(counts: [u64; 24]) -> Self {
        Self {
            hours: (0..24).collect(),
            counts: counts.to_vec(),
        }
    }
}

/// Median/mean minutes by hour of day. Always 24 entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinutesByHour {
    pub hours: Vec<u32>,
    pub avg_minutes: Vec<f64>,
}

/// Median/mean words per message by hour of day. Always 24 entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordsByHour {
    pub hours: Vec<u32>,
    pub avg_words: Vec<f64>,
}

/// Per-emoji counts over time, aligned to a shared date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmojiTimeline {
    pub dates: Vec<BucketKey>,
    pub emojis: BTreeMap<String, Vec<u64>>,
}

impl EmojiTimeline {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            emojis: BTreeMap::new(),
        }
    }
}

/// Per-emoji counts by hour of day. Each list is always length 24.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmojiByHour {
    pub hours: Vec<u32>,
    pub emojis: BTreeMap<String, Vec<u64>>,
}

impl EmojiByHour {
    pub fn empty() -> Self {
        Self {
            hours: (0..24).collect(),
            emojis: BTreeMap::new(),
        }
    }
}

/// Sent/received ratio over time. A bucket with no messages at all is the
/// neutral 0.5, never NaN or omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioTimeline {
    pub dates: Vec<BucketKey>,
    pub ratios: Vec<f64>,
    pub sent_counts: Vec<u64>,
    pub received_counts: Vec<u64>,
}

impl RatioTimeline {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            ratios: Vec::new(),
            sent_counts: Vec::new(),
            received_counts: Vec::new(),
        }
    }
}
