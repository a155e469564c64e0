//! Wrapped - Year in Review
//!
//! Builds the consolidated "Messages Wrapped" summary: one record
//! aggregating the archive's query outputs for a fixed date window,
//! serializable as a single JSON document with every date as an ISO-8601
//! string.

use crate::archive::{
    AveragedByHour, ComparisonEntry, ComparisonMetric, DateRange, MessageArchive,
    ResponseTimeExtremes, TopChatsTimeline,
};
use crate::error::Result;
use crate::period::Period;
use crate::stats::{Average, EmojiTimeline, MinutesByHour, Timeline, WordsByHour};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;

/// Time period for wrapped statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrappedPeriod {
    /// Full year (e.g., 2025)
    Year(i32),
    /// Specific month (year, month 1-12)
    Month(i32, u32),
    /// Arbitrary inclusive date range
    Range(NaiveDate, NaiveDate),
}

impl WrappedPeriod {
    /// The inclusive date range this period covers.
    pub fn date_range(&self) -> DateRange {
        match self {
            WrappedPeriod::Year(year) => DateRange::bounded(
                NaiveDate::from_ymd_opt(*year, 1, 1).expect("jan 1 is always valid"),
                NaiveDate::from_ymd_opt(*year, 12, 31).expect("dec 31 is always valid"),
            ),
            WrappedPeriod::Month(year, month) => {
                let start =
                    NaiveDate::from_ymd_opt(*year, *month, 1).expect("month validated by caller");
                let (next_year, next_month) = if *month == 12 {
                    (*year + 1, 1)
                } else {
                    (*year, *month + 1)
                };
                let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
                    .expect("first of month is always valid")
                    - Duration::days(1);
                DateRange::bounded(start, end)
            }
            WrappedPeriod::Range(start, end) => DateRange::bounded(*start, *end),
        }
    }

    /// Get display name for this period.
    pub fn display_name(&self) -> String {
        match self {
            WrappedPeriod::Year(year) => format!("{}", year),
            WrappedPeriod::Month(year, month) => {
                let month_name = match month {
                    1 => "January",
                    2 => "February",
                    3 => "March",
                    4 => "April",
                    5 => "May",
                    6 => "June",
                    7 => "July",
                    8 => "August",
                    9 => "September",
                    10 => "October",
                    11 => "November",
                    12 => "December",
                    _ => "Unknown",
                };
                format!("{} {}", month_name, year)
            }
            WrappedPeriod::Range(start, end) => format!("{} to {}", start, end),
        }
    }

    /// Create a period for the current year.
    pub fn current_year() -> Self {
        WrappedPeriod::Year(Utc::now().year())
    }
}

/// The consolidated wrapped summary for one period.
#[derive(Debug, Clone, Serialize)]
pub struct WrappedSummary {
    /// Period display name, e.g. "2025"
    pub period: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub self_label: String,

    /// Total messages sent by the archive owner in the period
    pub total_messages_sent: u64,
    /// Total words the owner sent
    pub total_words_sent: u64,
    /// Words-per-message habits by hour of day (mean; full-span data, the
    /// per-hour representation has no date axis to filter)
    pub words_per_message_by_hour: WordsByHour,
    /// Number of 1-on-1 chats the owner messaged at least once
    pub direct_chats_messaged: usize,
    /// Chats ranked by the owner's messages per day
    pub conversation_comparison: Vec<ComparisonEntry>,
    /// Top chats by messages the owner sent
    pub top_chats_by_messages: Vec<(String, u64)>,
    /// Top chats by attachments the owner sent
    pub top_chats_by_attachments: Vec<(String, u64)>,
    /// Daily per-chat timelines for the top chats (absent when the owner
    /// sent nothing in the period)
    pub top_chats_timeline: Option<TopChatsTimeline>,
    /// The owner's most used emojis
    pub top_emojis: Vec<(String, u64)>,
    /// Weekly timeline of the owner's top emojis
    pub emoji_timeline: EmojiTimeline,
    /// Slowest and fastest 1-on-1 chats by the owner's response time
    pub response_time_extremes: ResponseTimeExtremes,
    /// Weekly timeline of the owner's messages
    pub messages_timeline: Timeline,
    /// The owner's messaging habits by hour of day (mean per hour slot)
    pub messages_by_hour: AveragedByHour,
    /// The owner's response-time habits by hour of day (mean)
    pub response_time_by_hour: MinutesByHour,
}

impl WrappedSummary {
    /// Generate the summary for `period` from a fully-loaded archive.
    pub fn generate(archive: &MessageArchive, period: WrappedPeriod) -> Self {
        let range = period.date_range();
        let label = archive.self_label().to_string();

        tracing::info!(period = %period.display_name(), "generating wrapped summary");

        let total_messages_sent = archive.total_messages_sent(&label, &range);

        let total_words_sent = archive
            .combined_total_words_timeline(Some(&label), Period::Week, &range)
            .counts
            .iter()
            .sum();

        let top_chats_by_messages = archive.top_chats_by_messages_sent(&label, 5, &range);
        let top_chats_timeline = if top_chats_by_messages.is_empty() {
            None
        } else {
            Some(archive.top_chats_messages_timeline(&label, 10, Period::Day, &range))
        };

        WrappedSummary {
            period: period.display_name(),
            start_date: range.start,
            end_date: range.end,
            total_messages_sent,
            total_words_sent,
            words_per_message_by_hour: archive
                .combined_words_per_message_by_hour(Some(&label), Average::Mean),
            direct_chats_messaged: archive.count_direct_chats_with_min_messages(&label, 1, &range),
            conversation_comparison: archive.conversation_comparison(
                ComparisonMetric::MessagesPerDaySelf,
                Some(10),
                &range,
            ),
            top_chats_by_messages,
            top_chats_by_attachments: archive.top_chats_by_attachments_sent(&label, 5, &range),
            top_chats_timeline,
            top_emojis: archive.combined_emoji_totals(Some(&label), 15, &range),
            emoji_timeline: archive.combined_emoji_timeline(Some(&label), Period::Week, 5, &range),
            response_time_extremes: archive.top_bottom_chats_by_response_time(
                &label,
                5,
                Average::Median,
                &range,
            ),
            messages_timeline: archive.combined_messages_timeline(
                Some(&label),
                Period::Week,
                &range,
            ),
            messages_by_hour: archive.combined_messages_by_hour(
                Some(&label),
                Average::Mean,
                &range,
            ),
            response_time_by_hour: archive.combined_response_time_by_hour(
                Some(&label),
                Average::Mean,
                &range,
            ),
            self_label: label,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the summary to `path` as a single JSON document.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "wrapped summary written");
        Ok(())
    }
}
