//! Response-time tracker.
//!
//! A response is any event (message or reaction) from a different sender
//! than the previous event. The elapsed minutes are attributed to the
//! bucket of the *original* message's time, not the reply's: the question
//! answered is "how fast does X reply to things that arrive at time T",
//! not "when do X's replies land".

use crate::period::{hour_of_day, hour_slot, Period};
use crate::stats::double_text::{merge_hour_lists, merge_value_timelines, reduce_value_timeline};
use crate::stats::{Average, BaseStatistic, ByHour, MinutesByHour, MinutesTimeline, Timeline};
use crate::types::{Event, SenderKey};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct LastEvent {
    sender: SenderKey,
    time: NaiveDateTime,
    /// Hour-resolution slot of the event, kept so responses can be keyed
    /// retroactively without recomputing.
    slot: NaiveDateTime,
    hour: usize,
}

/// Tracks response latency per responder.
#[derive(Debug, Clone, Default)]
pub struct ResponseTimeStatistic {
    base: BaseStatistic,
    response_time_timeline: HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>>,
    response_time_by_hour: HashMap<SenderKey, [Vec<f64>; 24]>,
    last: Option<LastEvent>,
}

impl ResponseTimeStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, measuring a response if the sender changed.
    /// Unlike double-text detection, reactions participate fully here.
    pub fn record(&mut self, event: &Event) {
        let sender = event.sender().clone();
        let time = event.timestamp();

        if let Some(last) = &self.last {
            if last.sender != sender {
                let minutes = (time - last.time).num_seconds() as f64 / 60.0;

                // Keyed under the prior event's slot, attributed to the
                // responder.
                self.response_time_timeline
                    .entry(sender.clone())
                    .or_default()
                    .entry(last.slot)
                    .or_default()
                    .push(minutes);
                self.response_time_by_hour
                    .entry(sender.clone())
                    .or_default()[last.hour]
                    .push(minutes);
                self.base.record(&sender, last.slot);
            }
        }

        self.last = Some(LastEvent {
            sender,
            slot: hour_slot(time),
            hour: hour_of_day(time) as usize,
            time,
        });
    }

    /// Response *counts* over time (how many responses landed per bucket).
    pub fn timeline(&self, sender: Option<&SenderKey>, period: Period) -> Timeline {
        self.base.timeline(sender, period)
    }

    /// Response counts by hour of day (hour the original message arrived).
    pub fn by_hour(&self, sender: Option<&SenderKey>) -> ByHour {
        self.base.by_hour(sender)
    }

    /// Response latency over time, median or mean per bucket.
    pub fn response_time_timeline(
        &self,
        sender: Option<&SenderKey>,
        period: Period,
        average: Average,
    ) -> MinutesTimeline {
        let combined;
        let source = match sender {
            Some(key) => match self.response_time_timeline.get(key) {
                Some(timeline) => timeline,
                None => return MinutesTimeline::empty(),
            },
            None => {
                combined = merge_value_timelines(self.response_time_timeline.values());
                &combined
            }
        };

        reduce_value_timeline(source, period, average)
    }

    /// Response latency by hour of day (the hour the original message was
    /// sent), median or mean.
    pub fn response_time_by_hour(
        &self,
        sender: Option<&SenderKey>,
        average: Average,
    ) -> MinutesByHour {
        let combined;
        let source = match sender {
            Some(key) => match self.response_time_by_hour.get(key) {
                Some(hours) => hours,
                None => {
                    return MinutesByHour {
                        hours: (0..24).collect(),
                        avg_minutes: vec![0.0; 24],
                    }
                }
            },
            None => {
                combined = merge_hour_lists(self.response_time_by_hour.values());
                &combined
            }
        };

        MinutesByHour {
            hours: (0..24).collect(),
            avg_minutes: source.iter().map(|values| average.reduce(values)).collect(),
        }
    }

    /// Raw latency observation lists at hour resolution.
    pub(crate) fn response_slots(
        &self,
    ) -> &HashMap<SenderKey, BTreeMap<NaiveDateTime, Vec<f64>>> {
        &self.response_time_timeline
    }

    /// Raw latency observation lists by hour of day.
    pub(crate) fn response_hours(&self) -> &HashMap<SenderKey, [Vec<f64>; 24]> {
        &self.response_time_by_hour
    }
}
