//! Integration tests for the chatwrapped ingestion and aggregation pipeline
//!
//! These tests write export fixtures to a temp directory and verify the
//! end-to-end flow: JSON records -> conversations -> archive -> wrapped
//! summary.

use chatwrapped_core::archive::{ComparisonMetric, DateRange, MessageArchive};
use chatwrapped_core::ingest::{Loader, NameMap, RunTimezone};
use chatwrapped_core::stats::Average;
use chatwrapped_core::{Period, SenderKey, WrappedPeriod, WrappedSummary};
use chrono::{FixedOffset, NaiveDate};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn utc_loader(exports_dir: &Path) -> Loader {
    Loader::new(
        RunTimezone::Fixed(FixedOffset::east_opt(0).unwrap()),
        NameMap::load(exports_dir).unwrap(),
    )
}

fn record(
    id: u32,
    guid: &str,
    ts: &str,
    sender: Option<&str>,
    name: &str,
    text: &str,
) -> String {
    let sender_json = match sender {
        Some(s) => format!("\"{s}\""),
        None => "null".to_string(),
    };
    format!(
        r#"{{"id": {id}, "guid": "{guid}", "timestamp": "{ts}", "sender": {sender_json},
            "sender_name": "{name}", "text": "{text}", "is_reaction": false,
            "is_unsent": false, "attachment": null, "is_reply": false, "reply_guids": []}}"#
    )
}

fn reaction_record(id: u32, guid: &str, ts: &str, sender: &str, assoc: &str) -> String {
    format!(
        r#"{{"id": {id}, "guid": "{guid}", "timestamp": "{ts}", "sender": "{sender}",
            "sender_name": "{sender}", "text": "Loved \"hi\"", "is_reaction": true,
            "is_unsent": false, "assoc_guid": "{assoc}"}}"#
    )
}

// ============================================
// End-to-end pipeline
// ============================================

#[test]
fn test_export_to_archive_pipeline() {
    let dir = TempDir::new().unwrap();

    // A conversation between You and Sam spanning two days in June 2025.
    // Sam's reaction lands chronologically before the message it targets,
    // exercising deferred linkage while keeping the stream ordered.
    let records = vec![
        record(1, "m1", "2025-06-02T09:00:00+00:00", None, "You", "good morning"),
        reaction_record(9, "r1", "2025-06-02T09:00:30+00:00", "+15550001", "m2"),
        record(
            2,
            "m2",
            "2025-06-02T09:05:00+00:00",
            None,
            "You",
            "want to get lunch later",
        ),
        record(
            3,
            "m3",
            "2025-06-02T09:12:00+00:00",
            Some("+15550001"),
            "Sam",
            "yes! noon works",
        ),
        record(4, "m4", "2025-06-03T18:00:00+00:00", None, "You", "that was fun"),
    ];
    fs::write(
        dir.path().join("chat_1.json"),
        format!("[{}]", records.join(",")),
    )
    .unwrap();
    fs::write(
        dir.path().join("number_to_name.json"),
        r#"{"chat_1.json": "Sam"}"#,
    )
    .unwrap();

    let loader = utc_loader(dir.path());
    let (conversations, summary) = loader.load_all(dir.path()).unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.failed, 0);

    let convo = &conversations[0];
    assert_eq!(convo.name(), "Sam");
    assert_eq!(convo.thread().len(), 5);
    assert_eq!(convo.skipped_records(), 0);

    // The reaction arrived before its parent and was still attached.
    assert_eq!(convo.reactions_to("m2").count(), 1);
    assert_eq!(convo.orphan_reactions().count(), 0);

    // Sender summary: the unknown-sender is You's key here (sender null).
    let you = &convo.senders()[&SenderKey::Unknown];
    assert_eq!(you.messages_sent, 3);
    let sam = &convo.senders()[&SenderKey::Named("+15550001".to_string())];
    assert_eq!(sam.messages_sent, 1);
    assert_eq!(sam.reactions_sent, 1);

    // You's consecutive 09:00/09:05 messages carry no sender key, and the
    // unknown-sender bucket never yields double texts.
    let doubles = convo.double_texts_timeline(Some(&SenderKey::Unknown), Period::Day);
    assert!(doubles.counts.is_empty());

    // Response time: Sam's reaction at 09:00:30 responds to You's 09:00
    // message (0.5 min), and the 09:12 reply responds to the 09:05 message
    // (7 min). Both keyed under hour 9.
    let sam_key = SenderKey::Named("+15550001".to_string());
    let rt = convo.response_time_by_hour(Some(&sam_key), Average::Median);
    assert!((rt.avg_minutes[9] - 3.75).abs() < 1e-9);
}

#[test]
fn test_archive_date_range_weekly_rebucketing() {
    let dir = TempDir::new().unwrap();

    // Mon Jun 2: 3 messages. Tue Jun 3: 4 messages. Same ISO week.
    let mut records = Vec::new();
    for i in 0..3 {
        records.push(record(
            i,
            &format!("mon-{i}"),
            &format!("2025-06-02T0{}:00:00+00:00", i + 1),
            None,
            "You",
            "hello",
        ));
    }
    for i in 0..4 {
        records.push(record(
            10 + i,
            &format!("tue-{i}"),
            &format!("2025-06-03T0{}:00:00+00:00", i + 1),
            None,
            "You",
            "hello",
        ));
    }
    fs::write(
        dir.path().join("chat_1.json"),
        format!("[{}]", records.join(",")),
    )
    .unwrap();

    let loader = utc_loader(dir.path());
    let (conversations, _) = loader.load_all(dir.path()).unwrap();
    let archive = MessageArchive::new(conversations, "You");

    let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
    let range = DateRange::bounded(tuesday, tuesday);

    // The week is keyed by Monday Jun 2, outside the filter; it must still
    // appear, holding only Tuesday's 4 messages.
    let weekly = archive.combined_messages_timeline(None, Period::Week, &range);
    assert_eq!(weekly.dates.len(), 1);
    assert_eq!(
        weekly.dates[0].date(),
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    );
    assert_eq!(weekly.counts, vec![4]);
}

#[test]
fn test_wrapped_summary_over_loaded_archive() {
    let dir = TempDir::new().unwrap();

    let chat1 = vec![
        record(1, "a1", "2025-03-03T09:00:00+00:00", Some("You"), "You", "morning \u{1F31E}"),
        record(2, "a2", "2025-03-03T09:30:00+00:00", Some("+15550001"), "Alex", "morning!"),
        record(3, "a3", "2025-03-04T10:00:00+00:00", Some("You"), "You", "coffee today?"),
    ];
    let chat2 = vec![
        record(4, "b1", "2025-03-03T12:00:00+00:00", Some("You"), "You", "hi hi"),
        record(5, "b2", "2025-03-03T12:45:00+00:00", Some("+15550002"), "Blair", "hey"),
    ];
    fs::write(dir.path().join("chat_1.json"), format!("[{}]", chat1.join(","))).unwrap();
    fs::write(dir.path().join("chat_2.json"), format!("[{}]", chat2.join(","))).unwrap();
    fs::write(
        dir.path().join("number_to_name.json"),
        r#"{"chat_1.json": "Alex", "chat_2.json": "Blair"}"#,
    )
    .unwrap();

    let loader = utc_loader(dir.path());
    let (conversations, _) = loader.load_all(dir.path()).unwrap();
    let archive = MessageArchive::new(conversations, "You");

    let summary = WrappedSummary::generate(&archive, WrappedPeriod::Year(2025));
    assert_eq!(summary.total_messages_sent, 3);
    assert_eq!(summary.direct_chats_messaged, 2);
    assert_eq!(
        summary.top_chats_by_messages,
        vec![("Alex".to_string(), 2), ("Blair".to_string(), 1)]
    );
    assert_eq!(summary.top_emojis, vec![("\u{1F31E}".to_string(), 1)]);

    // The extremes rank You's own response times; You only ever replied in
    // the Alex chat.
    assert_eq!(summary.response_time_extremes.top.len(), 1);
    assert_eq!(summary.response_time_extremes.top[0].0, "Alex");

    // A different year is empty but well-formed.
    let empty = WrappedSummary::generate(&archive, WrappedPeriod::Year(2024));
    assert_eq!(empty.total_messages_sent, 0);
    assert!(empty.messages_timeline.dates.is_empty());
    assert_eq!(empty.messages_by_hour.counts, vec![0.0; 24]);

    // Serialization round-trips through JSON.
    let out_path = dir.path().join("wrapped_2025.json");
    summary.write_json(&out_path).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(parsed["total_messages_sent"], 3);
    assert_eq!(parsed["self_label"], "You");
}

#[test]
fn test_comparison_respects_range() {
    let dir = TempDir::new().unwrap();

    let records = vec![
        record(1, "m1", "2025-06-02T09:00:00+00:00", Some("You"), "You", "one"),
        record(2, "m2", "2025-06-10T09:00:00+00:00", Some("You"), "You", "two"),
    ];
    fs::write(
        dir.path().join("chat_1.json"),
        format!("[{}]", records.join(",")),
    )
    .unwrap();

    let loader = utc_loader(dir.path());
    let (conversations, _) = loader.load_all(dir.path()).unwrap();
    let archive = MessageArchive::new(conversations, "You");

    let june_first_week = DateRange::bounded(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
    );
    let rows = archive.conversation_comparison(
        ComparisonMetric::TotalMessages,
        None,
        &june_first_week,
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_messages, 1);
    assert_eq!(rows[0].duration_days, 7);
}
