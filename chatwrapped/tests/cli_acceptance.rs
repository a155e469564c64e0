//! CLI acceptance tests for the chatwrapped binary.

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn write_export(dir: &std::path::Path) {
    fs::write(
        dir.join("chat_1.json"),
        r#"[
            {"id": 1, "guid": "m1", "timestamp": "2025-06-02T09:00:00+00:00",
             "sender": "You", "sender_name": "You", "text": "good morning",
             "is_reaction": false, "is_unsent": false, "attachment": null,
             "is_reply": false, "reply_guids": []},
            {"id": 2, "guid": "m2", "timestamp": "2025-06-02T09:12:00+00:00",
             "sender": "+15550001", "sender_name": "Sam", "text": "morning!",
             "is_reaction": false, "is_unsent": false, "attachment": null,
             "is_reply": false, "reply_guids": []}
        ]"#,
    )
    .unwrap();
    fs::write(
        dir.join("number_to_name.json"),
        r#"{"chat_1.json": "Sam"}"#,
    )
    .unwrap();
}

#[test]
fn test_wrapped_json_written() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path());
    let out = dir.path().join("wrapped.json");

    Command::cargo_bin("chatwrapped")
        .unwrap()
        .args([
            "--exports-dir",
            dir.path().to_str().unwrap(),
            "--year",
            "2025",
            "--out",
            out.to_str().unwrap(),
            "--quiet",
        ])
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["period"], "2025");
    assert_eq!(parsed["total_messages_sent"], 1);
    assert_eq!(parsed["top_chats_by_messages"][0][0], "Sam");
}

#[test]
fn test_custom_range() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path());
    let out = dir.path().join("wrapped_range.json");

    Command::cargo_bin("chatwrapped")
        .unwrap()
        .args([
            "--exports-dir",
            dir.path().to_str().unwrap(),
            "--from",
            "2025-06-01",
            "--to",
            "2025-06-30",
            "--out",
            out.to_str().unwrap(),
            "--quiet",
        ])
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["start_date"], "2025-06-01");
    assert_eq!(parsed["total_messages_sent"], 1);
}

#[test]
fn test_empty_exports_dir_fails() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("chatwrapped")
        .unwrap()
        .args(["--exports-dir", dir.path().to_str().unwrap(), "--quiet"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_month_rejected() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path());

    Command::cargo_bin("chatwrapped")
        .unwrap()
        .args([
            "--exports-dir",
            dir.path().to_str().unwrap(),
            "--month",
            "2025-13",
            "--quiet",
        ])
        .assert()
        .failure();
}
