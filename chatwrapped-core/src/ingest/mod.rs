//! Conversation export ingestion.
//!
//! Discovers `chat_*.json` files in an export directory, applies the
//! optional `number_to_name.json` mapping (human names, include flags),
//! parses each file's record array, and builds [`Conversation`]s.
//!
//! # Error handling
//!
//! - **Malformed record**: skipped with a warning; the conversation's
//!   `skipped_records` counter is incremented and the pass continues.
//! - **Unreadable or non-array file**: that conversation is excluded from
//!   the batch with an error log; other conversations are unaffected.
//! - **Timestamps**: must be ISO-8601. Offset-carrying timestamps are
//!   converted into the run timezone; offset-less ones are taken as
//!   already-local wall-clock time.

pub mod record;

pub use record::RawRecord;

use crate::config::ArchiveConfig;
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The single timezone all event timestamps are normalized to.
#[derive(Debug, Clone, Copy)]
pub enum RunTimezone {
    /// A fixed UTC offset from configuration
    Fixed(FixedOffset),
    /// The system local timezone
    Local,
}

impl RunTimezone {
    pub fn from_config(config: &ArchiveConfig) -> Result<Self> {
        Ok(match config.fixed_offset()? {
            Some(offset) => RunTimezone::Fixed(offset),
            None => RunTimezone::Local,
        })
    }

    /// Parse an ISO-8601 timestamp and express it as local wall-clock time
    /// in this timezone. Timestamps without an offset are assumed to be
    /// wall-clock already.
    pub fn normalize(&self, raw: &str) -> Result<NaiveDateTime> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Ok(match self {
                RunTimezone::Fixed(offset) => with_offset.with_timezone(offset).naive_local(),
                RunTimezone::Local => with_offset.with_timezone(&Local).naive_local(),
            });
        }
        raw.parse::<NaiveDateTime>().map_err(|e| Error::Parse {
            file: String::new(),
            message: format!("unparseable timestamp {raw:?}: {e}"),
        })
    }
}

// ============================================
// Name mapping
// ============================================

/// One entry of `number_to_name.json`: either a plain name (legacy form)
/// or an object with a name and an include flag.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum NameEntry {
    Plain(String),
    Detailed {
        name: Option<String>,
        include: Option<bool>,
    },
}

impl NameEntry {
    fn name(&self) -> Option<&str> {
        match self {
            NameEntry::Plain(name) => Some(name),
            NameEntry::Detailed { name, .. } => name.as_deref(),
        }
    }

    fn included(&self) -> bool {
        match self {
            NameEntry::Plain(_) => true,
            NameEntry::Detailed { include, .. } => include.unwrap_or(true),
        }
    }
}

/// Mapping from export file names to human-facing conversation names.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: HashMap<String, NameEntry>,
}

impl NameMap {
    /// Load `number_to_name.json` from the export directory. A missing
    /// file is an empty mapping; a malformed one is an error.
    pub fn load(exports_dir: &Path) -> Result<Self> {
        let path = exports_dir.join("number_to_name.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        let entries: HashMap<String, NameEntry> =
            serde_json::from_str(&contents).map_err(|e| Error::Parse {
                file: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    fn entry_for(&self, path: &Path) -> Option<&NameEntry> {
        let file_name = path.file_name()?.to_string_lossy();
        if let Some(entry) = self.entries.get(file_name.as_ref()) {
            return Some(entry);
        }
        let stem = path.file_stem()?.to_string_lossy();
        self.entries.get(stem.as_ref())
    }

    /// Human-facing name for an export file: the mapped name when present,
    /// the file stem otherwise.
    pub fn conversation_name(&self, path: &Path) -> String {
        self.entry_for(path)
            .and_then(NameEntry::name)
            .map(String::from)
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
    }

    /// Whether the mapping excludes this file from loading.
    pub fn included(&self, path: &Path) -> bool {
        self.entry_for(path).map(NameEntry::included).unwrap_or(true)
    }
}

// ============================================
// Loading
// ============================================

/// Outcome of loading a batch of conversation files.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
}

/// Loads conversation exports into [`Conversation`]s.
pub struct Loader {
    timezone: RunTimezone,
    name_map: NameMap,
}

impl Loader {
    pub fn new(timezone: RunTimezone, name_map: NameMap) -> Self {
        Self { timezone, name_map }
    }

    /// Build a loader from configuration, reading the name mapping from
    /// the configured exports directory.
    pub fn from_config(config: &ArchiveConfig) -> Result<Self> {
        Ok(Self::new(
            RunTimezone::from_config(config)?,
            NameMap::load(&config.exports_dir)?,
        ))
    }

    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }

    /// Discover export files in `dir`, honoring the mapping's include
    /// flags. Sorted for deterministic load order.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = dir.join("chat_*.json");
        let pattern = pattern.to_string_lossy();
        let mut files = Vec::new();
        let mut excluded = 0usize;

        for entry in glob::glob(&pattern)
            .map_err(|e| Error::Config(format!("bad exports pattern {pattern}: {e}")))?
        {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            if self.name_map.included(&path) {
                files.push(path);
            } else {
                excluded += 1;
            }
        }
        files.sort();

        tracing::info!(
            dir = %dir.display(),
            found = files.len(),
            excluded,
            "discovered conversation exports"
        );
        Ok(files)
    }

    /// Load one conversation file: parse its record array, skip malformed
    /// records, and run the statistics pass.
    pub fn load_conversation(&self, path: &Path) -> Result<Conversation> {
        let file_label = path.display().to_string();
        let contents = std::fs::read_to_string(path)?;
        let raw_records: Vec<serde_json::Value> =
            serde_json::from_str(&contents).map_err(|e| Error::Parse {
                file: file_label.clone(),
                message: format!("not a JSON record array: {e}"),
            })?;

        let mut events = Vec::with_capacity(raw_records.len());
        let mut skipped = 0u64;
        for value in raw_records {
            let parsed = serde_json::from_value::<RawRecord>(value)
                .map_err(Error::from)
                .and_then(|record| record.into_event(&self.timezone, &file_label));
            match parsed {
                Ok(event) => events.push(event),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(file = %file_label, error = %e, "skipping malformed record");
                }
            }
        }

        let name = self.name_map.conversation_name(path);
        Ok(Conversation::from_events(name, events, skipped))
    }

    /// Load every discovered conversation in `dir`. A conversation that
    /// fails to load is logged and excluded; the batch continues.
    pub fn load_all(&self, dir: &Path) -> Result<(Vec<Conversation>, LoadSummary)> {
        let files = self.discover(dir)?;
        let mut conversations = Vec::with_capacity(files.len());
        let mut summary = LoadSummary::default();

        for path in files {
            match self.load_conversation(&path) {
                Ok(convo) => {
                    conversations.push(convo);
                    summary.loaded += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(file = %path.display(), error = %e, "failed to load conversation");
                }
            }
        }

        tracing::info!(
            loaded = summary.loaded,
            failed = summary.failed,
            "conversation loading complete"
        );
        Ok((conversations, summary))
    }
}
