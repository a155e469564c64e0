//! # chatwrapped-core
//!
//! Core library for chatwrapped - time-bucketed behavioral statistics over
//! a personal message archive.
//!
//! This library provides:
//! - A normalized event model for conversation records (messages, reactions)
//! - Temporal bucketing at hour/day/week/month/year granularity
//! - Six statistic trackers fed by one ordered pass per conversation
//! - A cross-conversation aggregation layer with inclusive date-range
//!   filtering and median-based summaries
//! - Wrapped (year in review) summary generation
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Ingest:** `chat_*.json` export files parsed into ordered [`Event`]
//!   streams, timestamps normalized to one timezone per run
//! - **Conversation:** one pass populates six statistic trackers; the
//!   result is immutable and query-only
//! - **Archive:** combines many conversations, re-deriving coarse time
//!   buckets from daily resolution whenever a date filter is active
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatwrapped_core::{Config, Loader, MessageArchive, WrappedPeriod, WrappedSummary};
//!
//! let config = Config::load().expect("failed to load config");
//! let loader = Loader::from_config(&config.archive).expect("failed to build loader");
//! let (conversations, _) = loader
//!     .load_all(&config.archive.exports_dir)
//!     .expect("failed to load exports");
//!
//! let archive = MessageArchive::new(conversations, config.archive.self_label.clone());
//! let summary = WrappedSummary::generate(&archive, WrappedPeriod::Year(2025));
//! println!("{}", summary.to_json().expect("serialize"));
//! ```

// Re-export commonly used items at the crate root
pub use archive::{ComparisonMetric, DateRange, MessageArchive};
pub use config::Config;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use ingest::Loader;
pub use period::{bucket_key, hour_of_day, BucketKey, Period};
pub use stats::Average;
pub use types::*;
pub use wrapped::{WrappedPeriod, WrappedSummary};

// Public modules
pub mod archive;
pub mod config;
pub mod conversation;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod period;
pub mod stats;
pub mod types;
pub mod wrapped;
