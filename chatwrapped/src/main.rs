//! chatwrapped - Messages Wrapped CLI
//!
//! Loads a directory of conversation exports, aggregates them, prints a
//! summary, and writes the consolidated wrapped JSON document.

use anyhow::{Context, Result};
use chatwrapped_core::config::ArchiveConfig;
use chatwrapped_core::{
    Config, Loader, MessageArchive, WrappedPeriod, WrappedSummary,
};
use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chatwrapped")]
#[command(about = "Messages Wrapped - Your Year in Review")]
#[command(version)]
struct Args {
    /// Directory containing chat_*.json exports (default: from config)
    #[arg(long)]
    exports_dir: Option<PathBuf>,

    /// Year to generate wrapped for (default: current year)
    #[arg(long)]
    year: Option<i32>,

    /// Month to generate wrapped for (format: YYYY-MM)
    #[arg(long)]
    month: Option<String>,

    /// Start date of a custom range (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// End date of a custom range (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Output path for the wrapped JSON
    /// (default: <exports-dir>/wrapped_<period>.json)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Label identifying you in the archive (default: from config)
    #[arg(long)]
    self_label: Option<String>,

    /// Number of conversations to show in the comparison table
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Skip the terminal summary, only write the JSON
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = chatwrapped_core::logging::init(&config.logging).ok();

    let archive_config = ArchiveConfig {
        exports_dir: args
            .exports_dir
            .clone()
            .unwrap_or_else(|| config.archive.exports_dir.clone()),
        self_label: args
            .self_label
            .clone()
            .unwrap_or_else(|| config.archive.self_label.clone()),
        timezone_offset: config.archive.timezone_offset.clone(),
    };

    // Determine the period
    let period = if let (Some(from), Some(to)) = (args.from, args.to) {
        anyhow::ensure!(from <= to, "--from must not be after --to");
        WrappedPeriod::Range(from, to)
    } else if let Some(month_str) = &args.month {
        // Parse YYYY-MM format
        let parts: Vec<&str> = month_str.split('-').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid month format. Use YYYY-MM (e.g., 2025-12)");
        }
        let year: i32 = parts[0].parse().context("Invalid year")?;
        let month: u32 = parts[1].parse().context("Invalid month")?;
        if !(1..=12).contains(&month) {
            anyhow::bail!("Month must be between 1 and 12");
        }
        WrappedPeriod::Month(year, month)
    } else if let Some(year) = args.year {
        WrappedPeriod::Year(year)
    } else {
        WrappedPeriod::current_year()
    };

    // Load conversations
    let loader = Loader::from_config(&archive_config).context("failed to build loader")?;
    let files = loader
        .discover(&archive_config.exports_dir)
        .context("failed to scan exports directory")?;
    anyhow::ensure!(
        !files.is_empty(),
        "no chat_*.json exports found in {}",
        archive_config.exports_dir.display()
    );

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg:20} [{bar:40}] {pos}/{len}")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    bar.set_message("Loading chats");

    let mut conversations = Vec::with_capacity(files.len());
    let mut failed = 0usize;
    for file in &files {
        match loader.load_conversation(file) {
            Ok(convo) => conversations.push(convo),
            Err(e) => {
                failed += 1;
                tracing::error!(file = %file.display(), error = %e, "failed to load conversation");
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if failed > 0 {
        eprintln!("Warning: {failed} conversation file(s) failed to load (see log)");
    }

    let archive = MessageArchive::new(conversations, archive_config.self_label.clone());
    let summary = WrappedSummary::generate(&archive, period);

    if !args.quiet {
        print_terminal(&summary, args.top);
    }

    let out_path = args.out.unwrap_or_else(|| {
        let slug = summary.period.replace(' ', "_").to_lowercase();
        archive_config.exports_dir.join(format!("wrapped_{slug}.json"))
    });
    summary
        .write_json(&out_path)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    println!("Wrapped summary written to {}", out_path.display());

    Ok(())
}

fn print_terminal(summary: &WrappedSummary, top: usize) {
    let title = format!("YOUR {} MESSAGES WRAPPED", summary.period);

    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();

    if summary.total_messages_sent == 0 {
        println!("  No messages found for this period.");
        println!();
        return;
    }

    println!("THE NUMBERS");
    println!(
        "   Messages sent: {:<10} Words sent: {}",
        summary.total_messages_sent, summary.total_words_sent
    );
    println!("   People messaged (1-on-1): {}", summary.direct_chats_messaged);
    println!();

    if !summary.top_chats_by_messages.is_empty() {
        println!("TOP CHATS (messages you sent)");
        for (i, (name, count)) in summary.top_chats_by_messages.iter().enumerate() {
            println!("   {}. {:<24} {:>8}", i + 1, name, count);
        }
        println!();
    }

    if !summary.top_chats_by_attachments.is_empty() {
        println!("TOP CHATS (attachments you sent)");
        for (i, (name, count)) in summary.top_chats_by_attachments.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            println!("   {}. {:<24} {:>8}", i + 1, name, count);
        }
        println!();
    }

    if !summary.top_emojis.is_empty() {
        println!("TOP EMOJIS");
        let line: Vec<String> = summary
            .top_emojis
            .iter()
            .take(10)
            .map(|(emoji, count)| format!("{emoji} x{count}"))
            .collect();
        println!("   {}", line.join("   "));
        println!();
    }

    if !summary.response_time_extremes.top.is_empty() {
        println!("RESPONSE TIME");
        if let Some((name, minutes)) = summary.response_time_extremes.bottom.first() {
            println!("   Fastest replies: {:<20} {:>8.1} min", name, minutes);
        }
        if let Some((name, minutes)) = summary.response_time_extremes.top.first() {
            println!("   Slowest replies: {:<20} {:>8.1} min", name, minutes);
        }
        println!();
    }

    if !summary.conversation_comparison.is_empty() {
        println!("MOST ACTIVE CHATS (your messages per day)");
        for (i, entry) in summary.conversation_comparison.iter().take(top).enumerate() {
            println!(
                "   {}. {:<24} {:>7.2}/day over {} days{}",
                i + 1,
                entry.name,
                entry.messages_per_day_self,
                entry.duration_days,
                if entry.is_group_chat { "  (group)" } else { "" }
            );
        }
        println!();
    }
}
