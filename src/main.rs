//! burrow - An interactive disk-usage explorer.
//!
//! Usage:
//!   burrow [PATH]            Launch the explorer (overview when PATH is omitted)
//!   burrow scan [PATH]       Print direct-child sizes of a directory
//!   burrow large [PATH]      Print the largest files under a directory
//!   burrow --help            Show help

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::Level;

use burrow_core::{Entry, EntrySize};
use burrow_scan::{DirScanner, LargeFileScanner, ProgressCounters, ScanConfig};
use burrow_tui::app::state::UserSettings;

#[derive(Parser)]
#[command(
    name = "burrow",
    version,
    about = "An interactive disk-usage explorer",
    long_about = "burrow shows where your disk space goes.\n\n\
                  Run `burrow` for an overview of well-known locations, \
                  `burrow PATH` to explore one directory, or use subcommands \
                  for one-off reports."
)]
struct Cli {
    /// Directory to explore (skips the overview)
    path: Option<PathBuf>,

    /// Ignore cached overview sizes for this session
    #[arg(long)]
    no_cache: bool,

    /// Write a log to this file (also read from BURROW_LOG)
    #[arg(long, env = "BURROW_LOG", global = true)]
    log: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Size the direct children of a directory
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Find the largest files under a directory
    Large {
        /// Directory to search
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Minimum file size (e.g., "500MB", "2GB")
        #[arg(short, long, default_value = "100MB")]
        min_size: String,

        /// Number of files to show
        #[arg(short = 'n', long, default_value = "50")]
        top: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    if let Some(log) = &cli.log {
        init_logging(log, cli.verbose)?;
    }

    match cli.command {
        Some(Command::Scan { path, top, json }) => run_scan(&path, top, json),
        Some(Command::Large {
            path,
            min_size,
            top,
            json,
        }) => run_large(&path, &min_size, top, json),
        None => {
            let start_path = cli.path.as_deref().map(start_dir).transpose()?;
            tracing::info!(start = ?start_path, no_cache = cli.no_cache, "starting explorer");
            burrow_tui::run(burrow_tui::TuiConfig {
                start_path,
                no_cache: cli.no_cache,
            })
        }
    }
}

/// Resolve the directory the explorer opens on.
fn start_dir(path: &Path) -> Result<PathBuf> {
    let path = path.canonicalize().context("Invalid path")?;
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    Ok(path)
}

/// Send tracing output to a file; the terminal belongs to the explorer.
fn init_logging(path: &Path, verbose: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create log file {}", path.display()))?;
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

/// Size the direct children of a directory and print them.
fn run_scan(path: &Path, top: usize, json: bool) -> Result<()> {
    let path = path.canonicalize().context("Invalid path")?;
    let settings = UserSettings::load();

    eprintln!("Scanning {}...", path.display());

    let scanner = DirScanner::new(ScanConfig::default(), Arc::new(settings.path_sets()));
    let counters = ProgressCounters::new();
    let cancel = CancellationToken::new();
    let summary = scanner
        .scan(&path, &counters, &cancel, &|_| {})
        .context("Scan failed")?;

    if json {
        let report = serde_json::json!({
            "root": summary.root,
            "total": summary.total,
            "errors": summary.errors,
            "elapsed_ms": summary.elapsed.as_millis() as u64,
            "entries": summary.entries.iter().take(top).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}", "─".repeat(70));
    println!(" {} - {}", path.display(), format_size(summary.total));
    println!(
        " {} entries, scanned in {:.2}s",
        summary.entries.len(),
        summary.elapsed.as_secs_f64()
    );
    println!("{}", "─".repeat(70));
    println!();

    for entry in summary.entries.iter().take(top) {
        print_entry(entry, summary.total);
    }

    let remaining = summary.entries.len().saturating_sub(top);
    if remaining > 0 {
        println!("  ... and {remaining} more");
    }
    if summary.errors > 0 {
        println!();
        println!("{} item(s) could not be read", summary.errors);
    }

    Ok(())
}

/// Find and print the largest files under a directory.
fn run_large(path: &Path, min_size: &str, top: usize, json: bool) -> Result<()> {
    let path = path.canonicalize().context("Invalid path")?;
    let threshold = parse_size(min_size)?;
    let settings = UserSettings::load();

    let mut config = settings.spotlight_config();
    config.threshold = threshold;
    config.max_count = top;

    eprintln!(
        "Searching {} for files of at least {}...",
        path.display(),
        format_size(threshold)
    );

    let scanner = LargeFileScanner::new(config, Arc::new(settings.path_sets()));
    let counters = ProgressCounters::new();
    let cancel = CancellationToken::new();
    let files = scanner
        .scan(&path, &counters, &cancel)
        .context("Search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    println!();
    if files.is_empty() {
        println!(" No files of at least {} found.", format_size(threshold));
        return Ok(());
    }

    let total: u64 = files.iter().map(|f| f.size).sum();
    println!(
        " {} files, {} combined",
        files.len(),
        format_size(total)
    );
    println!();
    for file in &files {
        let shown = file.path.strip_prefix(&path).unwrap_or(&file.path);
        println!("  {:>10}  {}", format_size(file.size), shown.display());
    }

    Ok(())
}

fn print_entry(entry: &Entry, total: u64) {
    let bytes = entry.bytes();
    let ratio = if total > 0 {
        bytes as f64 / total as f64
    } else {
        0.0
    };
    let marker = if entry.is_dir { "/" } else { "" };
    let size = match entry.size {
        EntrySize::Unknown => "?".to_string(),
        _ => format_size(bytes),
    };
    let note = if entry.folded { " [folded]" } else { "" };

    println!(
        "  {:<40} {:>10} {:>6.1}% {}{}",
        truncate(&format!("{}{}", entry.name, marker), 40),
        size,
        ratio * 100.0,
        make_bar(ratio, 16),
        note
    );
}

/// Create a simple text bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::DECIMAL)
}

/// Truncate a string to at most `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Parse a size string (e.g., "500KB", "10MB", "1.5GB") in decimal units.
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let num: f64 = num
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "M" | "MB" => 1_000_000,
        "G" | "GB" => 1_000_000_000,
        "T" | "TB" => 1_000_000_000_000,
        other => bail!("Unknown size unit: {other}"),
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100MB").unwrap(), 100_000_000);
        assert_eq!(parse_size("1.5gb").unwrap(), 1_500_000_000);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("2 K").unwrap(), 2_000);
        assert!(parse_size("12XB").is_err());
        assert!(parse_size("MB").is_err());
    }

    #[test]
    fn test_start_dir_rejects_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let err = start_dir(&file).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
        assert!(start_dir(&temp.path().join("missing")).is_err());
        assert_eq!(
            start_dir(temp.path()).unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_make_bar() {
        assert_eq!(make_bar(0.5, 4), "██··");
        assert_eq!(make_bar(2.0, 4), "████");
    }
}
