//! CLI argument definitions for Tickvault.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `status` | Show trading-day and session status |
//! | `quote` | Resolve a quote (live or cached, with provenance) |
//! | `correlate` | Correlate daily indicators between two instruments |
//! | `capture` | Capture snapshots for a list of instruments |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--data-dir` | `data` | Directory holding snapshots and the holiday table |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve deterministic data without network access |
//! | `--timeout-ms` | `10000` | Live fetch timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! # Is the market open right now?
//! tickvault status
//!
//! # Resolve a quote; cached snapshots are served outside the session
//! tickvault quote 600519 --pretty
//!
//! # Correlate turnover and MA5 over 60 shared trading days
//! tickvault correlate 600519 000858 --days 60 --indicators turnover_rate,ma5
//!
//! # One capture sweep over a watchlist
//! tickvault capture 600519 000858 au
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tickvault - session-aware A-share quote cache
///
/// Resolves quotes against a live provider while the exchange session is
/// open and against a durable snapshot cache while it is not, and computes
/// indicator correlations over shared trading days.
#[derive(Debug, Parser)]
#[command(
    name = "tickvault",
    author,
    version,
    about = "Session-aware market data cache and correlation CLI"
)]
pub struct Cli {
    /// Directory holding the snapshot log and the holiday table.
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic mock data without touching the network.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Live fetch timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show trading-day verdict, session phase, and previous trading day.
    ///
    /// # Examples
    ///
    ///   tickvault status
    ///   tickvault status --date 2026-02-18
    Status(StatusArgs),

    /// Resolve a quote for one instrument.
    ///
    /// During the open session the answer is live (and written through to
    /// the snapshot cache); otherwise the latest snapshot is served. The
    /// output names its source either way.
    ///
    /// # Examples
    ///
    ///   tickvault quote 600519
    ///   tickvault quote au --pretty
    Quote(QuoteArgs),

    /// Correlate daily indicators between two instruments.
    ///
    /// History is aligned on shared trading dates; a Pearson coefficient is
    /// reported per indicator, or null when the paired series is too short
    /// or constant.
    ///
    /// # Examples
    ///
    ///   tickvault correlate 600519 000858
    ///   tickvault correlate 600519 000858 --days 90 --indicators ma5
    Correlate(CorrelateArgs),

    /// Capture one snapshot per instrument into the cache.
    ///
    /// Intended for cron-style invocation during the open session; failures
    /// on individual instruments do not abort the sweep.
    ///
    /// # Examples
    ///
    ///   tickvault capture 600519 000858 au
    Capture(CaptureArgs),
}

/// Arguments for the `status` command.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Date to check instead of today (YYYY-MM-DD, exchange-local).
    #[arg(long)]
    pub date: Option<String>,
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Instrument code (e.g., 600519, 000858, au).
    pub code: String,
}

/// Arguments for the `correlate` command.
#[derive(Debug, Args)]
pub struct CorrelateArgs {
    /// First instrument code.
    pub code1: String,

    /// Second instrument code.
    pub code2: String,

    /// Comparison window in trading days.
    #[arg(long, default_value_t = 30)]
    pub days: usize,

    /// Comma-separated indicators: turnover_rate, amplitude,
    /// change_percent, ma5.
    #[arg(long, default_value = "turnover_rate,amplitude,change_percent,ma5")]
    pub indicators: String,
}

/// Arguments for the `capture` command.
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Instrument codes to capture.
    #[arg(required = true, num_args = 1..)]
    pub codes: Vec<String>,
}
