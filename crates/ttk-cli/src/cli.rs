//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ttk_core::SheetName;

/// Terminal timekeeper.
///
/// Tracks time against named sheets in a local SQLite database and renders
/// aggregated reports by day, week, month, or year.
#[derive(Debug, Parser)]
#[command(name = "ttk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a tracking sheet or switch to an existing one.
    ///
    /// Without a name, presents a selection menu over existing sheets.
    Sheet {
        /// The sheet name.
        name: Option<SheetName>,
    },

    /// List all tracking sheets.
    Sheets,

    /// Start tracking time on the active sheet.
    Start {
        /// A note describing the work.
        note: Option<String>,
    },

    /// Stop tracking time.
    ///
    /// Prompts for a note when neither the entry nor the argument has one.
    Stop {
        /// A note describing the work.
        note: Option<String>,
    },

    /// Display tracked entries for a period.
    Display {
        /// The period to display: day, week, month, or year.
        #[arg(default_value = "day")]
        period: String,
    },

    /// Import closed entries from an external tracking API.
    Import {
        /// Base URL of the API, e.g. http://localhost:8080.
        url: String,
    },
}
