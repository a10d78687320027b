use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "orchardops",
    version,
    about = "Orchard insight engine: forecast advisories and situation reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the system report as JSON
    Report(InputArgs),
    /// Build the dashboard manifest as JSON
    Manifest {
        #[command(flatten)]
        input: InputArgs,

        /// Render a single plot (drops the global banner)
        #[arg(long)]
        focus: Option<String>,
    },
    /// Show how a free-text plot reference resolves
    Resolve {
        /// Plot slug, alias or Thai keyword
        query: String,
    },
    /// Validate config and list the plot table
    Check,
}

#[derive(Args)]
pub struct InputArgs {
    /// Forecast rows as JSON ("-" for stdin)
    #[arg(short, long)]
    pub forecasts: PathBuf,

    /// Activity journal rows as JSON
    #[arg(short, long)]
    pub activities: Option<PathBuf>,

    /// Insight overrides as JSON
    #[arg(short, long)]
    pub overrides: Option<PathBuf>,

    /// Limit the report to these plots (repeatable)
    #[arg(short, long = "plot")]
    pub plots: Vec<String>,

    /// Pin "now" (RFC 3339) for reproducible output
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}
