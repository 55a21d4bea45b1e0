//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tradebot")]
#[command(
    author,
    version,
    about = "Multi-timeframe signal scoring and position auto-management bot"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRADEBOT_CONFIG", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level; overrides `logging.level` from the configuration
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run cycles until interrupted
    Run,
    /// Run a single cycle and print its report
    Once(OnceArgs),
    /// Show current indicator readings for one symbol
    Indicators(IndicatorsArgs),
    /// Change auto-management settings in the saved snapshot
    Manage(ManageArgs),
    /// Validate configuration
    ValidateConfig,
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[derive(clap::Args)]
pub struct OnceArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct IndicatorsArgs {
    /// Symbol to analyse
    pub symbol: String,

    /// Timeframes (comma-separated); defaults to the configured set
    #[arg(short, long, value_delimiter = ',')]
    pub timeframes: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct ManageArgs {
    #[command(subcommand)]
    pub action: ManageAction,
}

#[derive(Subcommand)]
pub enum ManageAction {
    /// Start managing a symbol
    Enable(EnableArgs),
    /// Stop managing a symbol
    Disable {
        /// Symbol to release
        symbol: String,
    },
    /// Stop managing every symbol
    DisableAll,
    /// List symbols under management
    List,
}

#[derive(clap::Args)]
pub struct EnableArgs {
    /// Symbol to manage
    pub symbol: String,

    /// Skip the trailing stop
    #[arg(long)]
    pub no_trailing: bool,

    /// Skip partial-profit suggestions
    #[arg(long)]
    pub no_partial_profits: bool,

    /// Skip stop-loss adjustment
    #[arg(long)]
    pub no_stop_adjustment: bool,

    /// Skip risk alerts
    #[arg(long)]
    pub no_risk_alerts: bool,
}
