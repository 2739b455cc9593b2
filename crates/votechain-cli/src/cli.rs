use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "votechain",
    about = "Tamper-evident vote ledger with an OTP gate",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "VOTECHAIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite ledger file (overrides the configured store)
    #[arg(long, global = true, conflicts_with = "json")]
    pub db: Option<PathBuf>,

    /// JSON ledger file (overrides the configured store)
    #[arg(long, global = true)]
    pub json: Option<PathBuf>,

    /// Log filter, e.g. "debug" (RUST_LOG wins when set)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[arg(long, global = true)]
    pub log_format: Option<LogFormatArg>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormatArg {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Request an OTP, verify it and cast a vote (demo: the code is shown)
    Cast(CastArgs),
    /// Verify the ledger's hash chain
    Verify,
    /// Count votes per candidate
    Tally,
    /// List records
    Log(LogArgs),
    /// Write the ledger as a JSON document
    Export(ExportArgs),
    /// Replace the ledger with a verified JSON document
    Import(ImportArgs),
    /// Forget this device's vote (the ledger is not touched)
    ResetDevice(DeviceArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct CastArgs {
    #[arg(long)]
    pub voter_id: String,

    #[arg(long)]
    pub candidate: String,

    /// Code to present; defaults to the one just issued
    #[arg(long)]
    pub otp: Option<String>,

    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args)]
pub struct DeviceArgs {
    /// File holding this device's vote flag
    #[arg(long, default_value = ".votechain-device.json")]
    pub device_file: PathBuf,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
}
