//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vigil", about = "interview-session telemetry recorder")]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(long, short = 'c', global = true, default_value = "vigil.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a session until Ctrl-C (or --duration-secs elapses)
    Track(TrackOpts),
    /// Probe virtualization and host resources, print as JSON
    Probe,
    /// List recorded sessions for a call url, newest first (JSON)
    Sessions(SessionsOpts),
    /// Print one session with its full event list (JSON)
    Show(ShowOpts),
}

#[derive(clap::Args)]
pub struct TrackOpts {
    /// The monitored call url the session is tied to
    #[arg(long, env = "VIGIL_CALL_URL")]
    pub call_url: String,

    /// Stop automatically after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

#[derive(clap::Args)]
pub struct SessionsOpts {
    #[arg(long)]
    pub call_url: String,
}

#[derive(clap::Args)]
pub struct ShowOpts {
    /// Session id to display
    pub session_id: String,
}
