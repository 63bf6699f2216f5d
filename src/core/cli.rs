use clap::{command, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(short, long)]
    pub configuration_file: Option<String>,
    #[arg(short, long)]
    pub verbosity: Option<log::LevelFilter>,
}

#[derive(Subcommand)]
pub enum Command {
    /// queries the device for its API location and version
    Discover,
    /// registers the application and waits for user approval
    Register {
        /// the interval in seconds to check for user validation in registration process
        pooling_interval: Option<u64>,
    },
    /// runs the full login handshake and reports on the session
    SessionDiagnostic {
        /// show the token
        show_token: Option<bool>,
    },
}
