use clap::Parser;

mod core;

use crate::core::{
    cli::{Cli, Command},
    configuration, logger,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let configuration_file = cli
        .configuration_file
        .clone()
        .unwrap_or_else(|| "config.toml".to_string());

    let conf = configuration::get_configuration(configuration_file).await?;

    let level = cli
        .verbosity
        .map(|v| v.to_string())
        .or_else(|| conf.log.level.clone())
        .unwrap_or_else(|| "info".to_string());

    let _logger = logger::init(&level, conf.log.retention.unwrap_or(31))?;

    match &cli.command {
        Command::Discover => crate::core::core::discover(&conf).await?,
        Command::Register { pooling_interval } => {
            crate::core::core::register(&conf, *pooling_interval).await?
        }
        Command::SessionDiagnostic { show_token } => {
            crate::core::core::session_diagnostic(&conf, show_token.unwrap_or(false)).await?
        }
    }

    Ok(())
}
