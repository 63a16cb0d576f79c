use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use crossterm::style::Color;
use log::{debug, LevelFilter};

use didata::cli::{Cli, Commands};
use didata::config::Config;
use didata::output::{Query, Renderer};
use didata::provider::Provider;
use didata::utils::eprint_colored;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version output, and a group invoked without an action
            let code = match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                | ErrorKind::MissingSubcommand => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // init logger
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Warn)
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(cli).await {
        debug!("Command failed: {:?}", e);
        eprint_colored(&format!("{:#}", e), Color::Red);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let query = cli.query.as_deref().map(Query::from_str).transpose()?;
    let renderer = Renderer::new(cli.output_type, query);

    let config = Config::discover(cli.config.as_deref())?;
    let credentials = config.resolve(&cli.credential_overrides())?;
    debug!("Connecting as {}", credentials);

    let provider = Provider::connect(
        &credentials.base_url,
        &credentials.user,
        &credentials.password,
    )
    .context("Failed to set up the cloud API client")?;

    match &cli.command {
        Commands::Server(server_cmd) => server_cmd.execute(provider.node.as_ref(), &renderer).await,
        Commands::Backup(backup_cmd) => backup_cmd.execute(&provider, &renderer).await,
    }
}
