/// CLI interface and commands.

/// Backup configuration of a server.
pub mod backup;

/// Common arguments and output helpers for CLI.
pub mod common;

/// Server lifecycle, disks, monitoring and tags.
pub mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{config::CredentialOverrides, output::OutputType};

#[derive(Parser)]
#[command(name = "didata", version)]
#[command(about = "An interface into the Dimension Data Cloud")]
pub struct Cli {
    /// Config file, defaults to ~/.didata/config.toml when present
    #[arg(long, env = "DIDATA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cloud account user name (MCP_USER is also read)
    #[arg(long, env = "DIDATA_USER", global = true)]
    pub user: Option<String>,

    /// Cloud account password (MCP_PASSWORD is also read)
    #[arg(long, env = "DIDATA_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Region, e.g. dd-na, dd-eu, dd-au (default dd-na, MCP_REGION is also read)
    #[arg(long, env = "DIDATA_REGION", global = true)]
    pub region: Option<String>,

    /// API base URL, overrides the region's endpoint
    #[arg(long, env = "DIDATA_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output type for listings and details
    #[arg(
        long = "outputType",
        value_enum,
        env = "DIDATA_OUTPUTTYPE",
        default_value = "pretty",
        ignore_case = true,
        global = true
    )]
    pub output_type: OutputType,

    /// Result query, e.g. "ReturnCount:1|ReturnKeys:ID,Name"
    #[arg(long, global = true)]
    pub query: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn credential_overrides(&self) -> CredentialOverrides {
        self.credential_overrides_with(|name| std::env::var(name).ok())
    }

    /// Flags and `DIDATA_*` variables win over the older `MCP_*` names.
    fn credential_overrides_with(
        &self,
        legacy_env: impl Fn(&str) -> Option<String>,
    ) -> CredentialOverrides {
        let legacy = |name: &str| legacy_env(name).filter(|v| !v.is_empty());
        CredentialOverrides {
            user: self.user.clone().or_else(|| legacy("MCP_USER")),
            password: self.password.clone().or_else(|| legacy("MCP_PASSWORD")),
            region: self.region.clone().or_else(|| legacy("MCP_REGION")),
            endpoint: self.endpoint.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Server lifecycle, disks, monitoring and tags
    Server(server::ServerCommand),
    /// Cloud backup for a server
    Backup(backup::BackupCommand),
}
