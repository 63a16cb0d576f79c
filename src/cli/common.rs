/// Common arguments and output helpers for CLI.
use anyhow::Result;
use clap::Args;
use crossterm::style::Color;

use crate::{
    error::CliError,
    locator::{self, ServerSelector},
    output::{OutputType, Record, Renderer},
    provider::{NodeDriver, NodeFilter},
    utils::print_colored,
};

/// Selects the server a command acts on.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerTargetArgs {
    /// The server ID to act on
    #[arg(long = "serverId")]
    pub server_id: Option<String>,
    /// Select the server by its IPv6 address
    #[arg(long = "serverFilterIpv6")]
    pub filter_ipv6: Option<String>,
    /// Select the server by its private IPv4 address
    #[arg(long = "serverFilterPrivateIpv4")]
    pub filter_private_ipv4: Option<String>,
    /// Select the server by name
    #[arg(long = "serverFilterName")]
    pub filter_name: Option<String>,
}

impl ServerTargetArgs {
    pub fn selector(&self) -> ServerSelector {
        ServerSelector {
            server_id: self.server_id.clone(),
            filter: NodeFilter {
                ipv6: self.filter_ipv6.clone(),
                private_ipv4: self.filter_private_ipv4.clone(),
                name: self.filter_name.clone(),
                ..Default::default()
            },
        }
    }

    pub async fn resolve(&self, node: &dyn NodeDriver) -> Result<String, CliError> {
        locator::resolve_server_id(node, &self.selector()).await
    }
}

/// Print the success message, or fail with the soft failure message.
pub fn finish(accepted: bool, success: String, failure: String) -> Result<()> {
    if accepted {
        print_colored(&success, Color::Green);
        Ok(())
    } else {
        Err(CliError::SoftFailure(failure).into())
    }
}

/// Print a rendered listing. An empty listing prints `empty` in pretty mode
/// and an empty array in JSON and YAML.
pub fn print_records(renderer: &Renderer, records: Vec<Record>, empty: &str) -> Result<()> {
    if records.is_empty() && renderer.output_type == OutputType::Pretty {
        println!("{}", empty);
        return Ok(());
    }

    println!("{}", renderer.render_list(records)?);
    Ok(())
}
