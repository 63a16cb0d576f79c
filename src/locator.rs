/// Resolve the server a command targets.
use log::debug;

use crate::{
    error::CliError,
    provider::{NodeDriver, NodeFilter},
};

/// Either an explicit server id or filters that must match exactly one server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerSelector {
    pub server_id: Option<String>,
    pub filter: NodeFilter,
}

pub async fn resolve_server_id(
    driver: &dyn NodeDriver,
    selector: &ServerSelector,
) -> Result<String, CliError> {
    match (&selector.server_id, selector.filter.is_empty()) {
        (Some(_), false) => Err(CliError::usage(
            "--serverId cannot be combined with server filters",
        )),
        (Some(id), true) => Ok(id.clone()),
        (None, true) => Err(CliError::usage(
            "No serverId or filters for servers were passed",
        )),
        (None, false) => {
            let nodes = driver.list_nodes(&selector.filter).await?;
            debug!("{} servers match {:?}", nodes.len(), selector.filter);

            match nodes.as_slice() {
                [node] => Ok(node.id.clone()),
                [] => Err(CliError::NotFound(
                    "No server found with given filters".to_string(),
                )),
                many => Err(CliError::NotFound(format!(
                    "Too many servers found with given filters ({})",
                    many.len()
                ))),
            }
        }
    }
}
