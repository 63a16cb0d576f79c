use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use crossterm::style::Color;
use log::info;

use crate::{
    cli::common::{self, ServerTargetArgs},
    error::CliError,
    output::{Renderer, ToRecord},
    provider::{Node, NodeDriver, NodeFilter, NodeNetwork, NodeSpec},
    utils::print_colored,
};

#[derive(Args)]
pub struct ServerCommand {
    #[command(subcommand)]
    pub action: ServerAction,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiskSpeed {
    #[value(name = "STANDARD")]
    Standard,
    #[value(name = "HIGHPERFORMANCE")]
    HighPerformance,
    #[value(name = "ECONOMY")]
    Economy,
}

impl DiskSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskSpeed::Standard => "STANDARD",
            DiskSpeed::HighPerformance => "HIGHPERFORMANCE",
            DiskSpeed::Economy => "ECONOMY",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitoringPlan {
    #[value(name = "ESSENTIALS")]
    Essentials,
    #[value(name = "ADVANCED")]
    Advanced,
}

impl MonitoringPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitoringPlan::Essentials => "ESSENTIALS",
            MonitoringPlan::Advanced => "ADVANCED",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only servers in this datacenter
    #[arg(long = "datacenterId")]
    pub datacenter_id: Option<String>,
    /// Only servers in this network domain
    #[arg(long = "networkDomainId")]
    pub network_domain_id: Option<String>,
    /// Only servers on this MCP 1.0 network
    #[arg(long = "networkId")]
    pub network_id: Option<String>,
    /// Only servers on this VLAN
    #[arg(long = "vlanId")]
    pub vlan_id: Option<String>,
    /// Only servers deployed from this image
    #[arg(long = "sourceImageId")]
    pub source_image_id: Option<String>,
    #[arg(long)]
    pub deployed: Option<bool>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub started: Option<bool>,
    #[arg(long)]
    pub ipv6: Option<String>,
    #[arg(long = "privateIpv4")]
    pub private_ipv4: Option<String>,
    /// Only print server IDs
    #[arg(long = "idsonly")]
    pub ids_only: bool,
}

impl ListArgs {
    fn filter(&self) -> NodeFilter {
        NodeFilter {
            datacenter_id: self.datacenter_id.clone(),
            network_domain_id: self.network_domain_id.clone(),
            network_id: self.network_id.clone(),
            vlan_id: self.vlan_id.clone(),
            source_image_id: self.source_image_id.clone(),
            deployed: self.deployed,
            name: self.name.clone(),
            state: self.state.clone(),
            started: self.started,
            ipv6: self.ipv6.clone(),
            private_ipv4: self.private_ipv4.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long = "imageId")]
    pub image_id: String,
    #[arg(long = "administratorPassword")]
    pub administrator_password: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Network domain for the primary NIC, used with --vlanId
    #[arg(long = "networkDomainId")]
    pub network_domain_id: Option<String>,
    #[arg(long = "vlanId")]
    pub vlan_id: Option<String>,
    /// MCP 1.0 network, instead of --networkDomainId/--vlanId
    #[arg(long = "networkId")]
    pub network_id: Option<String>,
    #[arg(long = "memoryGb")]
    pub memory_gb: Option<u32>,
    #[arg(long = "cpuCount")]
    pub cpu_count: Option<u32>,
    /// Leave the server stopped after deployment
    #[arg(long = "noStart")]
    pub no_start: bool,
}

impl CreateArgs {
    fn spec(&self) -> Result<NodeSpec, CliError> {
        let network = match (&self.network_domain_id, &self.vlan_id, &self.network_id) {
            (Some(network_domain_id), Some(vlan_id), None) => NodeNetwork::Domain {
                network_domain_id: network_domain_id.clone(),
                vlan_id: vlan_id.clone(),
            },
            (None, None, Some(network_id)) => NodeNetwork::Legacy {
                network_id: network_id.clone(),
            },
            _ => {
                return Err(CliError::usage(
                    "Specify either --networkDomainId with --vlanId, or --networkId",
                ))
            }
        };

        Ok(NodeSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            image_id: self.image_id.clone(),
            administrator_password: self.administrator_password.clone(),
            network,
            memory_gb: self.memory_gb,
            cpu_count: self.cpu_count,
            start: !self.no_start,
        })
    }
}

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub enum ServerAction {
    /// List servers
    List(ListArgs),
    /// Show details of a server
    Info {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Deploy a new server
    Create(CreateArgs),
    /// Delete a server
    Destroy {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Reboot a server gracefully
    Reboot {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Hard reset a server
    #[command(alias = "reboot-hard")]
    RebootHard {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Shut a server down gracefully
    Shutdown {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Power a server off
    #[command(alias = "shutdown-hard")]
    ShutdownHard {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Start a server
    Start {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Change the RAM of a server
    #[command(alias = "update-ram")]
    UpdateRam {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "ramInGB")]
        ram_in_gb: u32,
    },
    /// Change the CPU count of a server
    #[command(alias = "update-cpu-count")]
    UpdateCpuCount {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "cpuCount")]
        cpu_count: u32,
    },
    /// Add a disk to a server
    #[command(alias = "add-disk")]
    AddDisk {
        #[command(flatten)]
        target: ServerTargetArgs,
        /// Size in GB
        #[arg(long)]
        size: u32,
        #[arg(long, value_enum, default_value = "STANDARD", ignore_case = true)]
        speed: DiskSpeed,
    },
    /// Remove a disk from a server
    #[command(alias = "remove-disk")]
    RemoveDisk {
        #[command(flatten)]
        target: ServerTargetArgs,
        /// SCSI ID of the disk
        #[arg(long = "diskId")]
        disk_id: u32,
    },
    /// Expand a disk or change its speed
    #[command(alias = "modify-disk")]
    ModifyDisk {
        #[command(flatten)]
        target: ServerTargetArgs,
        /// SCSI ID of the disk
        #[arg(long = "diskId")]
        disk_id: u32,
        /// New size in GB
        #[arg(long)]
        size: Option<u32>,
        #[arg(long, value_enum, ignore_case = true)]
        speed: Option<DiskSpeed>,
    },
    /// Enable monitoring on a server
    #[command(alias = "enable-monitoring")]
    EnableMonitoring {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "servicePlan", value_enum, default_value = "ESSENTIALS", ignore_case = true)]
        service_plan: MonitoringPlan,
    },
    /// Change the monitoring plan of a server
    #[command(alias = "update-monitoring")]
    UpdateMonitoring {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "servicePlan", value_enum, default_value = "ESSENTIALS", ignore_case = true)]
        service_plan: MonitoringPlan,
    },
    /// Disable monitoring on a server
    #[command(alias = "disable-monitoring")]
    DisableMonitoring {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Apply a tag to a server
    #[command(alias = "apply-tag")]
    ApplyTag {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "tagKeyName")]
        tag_key_name: String,
        #[arg(long = "tagKeyValue")]
        tag_key_value: Option<String>,
    },
    /// Remove a tag from a server
    #[command(alias = "remove-tag")]
    RemoveTag {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "tagKeyName")]
        tag_key_name: String,
    },
}

impl ServerCommand {
    pub async fn execute(&self, node: &dyn NodeDriver, renderer: &Renderer) -> Result<()> {
        match &self.action {
            ServerAction::List(args) => list(node, renderer, args).await,
            ServerAction::Info { target } => {
                let id = target.resolve(node).await?;
                match node.get_node(&id).await? {
                    Some(server) => println!("{}", renderer.render_one(server.to_record())?),
                    None => println!("No node found"),
                }
                Ok(())
            }
            ServerAction::Create(args) => {
                let spec = args.spec()?;
                info!("Deploying server '{}' from image {}", spec.name, spec.image_id);
                let id = node.create_node(&spec).await?;
                print_colored(&format!("Node starting up: {}", id), Color::Green);
                Ok(())
            }
            ServerAction::Destroy { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.destroy_node(&id).await?,
                    format!("Server {} is being destroyed", id),
                    format!("Something went wrong with attempting to destroy {}", id),
                )
            }
            ServerAction::Reboot { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.reboot_node(&id).await?,
                    format!("Server {} is being rebooted", id),
                    format!("Something went wrong with attempting to reboot {}", id),
                )
            }
            ServerAction::RebootHard { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.reset_node(&id).await?,
                    format!("Server {} is being rebooted", id),
                    format!("Something went wrong with attempting to reboot {}", id),
                )
            }
            ServerAction::Shutdown { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.shutdown_graceful(&id).await?,
                    format!("Server {} is shutting down gracefully", id),
                    format!("Something went wrong when attempting to shutdown {}", id),
                )
            }
            ServerAction::ShutdownHard { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.power_off(&id).await?,
                    format!("Server {} is shutting down hard", id),
                    format!("Something went wrong when attempting to shutdown {}", id),
                )
            }
            ServerAction::Start { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.start_node(&id).await?,
                    format!("Server {} is starting", id),
                    format!("Something went wrong when attempting to start {}", id),
                )
            }
            ServerAction::UpdateRam { target, ram_in_gb } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.reconfigure_node(&id, Some(*ram_in_gb), None).await?,
                    format!("Server {} RAM changed to {}GB", id, ram_in_gb),
                    format!("Something went wrong attempting to change RAM on {}", id),
                )
            }
            ServerAction::UpdateCpuCount { target, cpu_count } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.reconfigure_node(&id, None, Some(*cpu_count)).await?,
                    format!("Server {} CPU Count changing to {}", id, cpu_count),
                    format!("Something went wrong attempting to change CPU count on {}", id),
                )
            }
            ServerAction::AddDisk {
                target,
                size,
                speed,
            } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.add_disk(&id, *size, speed.as_str()).await?,
                    format!("Adding disk to {}", id),
                    format!("Something went wrong attempting to add disk to {}", id),
                )
            }
            ServerAction::RemoveDisk { target, disk_id } => {
                let id = target.resolve(node).await?;
                let server = fetch_node(node, &id).await?;
                let disk = find_disk(&server, *disk_id)?;
                common::finish(
                    node.remove_disk(&disk.id).await?,
                    format!("Removed disk {} from {}", disk_id, id),
                    format!("Something went wrong attempting to remove disk from {}", id),
                )
            }
            ServerAction::ModifyDisk {
                target,
                disk_id,
                size,
                speed,
            } => modify_disk(node, target, *disk_id, *size, *speed).await,
            ServerAction::EnableMonitoring {
                target,
                service_plan,
            } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.enable_monitoring(&id, service_plan.as_str()).await?,
                    format!("Server {} enabled for monitoring", id),
                    format!(
                        "Something went wrong when attempting to enable monitoring on {}",
                        id
                    ),
                )
            }
            ServerAction::UpdateMonitoring {
                target,
                service_plan,
            } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.update_monitoring(&id, service_plan.as_str()).await?,
                    format!(
                        "Server {} monitoring updated to {}",
                        id,
                        service_plan.as_str()
                    ),
                    format!(
                        "Something went wrong when attempting to update monitoring on {}",
                        id
                    ),
                )
            }
            ServerAction::DisableMonitoring { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.disable_monitoring(&id).await?,
                    format!("Server {} monitoring disabled", id),
                    format!(
                        "Something went wrong when attempting to disable monitoring on {}",
                        id
                    ),
                )
            }
            ServerAction::ApplyTag {
                target,
                tag_key_name,
                tag_key_value,
            } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.apply_tag(&id, tag_key_name, tag_key_value.as_deref())
                        .await?,
                    format!("Tag applied to {}", id),
                    format!("Error when applying tag to {}", id),
                )
            }
            ServerAction::RemoveTag {
                target,
                tag_key_name,
            } => {
                let id = target.resolve(node).await?;
                common::finish(
                    node.remove_tag(&id, tag_key_name).await?,
                    format!("Tag removed from {}", id),
                    format!("Error when removing tag from {}", id),
                )
            }
        }
    }
}

async fn list(node: &dyn NodeDriver, renderer: &Renderer, args: &ListArgs) -> Result<()> {
    let nodes = node.list_nodes(&args.filter()).await?;

    if args.ids_only {
        for server in nodes.iter() {
            println!("{}", server.id);
        }
        return Ok(());
    }

    common::print_records(
        renderer,
        nodes.iter().map(ToRecord::to_record).collect(),
        "No nodes found",
    )
}

async fn fetch_node(node: &dyn NodeDriver, id: &str) -> Result<Node, CliError> {
    node.get_node(id)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("No node found with id {}", id)))
}

fn find_disk(server: &Node, scsi_id: u32) -> Result<&crate::provider::Disk, CliError> {
    server
        .disk_by_scsi_id(scsi_id)
        .ok_or_else(|| CliError::NotFound(format!("No disk with id {}", scsi_id)))
}

/// Exactly one of size and speed may change per call.
fn disk_change(size: Option<u32>, speed: Option<DiskSpeed>) -> Result<DiskChange, CliError> {
    match (size, speed) {
        (Some(size), None) => Ok(DiskChange::Size(size)),
        (None, Some(speed)) => Ok(DiskChange::Speed(speed)),
        (Some(_), Some(_)) => Err(CliError::usage(
            "--size and --speed cannot be changed in the same call",
        )),
        (None, None) => Err(CliError::usage("Specify either --size or --speed")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiskChange {
    Size(u32),
    Speed(DiskSpeed),
}

async fn modify_disk(
    node: &dyn NodeDriver,
    target: &ServerTargetArgs,
    disk_id: u32,
    size: Option<u32>,
    speed: Option<DiskSpeed>,
) -> Result<()> {
    // validate before any remote call
    let change = disk_change(size, speed)?;

    let id = target.resolve(node).await?;
    let server = fetch_node(node, &id).await?;
    let disk = find_disk(&server, disk_id)?;

    let accepted = match change {
        DiskChange::Size(size) => node.expand_disk(&disk.id, size).await?,
        DiskChange::Speed(speed) => node.change_disk_speed(&disk.id, speed.as_str()).await?,
    };

    common::finish(
        accepted,
        format!("Successfully modified disk {} on {}", disk_id, id),
        format!("Something went wrong attempting to modify disk on {}", id),
    )
}
