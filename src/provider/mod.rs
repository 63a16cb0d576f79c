/// Provider client for the Dimension Data CloudControl API.
///
/// The CLI only talks to the cloud through the [`NodeDriver`] and
/// [`BackupDriver`] traits; [`Provider::connect`] wires both to a single
/// authenticated [`Connection`].
use std::sync::Arc;

use async_trait::async_trait;

mod backup;
mod connection;
mod node;
pub mod xml;

pub use backup::DimensionDataBackupDriver;
pub use connection::{Connection, ResponseStatus};
pub use node::DimensionDataNodeDriver;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The API rejected the request with a reason code.
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    #[error("Error talking to the cloud API: {0}")]
    Communication(String),
    #[error("Error parsing cloud API response: {0}")]
    Parse(String),
}

impl ProviderError {
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> ProviderError {
        ProviderError::Communication(value.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disk {
    pub id: String,
    pub scsi_id: u32,
    pub size_gb: u32,
    pub speed: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub datacenter_id: Option<String>,
    pub operating_system: Option<String>,
    pub cpu_count: Option<u32>,
    pub memory_gb: Option<u32>,
    pub private_ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub network_domain_id: Option<String>,
    pub vlan_id: Option<String>,
    pub source_image_id: Option<String>,
    pub state: String,
    pub started: bool,
    pub deployed: bool,
    pub create_time: Option<String>,
    pub disks: Vec<Disk>,
    pub monitoring_plan: Option<String>,
}

impl Node {
    pub fn disk_by_scsi_id(&self, scsi_id: u32) -> Option<&Disk> {
        self.disks.iter().find(|d| d.scsi_id == scsi_id)
    }
}

/// Criteria accepted by the server listing call. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    pub datacenter_id: Option<String>,
    pub network_domain_id: Option<String>,
    pub network_id: Option<String>,
    pub vlan_id: Option<String>,
    pub source_image_id: Option<String>,
    pub deployed: Option<bool>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub started: Option<bool>,
    pub ipv6: Option<String>,
    pub private_ipv4: Option<String>,
}

impl NodeFilter {
    pub fn is_empty(&self) -> bool {
        self == &NodeFilter::default()
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![];
        let strings = [
            ("datacenterId", &self.datacenter_id),
            ("networkDomainId", &self.network_domain_id),
            ("networkId", &self.network_id),
            ("vlanId", &self.vlan_id),
            ("sourceImageId", &self.source_image_id),
            ("name", &self.name),
            ("state", &self.state),
            ("ipv6", &self.ipv6),
            ("privateIpv4", &self.private_ipv4),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        if let Some(deployed) = self.deployed {
            pairs.push(("deployed", deployed.to_string()));
        }
        if let Some(started) = self.started {
            pairs.push(("started", started.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeNetwork {
    /// MCP 2.0 placement: network domain plus VLAN for the primary NIC.
    Domain {
        network_domain_id: String,
        vlan_id: String,
    },
    /// MCP 1.0 placement.
    Legacy { network_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    pub description: String,
    pub image_id: String,
    pub administrator_password: String,
    pub network: NodeNetwork,
    pub memory_gb: Option<u32>,
    pub cpu_count: Option<u32>,
    pub start: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupJob {
    pub id: String,
    pub status: String,
    pub percentage: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupClient {
    pub id: String,
    pub client_type: String,
    pub description: Option<String>,
    pub schedule_policy: Option<String>,
    pub storage_policy: Option<String>,
    pub download_url: Option<String>,
    pub running_job: Option<BackupJob>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupDetails {
    pub asset_id: String,
    pub service_plan: String,
    pub state: String,
    pub clients: Vec<BackupClient>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupClientType {
    pub client_type: String,
    pub is_file_system: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupStoragePolicy {
    pub name: String,
    pub retention_period_days: Option<u32>,
    pub secondary_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupSchedulePolicy {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupClientSpec {
    pub client_type: String,
    pub storage_policy: String,
    pub schedule_policy: String,
    pub trigger_on: Option<String>,
    pub notify_email: Option<String>,
}

/// Compute operations. Calls returning `bool` report whether the API accepted
/// the change; API rejections surface as [`ProviderError::Api`].
#[async_trait]
pub trait NodeDriver: Send + Sync {
    async fn list_nodes(&self, filter: &NodeFilter) -> ProviderResult<Vec<Node>>;
    async fn get_node(&self, server_id: &str) -> ProviderResult<Option<Node>>;
    /// Deploy a server and return its id.
    async fn create_node(&self, spec: &NodeSpec) -> ProviderResult<String>;
    async fn destroy_node(&self, server_id: &str) -> ProviderResult<bool>;
    async fn reboot_node(&self, server_id: &str) -> ProviderResult<bool>;
    async fn reset_node(&self, server_id: &str) -> ProviderResult<bool>;
    async fn shutdown_graceful(&self, server_id: &str) -> ProviderResult<bool>;
    async fn power_off(&self, server_id: &str) -> ProviderResult<bool>;
    async fn start_node(&self, server_id: &str) -> ProviderResult<bool>;
    async fn reconfigure_node(
        &self,
        server_id: &str,
        memory_gb: Option<u32>,
        cpu_count: Option<u32>,
    ) -> ProviderResult<bool>;
    async fn add_disk(&self, server_id: &str, size_gb: u32, speed: &str) -> ProviderResult<bool>;
    async fn remove_disk(&self, disk_id: &str) -> ProviderResult<bool>;
    async fn change_disk_speed(&self, disk_id: &str, speed: &str) -> ProviderResult<bool>;
    async fn expand_disk(&self, disk_id: &str, size_gb: u32) -> ProviderResult<bool>;
    async fn enable_monitoring(&self, server_id: &str, plan: &str) -> ProviderResult<bool>;
    async fn update_monitoring(&self, server_id: &str, plan: &str) -> ProviderResult<bool>;
    async fn disable_monitoring(&self, server_id: &str) -> ProviderResult<bool>;
    async fn apply_tag(
        &self,
        server_id: &str,
        key: &str,
        value: Option<&str>,
    ) -> ProviderResult<bool>;
    async fn remove_tag(&self, server_id: &str, key: &str) -> ProviderResult<bool>;
}

/// Cloud backup operations on a server.
#[async_trait]
pub trait BackupDriver: Send + Sync {
    async fn enable_backup(&self, server_id: &str, service_plan: &str) -> ProviderResult<()>;
    async fn disable_backup(&self, server_id: &str) -> ProviderResult<bool>;
    async fn backup_details(&self, server_id: &str) -> ProviderResult<BackupDetails>;
    async fn add_client(&self, server_id: &str, spec: &BackupClientSpec) -> ProviderResult<()>;
    async fn remove_client(&self, server_id: &str, client_id: &str) -> ProviderResult<bool>;
    async fn list_client_types(&self, server_id: &str) -> ProviderResult<Vec<BackupClientType>>;
    async fn list_storage_policies(
        &self,
        server_id: &str,
    ) -> ProviderResult<Vec<BackupStoragePolicy>>;
    async fn list_schedule_policies(
        &self,
        server_id: &str,
    ) -> ProviderResult<Vec<BackupSchedulePolicy>>;
}

/// The configured drivers handed to command handlers.
pub struct Provider {
    pub node: Box<dyn NodeDriver>,
    pub backup: Box<dyn BackupDriver>,
}

impl Provider {
    pub fn connect(base_url: &str, user: &str, password: &str) -> Result<Self, ProviderError> {
        let connection = Arc::new(Connection::new(base_url, user, password)?);
        Ok(Self {
            node: Box::new(DimensionDataNodeDriver::new(Arc::clone(&connection))),
            backup: Box::new(DimensionDataBackupDriver::new(connection)),
        })
    }
}
