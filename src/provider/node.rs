/// Server operations against the CloudControl 2.4 API.
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    connection::Connection,
    xml::{self, TYPES_NAMESPACE},
    Disk, Node, NodeDriver, NodeFilter, NodeNetwork, NodeSpec, ProviderError, ProviderResult,
};

const PAGE_SIZE: u32 = 250;

// <servers> listing page. `pageCount` is the number of servers on this page.
#[derive(Debug, Deserialize)]
struct ServersXml {
    #[serde(rename = "@pageCount", default)]
    page_count: u32,
    #[serde(rename = "@pageSize")]
    page_size: Option<u32>,
    #[serde(rename = "@totalCount")]
    total_count: Option<u32>,
    #[serde(rename = "server", default)]
    servers: Vec<ServerXml>,
}

impl ServersXml {
    /// A full page means another one may follow, unless `totalCount` says
    /// everything has been read.
    fn has_more(&self, seen: usize) -> bool {
        let page_size = self.page_size.unwrap_or(PAGE_SIZE);
        let below_total = self
            .total_count
            .map_or(true, |total| (seen as u64) < u64::from(total));
        self.page_count > 0 && self.page_count >= page_size && below_total
    }
}

#[derive(Debug, Deserialize)]
struct ServerXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@datacenterId")]
    datacenter_id: Option<String>,
    #[serde(default)]
    name: String,
    description: Option<String>,
    #[serde(rename = "operatingSystem")]
    operating_system: Option<OperatingSystemXml>,
    cpu: Option<CpuXml>,
    #[serde(rename = "memoryGb")]
    memory_gb: Option<u32>,
    #[serde(rename = "disk", default)]
    disks: Vec<DiskXml>,
    #[serde(rename = "scsiController", default)]
    scsi_controllers: Vec<ScsiControllerXml>,
    #[serde(rename = "networkInfo")]
    network_info: Option<NetworkInfoXml>,
    nic: Option<NicXml>,
    #[serde(rename = "sourceImageId")]
    source_image_id: Option<String>,
    #[serde(rename = "createTime")]
    create_time: Option<String>,
    #[serde(default)]
    deployed: bool,
    #[serde(default)]
    started: bool,
    #[serde(default)]
    state: String,
    monitoring: Option<MonitoringXml>,
}

#[derive(Debug, Deserialize)]
struct OperatingSystemXml {
    #[serde(rename = "@displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CpuXml {
    #[serde(rename = "@count")]
    count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DiskXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@scsiId", default)]
    scsi_id: u32,
    #[serde(rename = "@sizeGb", default)]
    size_gb: u32,
    #[serde(rename = "@speed", default)]
    speed: String,
    #[serde(rename = "@state", default)]
    state: String,
}

// later API versions nest disks under their controller
#[derive(Debug, Deserialize)]
struct ScsiControllerXml {
    #[serde(rename = "disk", default)]
    disks: Vec<DiskXml>,
}

#[derive(Debug, Deserialize)]
struct NetworkInfoXml {
    #[serde(rename = "@networkDomainId")]
    network_domain_id: Option<String>,
    #[serde(rename = "primaryNic")]
    primary_nic: Option<NicXml>,
}

#[derive(Debug, Deserialize)]
struct NicXml {
    #[serde(rename = "@privateIpv4")]
    private_ipv4: Option<String>,
    #[serde(rename = "@ipv6")]
    ipv6: Option<String>,
    #[serde(rename = "@vlanId")]
    vlan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MonitoringXml {
    #[serde(rename = "@servicePlan")]
    service_plan: Option<String>,
}

impl From<DiskXml> for Disk {
    fn from(disk: DiskXml) -> Self {
        Disk {
            id: disk.id,
            scsi_id: disk.scsi_id,
            size_gb: disk.size_gb,
            speed: disk.speed,
            state: disk.state,
        }
    }
}

impl From<ServerXml> for Node {
    fn from(server: ServerXml) -> Self {
        let mut disks: Vec<Disk> = server
            .disks
            .into_iter()
            .chain(server.scsi_controllers.into_iter().flat_map(|c| c.disks))
            .map(Disk::from)
            .collect();
        disks.sort_by_key(|d| d.scsi_id);

        let (network_domain_id, nic) = match server.network_info {
            Some(info) => (info.network_domain_id, info.primary_nic),
            None => (None, server.nic),
        };
        let nic = nic.unwrap_or(NicXml {
            private_ipv4: None,
            ipv6: None,
            vlan_id: None,
        });

        Node {
            id: server.id,
            name: server.name,
            description: server.description.filter(|d| !d.is_empty()),
            datacenter_id: server.datacenter_id,
            operating_system: server.operating_system.and_then(|os| os.display_name),
            cpu_count: server.cpu.and_then(|cpu| cpu.count),
            memory_gb: server.memory_gb,
            private_ipv4: nic.private_ipv4,
            ipv6: nic.ipv6,
            network_domain_id,
            vlan_id: nic.vlan_id,
            source_image_id: server.source_image_id,
            state: server.state,
            started: server.started,
            deployed: server.deployed,
            create_time: server.create_time,
            disks,
            monitoring_plan: server.monitoring.and_then(|m| m.service_plan),
        }
    }
}

// <action xmlns=".." id=".."/>, shared by the calls that only name a target
#[derive(Serialize)]
struct IdRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: &'a str,
}

#[derive(Serialize)]
struct DeployServerRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    name: &'a str,
    description: &'a str,
    #[serde(rename = "imageId")]
    image_id: &'a str,
    start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpu: Option<CpuRequest>,
    #[serde(rename = "memoryGb", skip_serializing_if = "Option::is_none")]
    memory_gb: Option<u32>,
    #[serde(rename = "administratorPassword")]
    administrator_password: &'a str,
    #[serde(rename = "networkInfo", skip_serializing_if = "Option::is_none")]
    network_info: Option<NetworkInfoRequest<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    network: Option<LegacyNetworkRequest<'a>>,
}

#[derive(Serialize)]
struct CpuRequest {
    #[serde(rename = "@count")]
    count: u32,
}

#[derive(Serialize)]
struct NetworkInfoRequest<'a> {
    #[serde(rename = "@networkDomainId")]
    network_domain_id: &'a str,
    #[serde(rename = "primaryNic")]
    primary_nic: PrimaryNicRequest<'a>,
}

#[derive(Serialize)]
struct PrimaryNicRequest<'a> {
    #[serde(rename = "vlanId")]
    vlan_id: &'a str,
}

#[derive(Serialize)]
struct LegacyNetworkRequest<'a> {
    #[serde(rename = "networkId")]
    network_id: &'a str,
}

#[derive(Serialize)]
struct ReconfigureServerRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: &'a str,
    #[serde(rename = "memoryGb", skip_serializing_if = "Option::is_none")]
    memory_gb: Option<u32>,
    #[serde(rename = "cpuCount", skip_serializing_if = "Option::is_none")]
    cpu_count: Option<u32>,
}

#[derive(Serialize)]
struct AddDiskRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: &'a str,
    #[serde(rename = "sizeGb")]
    size_gb: u32,
    speed: &'a str,
}

#[derive(Serialize)]
struct ChangeDiskSpeedRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: &'a str,
    speed: &'a str,
}

#[derive(Serialize)]
struct ExpandDiskRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: &'a str,
    #[serde(rename = "newSizeGb")]
    new_size_gb: u32,
}

#[derive(Serialize)]
struct MonitoringRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: &'a str,
    #[serde(rename = "servicePlan")]
    service_plan: &'a str,
}

#[derive(Serialize)]
struct ApplyTagsRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "assetType")]
    asset_type: &'a str,
    #[serde(rename = "assetId")]
    asset_id: &'a str,
    tag: TagRequest<'a>,
}

#[derive(Serialize)]
struct TagRequest<'a> {
    #[serde(rename = "tagKeyName")]
    tag_key_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
}

#[derive(Serialize)]
struct RemoveTagsRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "assetType")]
    asset_type: &'a str,
    #[serde(rename = "assetId")]
    asset_id: &'a str,
    #[serde(rename = "tagKeyName")]
    tag_key_name: &'a str,
}

fn deploy_request(spec: &NodeSpec) -> DeployServerRequest<'_> {
    let (network_info, network) = match &spec.network {
        NodeNetwork::Domain {
            network_domain_id,
            vlan_id,
        } => (
            Some(NetworkInfoRequest {
                network_domain_id,
                primary_nic: PrimaryNicRequest { vlan_id },
            }),
            None,
        ),
        NodeNetwork::Legacy { network_id } => (None, Some(LegacyNetworkRequest { network_id })),
    };

    DeployServerRequest {
        xmlns: TYPES_NAMESPACE,
        name: &spec.name,
        description: &spec.description,
        image_id: &spec.image_id,
        start: spec.start,
        cpu: spec.cpu_count.map(|count| CpuRequest { count }),
        memory_gb: spec.memory_gb,
        administrator_password: &spec.administrator_password,
        network_info,
        network,
    }
}

pub struct DimensionDataNodeDriver {
    connection: Arc<Connection>,
}

impl DimensionDataNodeDriver {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    /// POST `<action id="...">` and report whether the API accepted it.
    async fn server_action(&self, action: &str, id: &str) -> ProviderResult<bool> {
        let body = IdRequest {
            xmlns: TYPES_NAMESPACE,
            id,
        };
        self.post(&format!("server/{}", action), action, &body)
            .await
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        root: &str,
        body: &B,
    ) -> ProviderResult<bool> {
        let status = self.connection.post_v2(path, root, body).await?;
        debug!("{} -> {} {}", path, status.code, status.message);
        Ok(status.is_success())
    }
}

#[async_trait]
impl NodeDriver for DimensionDataNodeDriver {
    async fn list_nodes(&self, filter: &NodeFilter) -> ProviderResult<Vec<Node>> {
        let mut nodes = vec![];
        let mut page_number = 1;

        loop {
            let mut query = filter.query_pairs();
            query.push(("pageSize", PAGE_SIZE.to_string()));
            query.push(("pageNumber", page_number.to_string()));

            let page: ServersXml = self.connection.get_v2("server/server", &query).await?;
            let more = page.has_more(nodes.len() + page.servers.len());
            nodes.extend(page.servers.into_iter().map(Node::from));

            if !more {
                break;
            }
            page_number += 1;
        }

        Ok(nodes)
    }

    async fn get_node(&self, server_id: &str) -> ProviderResult<Option<Node>> {
        match self
            .connection
            .get_v2::<ServerXml>(&format!("server/server/{}", server_id), &[])
            .await
        {
            Ok(server) => Ok(Some(server.into())),
            Err(e) if e.code() == Some("RESOURCE_NOT_FOUND") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_node(&self, spec: &NodeSpec) -> ProviderResult<String> {
        let status = self
            .connection
            .post_v2("server/deployServer", "deployServer", &deploy_request(spec))
            .await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                code: status.code,
                message: status.message,
            });
        }

        status
            .info("serverId")
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Parse("deployServer returned no serverId".to_string()))
    }

    async fn destroy_node(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("deleteServer", server_id).await
    }

    async fn reboot_node(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("rebootServer", server_id).await
    }

    async fn reset_node(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("resetServer", server_id).await
    }

    async fn shutdown_graceful(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("shutdownServer", server_id).await
    }

    async fn power_off(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("powerOffServer", server_id).await
    }

    async fn start_node(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("startServer", server_id).await
    }

    async fn reconfigure_node(
        &self,
        server_id: &str,
        memory_gb: Option<u32>,
        cpu_count: Option<u32>,
    ) -> ProviderResult<bool> {
        let body = ReconfigureServerRequest {
            xmlns: TYPES_NAMESPACE,
            id: server_id,
            memory_gb,
            cpu_count,
        };
        self.post("server/reconfigureServer", "reconfigureServer", &body)
            .await
    }

    async fn add_disk(&self, server_id: &str, size_gb: u32, speed: &str) -> ProviderResult<bool> {
        let body = AddDiskRequest {
            xmlns: TYPES_NAMESPACE,
            id: server_id,
            size_gb,
            speed,
        };
        self.post("server/addDisk", "addDisk", &body).await
    }

    async fn remove_disk(&self, disk_id: &str) -> ProviderResult<bool> {
        self.server_action("removeDisk", disk_id).await
    }

    async fn change_disk_speed(&self, disk_id: &str, speed: &str) -> ProviderResult<bool> {
        let body = ChangeDiskSpeedRequest {
            xmlns: TYPES_NAMESPACE,
            id: disk_id,
            speed,
        };
        self.post("server/changeDiskSpeed", "changeDiskSpeed", &body)
            .await
    }

    async fn expand_disk(&self, disk_id: &str, size_gb: u32) -> ProviderResult<bool> {
        let body = ExpandDiskRequest {
            xmlns: TYPES_NAMESPACE,
            id: disk_id,
            new_size_gb: size_gb,
        };
        self.post("server/expandDisk", "expandDisk", &body).await
    }

    async fn enable_monitoring(&self, server_id: &str, plan: &str) -> ProviderResult<bool> {
        let body = MonitoringRequest {
            xmlns: TYPES_NAMESPACE,
            id: server_id,
            service_plan: plan,
        };
        self.post(
            "server/enableServerMonitoring",
            "enableServerMonitoring",
            &body,
        )
        .await
    }

    async fn update_monitoring(&self, server_id: &str, plan: &str) -> ProviderResult<bool> {
        let body = MonitoringRequest {
            xmlns: TYPES_NAMESPACE,
            id: server_id,
            service_plan: plan,
        };
        self.post(
            "server/changeServerMonitoringPlan",
            "changeServerMonitoringPlan",
            &body,
        )
        .await
    }

    async fn disable_monitoring(&self, server_id: &str) -> ProviderResult<bool> {
        self.server_action("disableServerMonitoring", server_id).await
    }

    async fn apply_tag(
        &self,
        server_id: &str,
        key: &str,
        value: Option<&str>,
    ) -> ProviderResult<bool> {
        let body = ApplyTagsRequest {
            xmlns: TYPES_NAMESPACE,
            asset_type: "SERVER",
            asset_id: server_id,
            tag: TagRequest {
                tag_key_name: key,
                value,
            },
        };
        self.post("tag/applyTags", "applyTags", &body).await
    }

    async fn remove_tag(&self, server_id: &str, key: &str) -> ProviderResult<bool> {
        let body = RemoveTagsRequest {
            xmlns: TYPES_NAMESPACE,
            asset_type: "SERVER",
            asset_id: server_id,
            tag_key_name: key,
        };
        self.post("tag/removeTags", "removeTags", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = r#"
        <server xmlns="urn:didata.com:api:cloud:types" id="8aeff10c-c918-4021-b2ce-93e4a209418b" datacenterId="NA9">
            <name>didata_cli_test</name>
            <description>fakedescription</description>
            <operatingSystem id="UBUNTU1464" displayName="UBUNTU14/64" family="UNIX"/>
            <cpu count="2" speed="STANDARD" coresPerSocket="1"/>
            <memoryGb>4</memoryGb>
            <disk id="c2e1f199-116e-4dbc-9960-68720b832b0a" scsiId="1" sizeGb="50" speed="ECONOMY" state="NORMAL"/>
            <disk id="9dd1f1a4-2a3e-4cc5-a3d1-2f0d8b5c8d11" scsiId="0" sizeGb="10" speed="STANDARD" state="NORMAL"/>
            <networkInfo networkDomainId="b53b2ad4-ca8b-4abd-9140-72d6b137a6b4">
                <primaryNic id="a2c4e1f2" privateIpv4="172.16.2.8" ipv6="2607:f480:111:1575:6c33:7a68:fe31:9b3b" vlanId="f04e4e2c-a52e-45d3-8037-9f1b1e234c05" vlanName="vlan1" state="NORMAL"/>
            </networkInfo>
            <sourceImageId>294cad61-0857-4124-8ff6-45f4e6643646</sourceImageId>
            <createTime>2016-03-14T10:06:49.000Z</createTime>
            <deployed>true</deployed>
            <started>true</started>
            <state>NORMAL</state>
            <monitoring monitoringId="11039" servicePlan="ESSENTIALS" state="NORMAL"/>
        </server>"#;

    fn parse_node(document: &str) -> ProviderResult<Node> {
        xml::from_str::<ServerXml>(document).map(Node::from)
    }

    fn page(page_count: u32, page_size: Option<u32>, total_count: Option<u32>) -> ServersXml {
        ServersXml {
            page_count,
            page_size,
            total_count,
            servers: vec![],
        }
    }

    #[test]
    fn parse_node_reads_2_4_server() {
        let node = parse_node(SERVER).unwrap();

        assert_eq!(node.id, "8aeff10c-c918-4021-b2ce-93e4a209418b");
        assert_eq!(node.datacenter_id.as_deref(), Some("NA9"));
        assert_eq!(node.operating_system.as_deref(), Some("UBUNTU14/64"));
        assert_eq!(node.cpu_count, Some(2));
        assert_eq!(node.memory_gb, Some(4));
        assert_eq!(node.private_ipv4.as_deref(), Some("172.16.2.8"));
        assert!(node.started && node.deployed);
        // sorted by SCSI id
        assert_eq!(node.disks[0].scsi_id, 0);
        assert_eq!(node.disks[1].speed, "ECONOMY");
        assert_eq!(
            node.disk_by_scsi_id(1).map(|d| d.id.as_str()),
            Some("c2e1f199-116e-4dbc-9960-68720b832b0a")
        );
    }

    #[test]
    fn monitoring_plan_is_an_attribute() {
        let node = parse_node(SERVER).unwrap();
        assert_eq!(node.monitoring_plan.as_deref(), Some("ESSENTIALS"));
    }

    #[test]
    fn disks_under_scsi_controller() {
        let node = parse_node(
            r#"<server id="s1">
                <scsiController id="ctrl" busNumber="0">
                    <disk id="d1" scsiId="1" sizeGb="20" speed="STANDARD" state="NORMAL"/>
                    <disk id="d0" scsiId="0" sizeGb="10" speed="STANDARD" state="NORMAL"/>
                </scsiController>
            </server>"#,
        )
        .unwrap();

        assert_eq!(node.disks.len(), 2);
        assert_eq!(node.disks[0].id, "d0");
    }

    #[test]
    fn parse_node_requires_id() {
        assert!(matches!(
            parse_node("<server><name>x</name></server>"),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn page_count_is_servers_on_the_page() {
        // a short page is the last one
        assert!(!page(2, Some(250), Some(2)).has_more(2));
        assert!(!page(0, Some(250), None).has_more(0));
        // a full page asks for the next one
        assert!(page(250, Some(250), None).has_more(250));
        assert!(page(1, Some(1), Some(2)).has_more(1));
        // unless totalCount was reached
        assert!(!page(1, Some(1), Some(2)).has_more(2));
        // pageSize falls back to the requested size
        assert!(!page(100, None, None).has_more(100));
    }

    #[test]
    fn servers_page_attributes() {
        let page: ServersXml = xml::from_str(
            r#"<servers xmlns="urn:didata.com:api:cloud:types" pageNumber="1" pageCount="0" totalCount="0" pageSize="250"/>"#,
        )
        .unwrap();
        assert!(page.servers.is_empty());
        assert_eq!(page.page_size, Some(250));
        assert!(!page.has_more(0));
    }

    #[test]
    fn deploy_request_places_primary_nic() {
        let spec = NodeSpec {
            name: "didata_cli_test".to_string(),
            description: String::new(),
            image_id: "294cad61".to_string(),
            administrator_password: "fakepassword".to_string(),
            network: NodeNetwork::Domain {
                network_domain_id: "nd".to_string(),
                vlan_id: "vlan".to_string(),
            },
            memory_gb: None,
            cpu_count: Some(2),
            start: false,
        };

        let body = xml::to_string("deployServer", &deploy_request(&spec)).unwrap();
        assert!(body.starts_with("<deployServer "));
        assert!(body.contains(r#"networkDomainId="nd""#));
        assert!(body.contains("<vlanId>vlan</vlanId>"));
        assert!(body.contains("<start>false</start>"));
        assert!(body.contains(r#"<cpu count="2"/>"#));
        assert!(!body.contains("memoryGb"));
        assert!(!body.contains("<network>"));
    }

    #[test]
    fn filter_query_only_sends_set_fields() {
        let filter = NodeFilter {
            ipv6: Some("::1".to_string()),
            started: Some(true),
            ..Default::default()
        };
        assert_eq!(
            filter.query_pairs(),
            vec![("ipv6", "::1".to_string()), ("started", "true".to_string())]
        );
        assert!(NodeFilter::default().is_empty());
    }
}
