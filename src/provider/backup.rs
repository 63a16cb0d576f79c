/// Cloud backup operations against the 0.9 API.
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    connection::{Connection, ResponseStatus},
    xml::BACKUP_NAMESPACE,
    BackupClient, BackupClientSpec, BackupClientType, BackupDetails, BackupDriver, BackupJob,
    BackupSchedulePolicy, BackupStoragePolicy, ProviderError, ProviderResult,
};

#[derive(Debug, Deserialize)]
struct BackupDetailsXml {
    #[serde(rename = "@assetId", default)]
    asset_id: String,
    #[serde(rename = "@servicePlan")]
    service_plan: String,
    #[serde(rename = "@state", default)]
    state: String,
    #[serde(rename = "backupClient", default)]
    clients: Vec<BackupClientXml>,
}

#[derive(Debug, Deserialize)]
struct BackupClientXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type", default)]
    client_type: String,
    description: Option<String>,
    #[serde(rename = "schedulePolicyName")]
    schedule_policy: Option<String>,
    #[serde(rename = "storagePolicyName")]
    storage_policy: Option<String>,
    #[serde(rename = "downloadUrl")]
    download_url: Option<String>,
    #[serde(rename = "runningJob")]
    running_job: Option<RunningJobXml>,
}

#[derive(Debug, Deserialize)]
struct RunningJobXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "@status", default)]
    status: String,
    #[serde(rename = "@percentageComplete")]
    percentage_complete: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ClientTypesXml {
    #[serde(rename = "backupClientType", default)]
    types: Vec<ClientTypeXml>,
}

#[derive(Debug, Deserialize)]
struct ClientTypeXml {
    #[serde(rename = "@type")]
    client_type: String,
    #[serde(rename = "@isFileSystem", default)]
    is_file_system: bool,
    #[serde(rename = "@description", default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct StoragePoliciesXml {
    #[serde(rename = "storagePolicy", default)]
    policies: Vec<StoragePolicyXml>,
}

#[derive(Debug, Deserialize)]
struct StoragePolicyXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@retentionPeriodInDays")]
    retention_period_days: Option<u32>,
    #[serde(rename = "@secondaryLocation")]
    secondary_location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchedulePoliciesXml {
    #[serde(rename = "schedulePolicy", default)]
    policies: Vec<SchedulePolicyXml>,
}

#[derive(Debug, Deserialize)]
struct SchedulePolicyXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@description", default)]
    description: String,
}

#[derive(Serialize)]
struct NewBackupRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@servicePlan")]
    service_plan: &'a str,
}

#[derive(Serialize)]
struct AddBackupClientRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@type")]
    client_type: &'a str,
    #[serde(rename = "storagePolicyName")]
    storage_policy: &'a str,
    #[serde(rename = "schedulePolicyName")]
    schedule_policy: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerting: Option<AlertingRequest<'a>>,
}

#[derive(Serialize)]
struct AlertingRequest<'a> {
    #[serde(rename = "@trigger")]
    trigger: &'a str,
    #[serde(rename = "emailAddress", skip_serializing_if = "Option::is_none")]
    email_address: Option<&'a str>,
}

impl From<BackupClientXml> for BackupClient {
    fn from(client: BackupClientXml) -> Self {
        BackupClient {
            id: client.id,
            client_type: client.client_type,
            description: client.description,
            schedule_policy: client.schedule_policy,
            storage_policy: client.storage_policy,
            download_url: client.download_url,
            running_job: client.running_job.map(|job| BackupJob {
                id: job.id,
                status: job.status,
                percentage: job.percentage_complete,
            }),
        }
    }
}

impl From<BackupDetailsXml> for BackupDetails {
    fn from(details: BackupDetailsXml) -> Self {
        BackupDetails {
            asset_id: details.asset_id,
            service_plan: details.service_plan,
            state: details.state,
            clients: details.clients.into_iter().map(BackupClient::from).collect(),
        }
    }
}

fn add_client_request(spec: &BackupClientSpec) -> AddBackupClientRequest<'_> {
    AddBackupClientRequest {
        xmlns: BACKUP_NAMESPACE,
        client_type: &spec.client_type,
        storage_policy: &spec.storage_policy,
        schedule_policy: &spec.schedule_policy,
        alerting: spec.trigger_on.as_deref().map(|trigger| AlertingRequest {
            trigger,
            email_address: spec.notify_email.as_deref(),
        }),
    }
}

fn require_success(status: ResponseStatus) -> ProviderResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ProviderError::Api {
            code: status.code,
            message: status.message,
        })
    }
}

pub struct DimensionDataBackupDriver {
    connection: Arc<Connection>,
}

impl DimensionDataBackupDriver {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    /// POST a `?disable` call and report whether it was accepted.
    async fn post_flag(&self, path: &str) -> ProviderResult<bool> {
        let status = self.connection.post_v1_empty(path).await?;
        debug!("{} -> {} {}", path, status.code, status.message);
        Ok(status.is_success())
    }
}

#[async_trait]
impl BackupDriver for DimensionDataBackupDriver {
    async fn enable_backup(&self, server_id: &str, service_plan: &str) -> ProviderResult<()> {
        let body = NewBackupRequest {
            xmlns: BACKUP_NAMESPACE,
            service_plan,
        };
        let status = self
            .connection
            .post_v1(&format!("server/{}/backup", server_id), "NewBackup", &body)
            .await?;
        require_success(status)
    }

    async fn disable_backup(&self, server_id: &str) -> ProviderResult<bool> {
        self.post_flag(&format!("server/{}/backup?disable", server_id))
            .await
    }

    async fn backup_details(&self, server_id: &str) -> ProviderResult<BackupDetails> {
        let details: BackupDetailsXml = self
            .connection
            .get_v1(&format!("server/{}/backup", server_id))
            .await?;
        Ok(details.into())
    }

    async fn add_client(&self, server_id: &str, spec: &BackupClientSpec) -> ProviderResult<()> {
        let status = self
            .connection
            .post_v1(
                &format!("server/{}/backup/client", server_id),
                "AddBackupClient",
                &add_client_request(spec),
            )
            .await?;
        require_success(status)
    }

    async fn remove_client(&self, server_id: &str, client_id: &str) -> ProviderResult<bool> {
        self.post_flag(&format!(
            "server/{}/backup/client/{}?disable",
            server_id, client_id
        ))
        .await
    }

    async fn list_client_types(&self, server_id: &str) -> ProviderResult<Vec<BackupClientType>> {
        let listing: ClientTypesXml = self
            .connection
            .get_v1(&format!("server/{}/backup/client/type", server_id))
            .await?;

        Ok(listing
            .types
            .into_iter()
            .map(|t| BackupClientType {
                client_type: t.client_type,
                is_file_system: t.is_file_system,
                description: t.description,
            })
            .collect())
    }

    async fn list_storage_policies(
        &self,
        server_id: &str,
    ) -> ProviderResult<Vec<BackupStoragePolicy>> {
        let listing: StoragePoliciesXml = self
            .connection
            .get_v1(&format!("server/{}/backup/client/storagePolicy", server_id))
            .await?;

        Ok(listing
            .policies
            .into_iter()
            .map(|p| BackupStoragePolicy {
                name: p.name,
                retention_period_days: p.retention_period_days,
                secondary_location: p.secondary_location,
            })
            .collect())
    }

    async fn list_schedule_policies(
        &self,
        server_id: &str,
    ) -> ProviderResult<Vec<BackupSchedulePolicy>> {
        let listing: SchedulePoliciesXml = self
            .connection
            .get_v1(&format!("server/{}/backup/client/schedulePolicy", server_id))
            .await?;

        Ok(listing
            .policies
            .into_iter()
            .map(|p| BackupSchedulePolicy {
                name: p.name,
                description: p.description,
            })
            .collect())
    }
}
