use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use crossterm::style::Color;
use log::info;

use crate::{
    cli::common::{self, ServerTargetArgs},
    error::CliError,
    output::{OutputType, Renderer, ToRecord},
    provider::{BackupClientSpec, Provider},
    utils::print_colored,
};

#[derive(Args)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub action: BackupAction,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupServicePlan {
    #[value(name = "Enterprise")]
    Enterprise,
    #[value(name = "Essentials")]
    Essentials,
    #[value(name = "Advanced")]
    Advanced,
}

impl BackupServicePlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupServicePlan::Enterprise => "Enterprise",
            BackupServicePlan::Essentials => "Essentials",
            BackupServicePlan::Advanced => "Advanced",
        }
    }
}

/// When a client sends its job alert.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOn {
    #[value(name = "ON_FAILURE")]
    OnFailure,
    #[value(name = "ON_SUCCESS")]
    OnSuccess,
    #[value(name = "ON_SUCCESS_OR_FAILURE")]
    OnSuccessOrFailure,
}

impl TriggerOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerOn::OnFailure => "ON_FAILURE",
            TriggerOn::OnSuccess => "ON_SUCCESS",
            TriggerOn::OnSuccessOrFailure => "ON_SUCCESS_OR_FAILURE",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddClientArgs {
    #[command(flatten)]
    pub target: ServerTargetArgs,
    /// Client type, see list_client_types
    #[arg(long = "clientType")]
    pub client_type: String,
    /// Storage policy, see list_storage_policies
    #[arg(long = "storagePolicy")]
    pub storage_policy: String,
    /// Schedule policy, see list_schedule_policies
    #[arg(long = "schedulePolicy")]
    pub schedule_policy: String,
    #[arg(long = "triggerOn", value_enum, ignore_case = true)]
    pub trigger_on: Option<TriggerOn>,
    /// Email address for job alerts, requires --triggerOn
    #[arg(long = "notifyEmail", requires = "trigger_on")]
    pub notify_email: Option<String>,
}

impl AddClientArgs {
    fn spec(&self) -> BackupClientSpec {
        BackupClientSpec {
            client_type: self.client_type.clone(),
            storage_policy: self.storage_policy.clone(),
            schedule_policy: self.schedule_policy.clone(),
            trigger_on: self.trigger_on.map(|t| t.as_str().to_string()),
            notify_email: self.notify_email.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub enum BackupAction {
    /// Enable cloud backup on a server
    Enable {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "servicePlan", value_enum, ignore_case = true)]
        service_plan: BackupServicePlan,
    },
    /// Disable cloud backup on a server
    Disable {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Show the backup configuration of a server
    Info {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// Add a backup client to a server
    #[command(alias = "add-client")]
    AddClient(AddClientArgs),
    /// Remove a backup client from a server
    #[command(alias = "remove-client")]
    RemoveClient {
        #[command(flatten)]
        target: ServerTargetArgs,
        #[arg(long = "clientId")]
        client_id: String,
    },
    /// Print the client download URL
    #[command(alias = "download-url")]
    DownloadUrl {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// List the client types available to a server
    #[command(alias = "list-client-types")]
    ListClientTypes {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// List the storage policies available to a server
    #[command(alias = "list-storage-policies")]
    ListStoragePolicies {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
    /// List the schedule policies available to a server
    #[command(alias = "list-schedule-policies")]
    ListSchedulePolicies {
        #[command(flatten)]
        target: ServerTargetArgs,
    },
}

impl BackupCommand {
    pub async fn execute(&self, provider: &Provider, renderer: &Renderer) -> Result<()> {
        let node = provider.node.as_ref();
        let backup = provider.backup.as_ref();

        match &self.action {
            BackupAction::Enable {
                target,
                service_plan,
            } => {
                let id = target.resolve(node).await?;
                backup.enable_backup(&id, service_plan.as_str()).await?;
                print_colored(
                    &format!(
                        "Backups enabled for {}.  Service plan: {}",
                        id,
                        service_plan.as_str()
                    ),
                    Color::Green,
                );
                Ok(())
            }
            BackupAction::Disable { target } => {
                let id = target.resolve(node).await?;
                common::finish(
                    backup.disable_backup(&id).await?,
                    format!("Backups disabled for {}", id),
                    format!("Backups not disabled for {}", id),
                )
            }
            BackupAction::Info { target } => {
                let id = target.resolve(node).await?;
                let details = backup.backup_details(&id).await?;
                if renderer.output_type == OutputType::Pretty {
                    println!("Backup Details for {}", id);
                }
                println!("{}", renderer.render_one(details.to_record())?);
                Ok(())
            }
            BackupAction::AddClient(args) => {
                let id = args.target.resolve(node).await?;
                info!("Adding {} backup client to {}", args.client_type, id);
                backup.add_client(&id, &args.spec()).await?;
                print_colored(
                    &format!("Enabled {} client on {}", args.client_type, id),
                    Color::Green,
                );
                Ok(())
            }
            BackupAction::RemoveClient { target, client_id } => {
                let id = target.resolve(node).await?;
                common::finish(
                    backup.remove_client(&id, client_id).await?,
                    format!("Removed client {} from {}", client_id, id),
                    format!(
                        "Something went wrong attempting to remove client from {}",
                        id
                    ),
                )
            }
            BackupAction::DownloadUrl { target } => {
                let id = target.resolve(node).await?;
                let details = backup.backup_details(&id).await?;
                let client = details.clients.first().ok_or_else(|| {
                    CliError::NotFound(
                        "No clients configured so there is no backup url".to_string(),
                    )
                })?;
                let url = client.download_url.as_deref().ok_or_else(|| {
                    CliError::NotFound(format!("Client {} has no download url", client.id))
                })?;
                println!("{}", url);
                Ok(())
            }
            BackupAction::ListClientTypes { target } => {
                let id = target.resolve(node).await?;
                let types = backup.list_client_types(&id).await?;
                common::print_records(
                    renderer,
                    types.iter().map(ToRecord::to_record).collect(),
                    "No client types found",
                )
            }
            BackupAction::ListStoragePolicies { target } => {
                let id = target.resolve(node).await?;
                let policies = backup.list_storage_policies(&id).await?;
                common::print_records(
                    renderer,
                    policies.iter().map(ToRecord::to_record).collect(),
                    "No storage policies found",
                )
            }
            BackupAction::ListSchedulePolicies { target } => {
                let id = target.resolve(node).await?;
                let policies = backup.list_schedule_policies(&id).await?;
                common::print_records(
                    renderer,
                    policies.iter().map(ToRecord::to_record).collect(),
                    "No schedule policies found",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    use super::*;

    fn parse(args: &[&str]) -> Result<BackupAction, clap::Error> {
        let cli = Cli::try_parse_from(["didata", "backup"].into_iter().chain(args.iter().copied()))?;
        match cli.command {
            Commands::Backup(cmd) => Ok(cmd.action),
            _ => panic!("expected backup command"),
        }
    }

    #[test]
    fn notify_email_requires_trigger() {
        let base = [
            "add_client",
            "--serverId",
            "abc",
            "--clientType",
            "FA.Linux",
            "--storagePolicy",
            "14 Day Storage Policy",
            "--schedulePolicy",
            "12AM - 6AM",
        ];

        let mut without_trigger = base.to_vec();
        without_trigger.extend(["--notifyEmail", "ops@example.com"]);
        assert!(parse(&without_trigger).is_err());

        let mut with_trigger = without_trigger.clone();
        with_trigger.extend(["--triggerOn", "ON_FAILURE"]);
        match parse(&with_trigger).unwrap() {
            BackupAction::AddClient(args) => {
                let spec = args.spec();
                assert_eq!(spec.trigger_on.as_deref(), Some("ON_FAILURE"));
                assert_eq!(spec.notify_email.as_deref(), Some("ops@example.com"));
            }
            _ => panic!("expected add_client"),
        }
    }

    #[test]
    fn enable_requires_service_plan() {
        let err = parse(&["enable", "--serverId", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn service_plan_is_case_insensitive() {
        match parse(&["enable", "--serverId", "abc", "--servicePlan", "advanced"]).unwrap() {
            BackupAction::Enable { service_plan, .. } => {
                assert_eq!(service_plan.as_str(), "Advanced")
            }
            _ => panic!("expected enable"),
        }
    }
}
