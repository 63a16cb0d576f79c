/// Rendering of result records as plain text, JSON or YAML.
use std::str::FromStr;

use anyhow::Result;
use clap::ValueEnum;
use serde_json::{Map, Value};

use crate::{
    error::CliError,
    provider::{
        BackupClient, BackupClientType, BackupDetails, BackupSchedulePolicy, BackupStoragePolicy,
        Disk, Node,
    },
};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputType {
    /// `Key: value` lines
    #[default]
    Pretty,
    Json,
    Yaml,
}

/// Ordered field map of one result object.
pub type Record = Map<String, Value>;

pub trait ToRecord {
    fn to_record(&self) -> Record;
}

/// Parsed `--query` expression, e.g. `ReturnCount:1|ReturnKeys:ID,Name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub return_count: Option<usize>,
    pub return_keys: Option<Vec<String>>,
}

impl FromStr for Query {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut query = Query::default();

        for segment in s.split('|').map(str::trim) {
            let (name, value) = segment
                .split_once(':')
                .map(|(n, v)| (n.trim(), v.trim()))
                .filter(|(_, v)| !v.is_empty())
                .ok_or_else(|| {
                    CliError::usage(format!(
                        "Invalid query segment '{}', expected Name:Value",
                        segment
                    ))
                })?;

            match name {
                "ReturnCount" => {
                    let count = value.parse().map_err(|_| {
                        CliError::usage(format!("ReturnCount must be a number, got '{}'", value))
                    })?;
                    query.return_count = Some(count);
                }
                "ReturnKeys" => {
                    query.return_keys = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|k| !k.is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                other => {
                    return Err(CliError::usage(format!(
                        "Unknown query field '{}', expected ReturnCount or ReturnKeys",
                        other
                    )))
                }
            }
        }

        Ok(query)
    }
}

impl Query {
    fn project(&self, record: Record) -> Record {
        match &self.return_keys {
            Some(keys) => record
                .into_iter()
                .filter(|(k, _)| keys.iter().any(|wanted| wanted == k))
                .collect(),
            None => record,
        }
    }

    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let limit = self.return_count.unwrap_or(usize::MAX);
        records
            .into_iter()
            .take(limit)
            .map(|r| self.project(r))
            .collect()
    }
}

/// Output settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub output_type: OutputType,
    pub query: Option<Query>,
}

impl Renderer {
    pub fn new(output_type: OutputType, query: Option<Query>) -> Self {
        Self { output_type, query }
    }

    /// Render a list; JSON and YAML emit an array.
    pub fn render_list(&self, records: Vec<Record>) -> Result<String> {
        let records = match &self.query {
            Some(query) => query.apply(records),
            None => records,
        };

        match self.output_type {
            OutputType::Pretty => Ok(records
                .iter()
                .map(pretty)
                .collect::<Vec<_>>()
                .join("\n")),
            OutputType::Json => Ok(serde_json::to_string_pretty(&records)?),
            OutputType::Yaml => Ok(serde_yaml::to_string(&records)?),
        }
    }

    /// Render a single object; JSON and YAML emit an object.
    pub fn render_one(&self, record: Record) -> Result<String> {
        let record = match &self.query {
            Some(query) => query.project(record),
            None => record,
        };

        match self.output_type {
            OutputType::Pretty => Ok(pretty(&record)),
            OutputType::Json => Ok(serde_json::to_string_pretty(&record)?),
            OutputType::Yaml => Ok(serde_yaml::to_string(&record)?),
        }
    }
}

fn pretty(record: &Record) -> String {
    let mut out = String::new();
    write_pretty(&mut out, record, 0);
    out
}

fn write_pretty(out: &mut String, record: &Record, indent: usize) {
    let pad = " ".repeat(indent);

    for (key, value) in record.iter() {
        match value {
            Value::Null => {}
            Value::Array(items) if items.is_empty() => {}
            Value::Array(items) => {
                out.push_str(&format!("{}{}:\n", pad, key));
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::Object(object) => {
                            if i > 0 {
                                out.push('\n');
                            }
                            write_pretty(out, object, indent + 2);
                        }
                        other => {
                            out.push_str(&format!("{}  {}\n", pad, scalar(other)));
                        }
                    }
                }
            }
            Value::Object(object) => {
                out.push_str(&format!("{}{}:\n", pad, key));
                write_pretty(out, object, indent + 2);
            }
            other => {
                out.push_str(&format!("{}{}: {}\n", pad, key, scalar(other)));
            }
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn insert(record: &mut Record, key: &str, value: impl Into<Value>) {
    record.insert(key.to_string(), value.into());
}

impl ToRecord for Disk {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "SCSI ID", self.scsi_id);
        insert(&mut record, "ID", self.id.as_str());
        insert(&mut record, "Size GB", self.size_gb);
        insert(&mut record, "Speed", self.speed.as_str());
        insert(&mut record, "State", self.state.as_str());
        record
    }
}

impl ToRecord for Node {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "ID", self.id.as_str());
        insert(&mut record, "Name", self.name.as_str());
        insert(&mut record, "Description", self.description.clone());
        insert(&mut record, "Operating System", self.operating_system.clone());
        insert(&mut record, "Datacenter", self.datacenter_id.clone());
        insert(&mut record, "Private IPv4", self.private_ipv4.clone());
        insert(&mut record, "Private IPv6", self.ipv6.clone());
        insert(&mut record, "CPU Count", self.cpu_count);
        insert(&mut record, "Memory GB", self.memory_gb);
        insert(&mut record, "Network Domain", self.network_domain_id.clone());
        insert(&mut record, "VLAN", self.vlan_id.clone());
        insert(&mut record, "Source Image", self.source_image_id.clone());
        insert(&mut record, "State", self.state.as_str());
        insert(&mut record, "Started", self.started);
        insert(&mut record, "Deployed", self.deployed);
        insert(&mut record, "Create Time", self.create_time.clone());
        insert(&mut record, "Monitoring Plan", self.monitoring_plan.clone());
        insert(
            &mut record,
            "Disks",
            self.disks
                .iter()
                .map(|d| Value::Object(d.to_record()))
                .collect::<Vec<_>>(),
        );
        record
    }
}

impl ToRecord for BackupClient {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "ID", self.id.as_str());
        insert(&mut record, "Type", self.client_type.as_str());
        insert(&mut record, "Description", self.description.clone());
        insert(&mut record, "Schedule", self.schedule_policy.clone());
        insert(&mut record, "Retention", self.storage_policy.clone());
        insert(&mut record, "DownloadURL", self.download_url.clone());
        if let Some(job) = &self.running_job {
            let mut running = Record::new();
            insert(&mut running, "ID", job.id.as_str());
            insert(&mut running, "Status", job.status.as_str());
            insert(&mut running, "Percentage Complete", job.percentage);
            insert(&mut record, "Running Job", Value::Object(running));
        }
        record
    }
}

impl ToRecord for BackupDetails {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "Asset ID", self.asset_id.as_str());
        insert(&mut record, "Service Plan", self.service_plan.as_str());
        insert(&mut record, "State", self.state.as_str());
        insert(
            &mut record,
            "Clients",
            self.clients
                .iter()
                .map(|c| Value::Object(c.to_record()))
                .collect::<Vec<_>>(),
        );
        record
    }
}

impl ToRecord for BackupClientType {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "Type", self.client_type.as_str());
        insert(&mut record, "Is File System", self.is_file_system);
        insert(&mut record, "Description", self.description.as_str());
        record
    }
}

impl ToRecord for BackupStoragePolicy {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "Name", self.name.as_str());
        insert(&mut record, "Retention Days", self.retention_period_days);
        insert(&mut record, "Secondary Location", self.secondary_location.clone());
        record
    }
}

impl ToRecord for BackupSchedulePolicy {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        insert(&mut record, "Name", self.name.as_str());
        insert(&mut record, "Description", self.description.as_str());
        record
    }
}
