//! Row types for every entity kind held by the record store.
//!
//! Relational rows carry the internal `cumulus_id` identity alongside their
//! natural keys. Reconciliation reports come from a separate document store
//! and are identified by name only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use index_sync_shared::{collection_id, EntityKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CollectionRecord {
    pub cumulus_id: i64,
    pub name: String,
    pub version: String,
    pub sample_file_name: String,
    pub granule_id_validation_regex: String,
    pub granule_id_extraction_regex: String,
    pub files: Value,
    pub process: Option<String>,
    pub url_path: Option<String>,
    pub duplicate_handling: Option<String>,
    pub report_to_ems: Option<bool>,
    pub ignore_files_config_for_discovery: Option<bool>,
    pub meta: Option<Value>,
    pub tags: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRecord {
    /// The `{name}___{version}` identifier of this collection.
    pub fn collection_id(&self) -> String {
        collection_id(&self.name, &self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionRecord {
    pub cumulus_id: i64,
    pub arn: String,
    pub status: String,
    pub collection_cumulus_id: Option<i64>,
    pub parent_cumulus_id: Option<i64>,
    pub url: Option<String>,
    pub workflow_name: Option<String>,
    pub cumulus_version: Option<String>,
    pub duration: Option<f64>,
    pub tasks: Option<Value>,
    pub error: Option<Value>,
    pub original_payload: Option<Value>,
    pub final_payload: Option<Value>,
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// The execution name, which is the last segment of its ARN.
    pub fn name(&self) -> &str {
        self.arn.rsplit(':').next().unwrap_or(&self.arn)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GranuleRecord {
    pub cumulus_id: i64,
    pub granule_id: String,
    pub status: String,
    pub collection_cumulus_id: i64,
    pub provider_cumulus_id: Option<i64>,
    pub pdr_cumulus_id: Option<i64>,
    pub published: Option<bool>,
    pub duration: Option<f64>,
    pub time_to_archive: Option<f64>,
    pub time_to_process: Option<f64>,
    pub product_volume: Option<i64>,
    pub error: Option<Value>,
    pub cmr_link: Option<String>,
    pub beginning_date_time: Option<DateTime<Utc>>,
    pub ending_date_time: Option<DateTime<Utc>>,
    pub production_date_time: Option<DateTime<Utc>>,
    pub last_update_date_time: Option<DateTime<Utc>>,
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub cumulus_id: i64,
    pub granule_cumulus_id: i64,
    pub bucket: String,
    pub key: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub checksum_type: Option<String>,
    pub checksum_value: Option<String>,
    pub source: Option<String>,
    pub path: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProviderRecord {
    pub cumulus_id: i64,
    pub name: String,
    pub protocol: String,
    pub host: String,
    pub port: Option<i32>,
    pub global_connection_limit: Option<i32>,
    pub certificate_uri: Option<String>,
    pub cm_key_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PdrRecord {
    pub cumulus_id: i64,
    pub name: String,
    pub status: String,
    pub collection_cumulus_id: i64,
    pub provider_cumulus_id: i64,
    pub execution_cumulus_id: Option<i64>,
    pub progress: Option<f64>,
    pub pan_sent: Option<bool>,
    pub pan_message: Option<String>,
    pub stats: Option<Value>,
    pub address: Option<String>,
    pub original_url: Option<String>,
    pub duration: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RuleRecord {
    pub cumulus_id: i64,
    pub name: String,
    pub workflow: String,
    pub collection_cumulus_id: Option<i64>,
    pub provider_cumulus_id: Option<i64>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub rule_type: String,
    pub enabled: bool,
    pub value: Option<String>,
    pub arn: Option<String>,
    pub log_event_arn: Option<String>,
    pub execution_name_prefix: Option<String>,
    pub queue_url: Option<String>,
    pub payload: Option<Value>,
    pub meta: Option<Value>,
    pub tags: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reconciliation report as exported from the report document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReportRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A kind-tagged record read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRecord {
    Collection(CollectionRecord),
    Execution(ExecutionRecord),
    Granule(GranuleRecord),
    File(FileRecord),
    Provider(ProviderRecord),
    Pdr(PdrRecord),
    Rule(RuleRecord),
    ReconciliationReport(ReconciliationReportRecord),
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Collection(_) => EntityKind::Collection,
            EntityRecord::Execution(_) => EntityKind::Execution,
            EntityRecord::Granule(_) => EntityKind::Granule,
            EntityRecord::File(_) => EntityKind::File,
            EntityRecord::Provider(_) => EntityKind::Provider,
            EntityRecord::Pdr(_) => EntityKind::Pdr,
            EntityRecord::Rule(_) => EntityKind::Rule,
            EntityRecord::ReconciliationReport(_) => EntityKind::ReconciliationReport,
        }
    }

    /// Internal identity, absent for records outside the relational store.
    pub fn cumulus_id(&self) -> Option<i64> {
        match self {
            EntityRecord::Collection(r) => Some(r.cumulus_id),
            EntityRecord::Execution(r) => Some(r.cumulus_id),
            EntityRecord::Granule(r) => Some(r.cumulus_id),
            EntityRecord::File(r) => Some(r.cumulus_id),
            EntityRecord::Provider(r) => Some(r.cumulus_id),
            EntityRecord::Pdr(r) => Some(r.cumulus_id),
            EntityRecord::Rule(r) => Some(r.cumulus_id),
            EntityRecord::ReconciliationReport(_) => None,
        }
    }

    /// The stable business identifier of the record.
    pub fn natural_key(&self) -> String {
        match self {
            EntityRecord::Collection(r) => r.collection_id(),
            EntityRecord::Execution(r) => r.arn.clone(),
            EntityRecord::Granule(r) => r.granule_id.clone(),
            EntityRecord::File(r) => format!("{}/{}", r.bucket, r.key),
            EntityRecord::Provider(r) => r.name.clone(),
            EntityRecord::Pdr(r) => r.name.clone(),
            EntityRecord::Rule(r) => r.name.clone(),
            EntityRecord::ReconciliationReport(r) => r.name.clone(),
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            EntityRecord::Collection(r) => r.updated_at,
            EntityRecord::Execution(r) => r.updated_at,
            EntityRecord::Granule(r) => r.updated_at,
            EntityRecord::File(r) => r.updated_at,
            EntityRecord::Provider(r) => r.updated_at,
            EntityRecord::Pdr(r) => r.updated_at,
            EntityRecord::Rule(r) => r.updated_at,
            EntityRecord::ReconciliationReport(r) => r.updated_at,
        }
    }
}

macro_rules! impl_from_record {
    ($($record:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$record> for EntityRecord {
                fn from(record: $record) -> Self {
                    EntityRecord::$variant(record)
                }
            }
        )*
    };
}

impl_from_record! {
    CollectionRecord => Collection,
    ExecutionRecord => Execution,
    GranuleRecord => Granule,
    FileRecord => File,
    ProviderRecord => Provider,
    PdrRecord => Pdr,
    RuleRecord => Rule,
    ReconciliationReportRecord => ReconciliationReport,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_natural_keys() {
        let record = EntityRecord::from(collection(1, "MOD09GQ", "006"));
        assert_eq!(record.natural_key(), "MOD09GQ___006");
        assert_eq!(record.kind(), EntityKind::Collection);
        assert_eq!(record.cumulus_id(), Some(1));

        let report = EntityRecord::from(report("inventory-1"));
        assert_eq!(report.natural_key(), "inventory-1");
        assert_eq!(report.cumulus_id(), None);
    }

    #[test]
    fn test_execution_name_from_arn() {
        let now = Utc::now();
        let execution = ExecutionRecord {
            cumulus_id: 1,
            arn: "arn:aws:states:us-east-1:123:execution:Ingest:abc-123".to_string(),
            status: "completed".to_string(),
            collection_cumulus_id: None,
            parent_cumulus_id: None,
            url: None,
            workflow_name: None,
            cumulus_version: None,
            duration: None,
            tasks: None,
            error: None,
            original_payload: None,
            final_payload: None,
            timestamp: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(execution.name(), "abc-123");
    }

    #[test]
    fn test_report_deserializes_camel_case() {
        let report: ReconciliationReportRecord = serde_json::from_str(
            r#"{"name":"r1","type":"Internal","status":"Pending","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(report.report_type, "Internal");
        assert!(report.location.is_none());
    }
}
