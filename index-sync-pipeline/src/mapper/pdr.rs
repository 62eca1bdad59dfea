use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::Serialize;
use serde_json::Value;

use super::{build, RelatedRecords};
use crate::config::RelationPolicy;
use crate::errors::MappingError;
use index_sync_shared::{EntityKind, SearchDocument};
use index_sync_store::PdrRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PdrDocument<'a> {
    pdr_name: &'a str,
    collection_id: Option<String>,
    provider: Option<&'a str>,
    execution: Option<&'a str>,
    status: &'a str,
    progress: Option<f64>,
    #[serde(rename = "PANSent")]
    pan_sent: Option<bool>,
    #[serde(rename = "PANmessage")]
    pan_message: Option<&'a str>,
    stats: Option<&'a Value>,
    address: Option<&'a str>,
    original_url: Option<&'a str>,
    duration: Option<f64>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

pub(super) fn to_document(
    record: &PdrRecord,
    related: &RelatedRecords,
    policy: RelationPolicy,
) -> Result<SearchDocument, MappingError> {
    let kind = EntityKind::Pdr;
    let key = record.name.as_str();

    let collection = related.collection.require(policy, kind, key, EntityKind::Collection)?;
    let provider = related.provider.require(policy, kind, key, EntityKind::Provider)?;
    let execution = related.execution.require(policy, kind, key, EntityKind::Execution)?;

    let document = PdrDocument {
        pdr_name: key,
        collection_id: collection.map(|c| c.collection_id()),
        provider: provider.map(|p| p.name.as_str()),
        execution: execution.map(|e| e.arn.as_str()),
        status: &record.status,
        progress: record.progress,
        pan_sent: record.pan_sent,
        pan_message: record.pan_message.as_deref(),
        stats: record.stats.as_ref(),
        address: record.address.as_deref(),
        original_url: record.original_url.as_deref(),
        duration: record.duration,
        created_at: record.created_at,
        updated_at: record.updated_at,
        timestamp: record.timestamp,
    };

    build(kind, record.name.clone(), &document)
}
