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
use index_sync_store::ExecutionRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionDocument<'a> {
    arn: &'a str,
    name: &'a str,
    status: &'a str,
    workflow_name: Option<&'a str>,
    url: Option<&'a str>,
    duration: Option<f64>,
    error: Option<&'a Value>,
    tasks: Option<&'a Value>,
    collection_id: Option<String>,
    parent_arn: Option<&'a str>,
    cumulus_version: Option<&'a str>,
    original_payload: Option<&'a Value>,
    final_payload: Option<&'a Value>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

pub(super) fn to_document(
    record: &ExecutionRecord,
    related: &RelatedRecords,
    policy: RelationPolicy,
) -> Result<SearchDocument, MappingError> {
    let kind = EntityKind::Execution;
    let collection = related
        .collection
        .require(policy, kind, &record.arn, EntityKind::Collection)?;
    let parent = related
        .parent_execution
        .require(policy, kind, &record.arn, EntityKind::Execution)?;

    let document = ExecutionDocument {
        arn: &record.arn,
        name: record.name(),
        status: &record.status,
        workflow_name: record.workflow_name.as_deref(),
        url: record.url.as_deref(),
        duration: record.duration,
        error: record.error.as_ref(),
        tasks: record.tasks.as_ref(),
        collection_id: collection.map(|c| c.collection_id()),
        parent_arn: parent.map(|p| p.arn.as_str()),
        cumulus_version: record.cumulus_version.as_deref(),
        original_payload: record.original_payload.as_ref(),
        final_payload: record.final_payload.as_ref(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        timestamp: record.timestamp,
    };

    build(kind, record.arn.clone(), &document)
}
