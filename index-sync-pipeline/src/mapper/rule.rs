use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{build, RelatedRecords};
use crate::config::RelationPolicy;
use crate::errors::MappingError;
use index_sync_shared::{EntityKind, SearchDocument};
use index_sync_store::RuleRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleDefinition<'a> {
    #[serde(rename = "type")]
    rule_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arn: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_event_arn: Option<&'a str>,
}

#[derive(Serialize)]
struct CollectionRef<'a> {
    name: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleDocument<'a> {
    name: &'a str,
    workflow: &'a str,
    state: &'static str,
    rule: RuleDefinition<'a>,
    collection: Option<CollectionRef<'a>>,
    provider: Option<&'a str>,
    execution_name_prefix: Option<&'a str>,
    queue_url: Option<&'a str>,
    payload: Option<&'a Value>,
    meta: Option<&'a Value>,
    tags: Option<&'a Value>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

pub(super) fn to_document(
    record: &RuleRecord,
    related: &RelatedRecords,
    policy: RelationPolicy,
) -> Result<SearchDocument, MappingError> {
    let kind = EntityKind::Rule;
    let key = record.name.as_str();

    let collection = related.collection.require(policy, kind, key, EntityKind::Collection)?;
    let provider = related.provider.require(policy, kind, key, EntityKind::Provider)?;

    let document = RuleDocument {
        name: key,
        workflow: &record.workflow,
        state: if record.enabled { "ENABLED" } else { "DISABLED" },
        rule: RuleDefinition {
            rule_type: &record.rule_type,
            value: record.value.as_deref(),
            arn: record.arn.as_deref(),
            log_event_arn: record.log_event_arn.as_deref(),
        },
        collection: collection.map(|c| CollectionRef {
            name: &c.name,
            version: &c.version,
        }),
        provider: provider.map(|p| p.name.as_str()),
        execution_name_prefix: record.execution_name_prefix.as_deref(),
        queue_url: record.queue_url.as_deref(),
        payload: record.payload.as_ref(),
        meta: record.meta.as_ref(),
        tags: record.tags.as_ref(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    };

    build(kind, record.name.clone(), &document)
}
