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
use index_sync_store::{FileRecord, GranuleRecord};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileDocument<'a> {
    bucket: &'a str,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    file_type: Option<&'a str>,
}

impl<'a> From<&'a FileRecord> for FileDocument<'a> {
    fn from(file: &'a FileRecord) -> Self {
        Self {
            bucket: &file.bucket,
            key: &file.key,
            file_name: file.file_name.as_deref(),
            size: file.file_size,
            checksum_type: file.checksum_type.as_deref(),
            checksum: file.checksum_value.as_deref(),
            source: file.source.as_deref(),
            file_type: file.file_type.as_deref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GranuleDocument<'a> {
    granule_id: &'a str,
    status: &'a str,
    collection_id: Option<String>,
    published: Option<bool>,
    duration: Option<f64>,
    cmr_link: Option<&'a str>,
    product_volume: Option<i64>,
    time_to_archive: Option<f64>,
    time_to_preprocess: Option<f64>,
    error: Option<&'a Value>,
    provider: Option<&'a str>,
    pdr_name: Option<&'a str>,
    files: Vec<FileDocument<'a>>,
    beginning_date_time: Option<DateTime<Utc>>,
    ending_date_time: Option<DateTime<Utc>>,
    production_date_time: Option<DateTime<Utc>>,
    last_update_date_time: Option<DateTime<Utc>>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

/// Granule documents embed their files and are parented by their collection.
pub(super) fn to_document(
    record: &GranuleRecord,
    related: &RelatedRecords,
    policy: RelationPolicy,
) -> Result<SearchDocument, MappingError> {
    let kind = EntityKind::Granule;
    let key = record.granule_id.as_str();

    let collection_id = related
        .collection
        .require(policy, kind, key, EntityKind::Collection)?
        .map(|c| c.collection_id());
    let provider = related.provider.require(policy, kind, key, EntityKind::Provider)?;
    let pdr = related.pdr.require(policy, kind, key, EntityKind::Pdr)?;

    let document = GranuleDocument {
        granule_id: key,
        status: &record.status,
        collection_id: collection_id.clone(),
        published: record.published,
        duration: record.duration,
        cmr_link: record.cmr_link.as_deref(),
        product_volume: record.product_volume,
        time_to_archive: record.time_to_archive,
        time_to_preprocess: record.time_to_process,
        error: record.error.as_ref(),
        provider: provider.map(|p| p.name.as_str()),
        pdr_name: pdr.map(|p| p.name.as_str()),
        files: related.files.iter().map(FileDocument::from).collect(),
        beginning_date_time: record.beginning_date_time,
        ending_date_time: record.ending_date_time,
        production_date_time: record.production_date_time,
        last_update_date_time: record.last_update_date_time,
        created_at: record.created_at,
        updated_at: record.updated_at,
        timestamp: record.timestamp,
    };

    let document = build(kind, record.granule_id.clone(), &document)?;
    Ok(match collection_id {
        Some(collection_id) => document.with_parent(collection_id),
        None => document,
    })
}

/// Standalone file document, keyed by `{bucket}/{key}`.
pub(super) fn file_to_document(record: &FileRecord) -> Result<SearchDocument, MappingError> {
    build(
        EntityKind::File,
        format!("{}/{}", record.bucket, record.key),
        &FileDocument::from(record),
    )
}
