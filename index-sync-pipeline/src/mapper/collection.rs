use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::build;
use crate::errors::MappingError;
use index_sync_shared::{EntityKind, SearchDocument};
use index_sync_store::CollectionRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionDocument<'a> {
    name: &'a str,
    version: &'a str,
    collection_id: String,
    process: Option<&'a str>,
    url_path: Option<&'a str>,
    duplicate_handling: Option<&'a str>,
    granule_id_validation_regex: &'a str,
    granule_id_extraction_regex: &'a str,
    sample_file_name: &'a str,
    files: &'a Value,
    report_to_ems: Option<bool>,
    ignore_files_config_for_discovery: Option<bool>,
    meta: Option<&'a Value>,
    tags: Option<&'a Value>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

pub(super) fn to_document(record: &CollectionRecord) -> Result<SearchDocument, MappingError> {
    let collection_id = record.collection_id();
    let document = CollectionDocument {
        name: &record.name,
        version: &record.version,
        collection_id: collection_id.clone(),
        process: record.process.as_deref(),
        url_path: record.url_path.as_deref(),
        duplicate_handling: record.duplicate_handling.as_deref(),
        granule_id_validation_regex: &record.granule_id_validation_regex,
        granule_id_extraction_regex: &record.granule_id_extraction_regex,
        sample_file_name: &record.sample_file_name,
        files: &record.files,
        report_to_ems: record.report_to_ems,
        ignore_files_config_for_discovery: record.ignore_files_config_for_discovery,
        meta: record.meta.as_ref(),
        tags: record.tags.as_ref(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    };

    build(EntityKind::Collection, collection_id, &document)
}
