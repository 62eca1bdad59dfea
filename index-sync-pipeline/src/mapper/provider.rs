use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::Serialize;

use super::build;
use crate::errors::MappingError;
use index_sync_shared::{EntityKind, SearchDocument};
use index_sync_store::ProviderRecord;

/// Connection details only; key material references stay out of the index.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderDocument<'a> {
    id: &'a str,
    protocol: &'a str,
    host: &'a str,
    port: Option<i32>,
    global_connection_limit: Option<i32>,
    certificate_uri: Option<&'a str>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

pub(super) fn to_document(record: &ProviderRecord) -> Result<SearchDocument, MappingError> {
    let document = ProviderDocument {
        id: &record.name,
        protocol: &record.protocol,
        host: &record.host,
        port: record.port,
        global_connection_limit: record.global_connection_limit,
        certificate_uri: record.certificate_uri.as_deref(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    };

    build(EntityKind::Provider, record.name.clone(), &document)
}
