//! Table bindings for the relational record types.
//!
//! Select lists cast identity and numeric columns to the widths the row
//! types decode, so `integer` and `bigint` identities read the same way.

use super::model::PgRecord;
use crate::records::{
    CollectionRecord, ExecutionRecord, FileRecord, GranuleRecord, PdrRecord, ProviderRecord,
    RuleRecord,
};

macro_rules! impl_pg_record {
    ($record:ty, $table:literal, $columns:expr) => {
        impl PgRecord for $record {
            const TABLE: &'static str = $table;
            const COLUMNS: &'static str = $columns;

            fn cumulus_id(&self) -> i64 {
                self.cumulus_id
            }
        }
    };
}

impl_pg_record!(
    CollectionRecord,
    "collections",
    "cumulus_id::bigint AS cumulus_id, name, version, sample_file_name, \
     granule_id_validation_regex, granule_id_extraction_regex, files, process, url_path, \
     duplicate_handling, report_to_ems, ignore_files_config_for_discovery, meta, tags, \
     created_at, updated_at"
);

impl_pg_record!(
    ExecutionRecord,
    "executions",
    "cumulus_id::bigint AS cumulus_id, arn, status, \
     collection_cumulus_id::bigint AS collection_cumulus_id, \
     parent_cumulus_id::bigint AS parent_cumulus_id, url, workflow_name, cumulus_version, \
     duration::float8 AS duration, tasks, error, original_payload, final_payload, timestamp, \
     created_at, updated_at"
);

impl_pg_record!(
    GranuleRecord,
    "granules",
    "cumulus_id::bigint AS cumulus_id, granule_id, status, \
     collection_cumulus_id::bigint AS collection_cumulus_id, \
     provider_cumulus_id::bigint AS provider_cumulus_id, \
     pdr_cumulus_id::bigint AS pdr_cumulus_id, published, duration::float8 AS duration, \
     time_to_archive::float8 AS time_to_archive, time_to_process::float8 AS time_to_process, \
     product_volume::bigint AS product_volume, error, cmr_link, beginning_date_time, \
     ending_date_time, production_date_time, last_update_date_time, timestamp, \
     created_at, updated_at"
);

impl_pg_record!(
    FileRecord,
    "files",
    "cumulus_id::bigint AS cumulus_id, granule_cumulus_id::bigint AS granule_cumulus_id, \
     bucket, key, file_name, file_size::bigint AS file_size, checksum_type, checksum_value, \
     source, path, \"type\", created_at, updated_at"
);

impl_pg_record!(
    ProviderRecord,
    "providers",
    "cumulus_id::bigint AS cumulus_id, name, protocol, host, port::int4 AS port, \
     global_connection_limit::int4 AS global_connection_limit, certificate_uri, cm_key_id, \
     created_at, updated_at"
);

impl_pg_record!(
    PdrRecord,
    "pdrs",
    "cumulus_id::bigint AS cumulus_id, name, status, \
     collection_cumulus_id::bigint AS collection_cumulus_id, \
     provider_cumulus_id::bigint AS provider_cumulus_id, \
     execution_cumulus_id::bigint AS execution_cumulus_id, progress::float8 AS progress, \
     pan_sent, pan_message, stats, address, original_url, duration::float8 AS duration, \
     timestamp, created_at, updated_at"
);

impl_pg_record!(
    RuleRecord,
    "rules",
    "cumulus_id::bigint AS cumulus_id, name, workflow, \
     collection_cumulus_id::bigint AS collection_cumulus_id, \
     provider_cumulus_id::bigint AS provider_cumulus_id, \"type\", enabled, value, arn, \
     log_event_arn, execution_name_prefix, queue_url, payload, meta, tags, \
     created_at, updated_at"
);
