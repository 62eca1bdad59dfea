//! Record builders shared by the unit tests of this crate.

use chrono::{TimeZone, Utc};
use serde_json::json;

use index_sync_store::{
    CollectionRecord, ExecutionRecord, FileRecord, GranuleRecord, PdrRecord, ProviderRecord,
    ReconciliationReportRecord, RuleRecord,
};

fn epoch() -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

pub fn collection(cumulus_id: i64, name: &str, version: &str) -> CollectionRecord {
    CollectionRecord {
        cumulus_id,
        name: name.to_string(),
        version: version.to_string(),
        sample_file_name: format!("{}.A2017025.h21v00.006.2017034065104.hdf", name),
        granule_id_validation_regex: "^MOD09GQ\\.A[\\d]{7}\\.[\\S]{6}\\.006\\.[\\d]{13}$".to_string(),
        granule_id_extraction_regex: "(MOD09GQ\\..*)(\\.hdf|\\.cmr|_ndvi\\.jpg)".to_string(),
        files: json!([{ "bucket": "protected", "regex": "^.*\\.hdf$" }]),
        process: None,
        url_path: None,
        duplicate_handling: Some("replace".to_string()),
        report_to_ems: None,
        ignore_files_config_for_discovery: None,
        meta: None,
        tags: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn execution(cumulus_id: i64, name: &str, collection_cumulus_id: Option<i64>) -> ExecutionRecord {
    ExecutionRecord {
        cumulus_id,
        arn: format!("arn:aws:states:us-east-1:000000000000:execution:IngestGranule:{}", name),
        status: "completed".to_string(),
        collection_cumulus_id,
        parent_cumulus_id: None,
        url: None,
        workflow_name: Some("IngestGranule".to_string()),
        cumulus_version: None,
        duration: Some(12.5),
        tasks: None,
        error: None,
        original_payload: None,
        final_payload: None,
        timestamp: Some(epoch()),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn granule(cumulus_id: i64, granule_id: &str, collection_cumulus_id: i64) -> GranuleRecord {
    GranuleRecord {
        cumulus_id,
        granule_id: granule_id.to_string(),
        status: "completed".to_string(),
        collection_cumulus_id,
        provider_cumulus_id: None,
        pdr_cumulus_id: None,
        published: Some(false),
        duration: None,
        time_to_archive: None,
        time_to_process: Some(3.5),
        product_volume: Some(1024),
        error: None,
        cmr_link: None,
        beginning_date_time: None,
        ending_date_time: None,
        production_date_time: None,
        last_update_date_time: None,
        timestamp: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn file(cumulus_id: i64, granule_cumulus_id: i64, key: &str) -> FileRecord {
    FileRecord {
        cumulus_id,
        granule_cumulus_id,
        bucket: "protected".to_string(),
        key: key.to_string(),
        file_name: key.rsplit('/').next().map(str::to_string),
        file_size: Some(2048),
        checksum_type: Some("md5".to_string()),
        checksum_value: Some("bogus".to_string()),
        source: None,
        path: None,
        file_type: Some("data".to_string()),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn provider(cumulus_id: i64, name: &str) -> ProviderRecord {
    ProviderRecord {
        cumulus_id,
        name: name.to_string(),
        protocol: "s3".to_string(),
        host: "provider-bucket".to_string(),
        port: None,
        global_connection_limit: Some(10),
        certificate_uri: None,
        cm_key_id: Some("alias/provider-key".to_string()),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn pdr(cumulus_id: i64, name: &str, collection_cumulus_id: i64, provider_cumulus_id: i64) -> PdrRecord {
    PdrRecord {
        cumulus_id,
        name: name.to_string(),
        status: "running".to_string(),
        collection_cumulus_id,
        provider_cumulus_id,
        execution_cumulus_id: None,
        progress: Some(50.0),
        pan_sent: Some(false),
        pan_message: None,
        stats: Some(json!({ "processing": 1, "completed": 1 })),
        address: None,
        original_url: None,
        duration: None,
        timestamp: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn rule(
    cumulus_id: i64,
    name: &str,
    collection_cumulus_id: Option<i64>,
    provider_cumulus_id: Option<i64>,
) -> RuleRecord {
    RuleRecord {
        cumulus_id,
        name: name.to_string(),
        workflow: "DiscoverGranules".to_string(),
        collection_cumulus_id,
        provider_cumulus_id,
        rule_type: "scheduled".to_string(),
        enabled: true,
        value: Some("rate(1 day)".to_string()),
        arn: None,
        log_event_arn: None,
        execution_name_prefix: None,
        queue_url: None,
        payload: None,
        meta: None,
        tags: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn report(name: &str) -> ReconciliationReportRecord {
    ReconciliationReportRecord {
        name: name.to_string(),
        report_type: "Inventory".to_string(),
        status: "Generated".to_string(),
        location: Some(format!("s3://reports/{}.json", name)),
        error: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}
