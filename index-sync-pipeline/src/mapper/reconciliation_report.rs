use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::build;
use crate::errors::MappingError;
use index_sync_shared::{EntityKind, SearchDocument};
use index_sync_store::ReconciliationReportRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReconciliationReportDocument<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    report_type: &'a str,
    status: &'a str,
    location: Option<&'a str>,
    error: Option<&'a Value>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

pub(super) fn to_document(record: &ReconciliationReportRecord) -> Result<SearchDocument, MappingError> {
    let document = ReconciliationReportDocument {
        name: &record.name,
        report_type: &record.report_type,
        status: &record.status,
        location: record.location.as_deref(),
        error: record.error.as_ref(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    };

    build(EntityKind::ReconciliationReport, record.name.clone(), &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::fixtures::report;

    #[test]
    fn test_report_document() {
        let document = to_document(&report("inventory-2024")).unwrap();

        assert_eq!(document.document_id(), "reconciliationReport:inventory-2024");
        assert_eq!(document.source["type"], "Inventory");
        assert_eq!(document.source["location"], "s3://reports/inventory-2024.json");
        assert!(document.source.get("error").is_none());
    }
}
