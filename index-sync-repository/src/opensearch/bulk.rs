//! Bulk request bodies and per-item response parsing.

use opensearch::http::request::JsonBody;
use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationResult, BatchOperationSummary, DocumentRef};
use index_sync_shared::SearchDocument;

/// Bulk action names as they appear in requests and response items.
pub(crate) const INDEX_ACTION: &str = "index";
pub(crate) const DELETE_ACTION: &str = "delete";

/// Build an NDJSON body of `index` actions. Returns the body with the
/// document ids in request order.
pub(crate) fn upsert_body(
    documents: &[SearchDocument],
) -> Result<(Vec<JsonBody<Value>>, Vec<String>), SearchIndexError> {
    let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
    let mut ids = Vec::with_capacity(documents.len());

    for document in documents {
        let id = document.document_id();
        let source = serde_json::to_value(document)
            .map_err(|e| SearchIndexError::validation(format!("{}: {}", id, e)))?;
        body.push(json!({ INDEX_ACTION: { "_id": id } }).into());
        body.push(source.into());
        ids.push(id);
    }

    Ok((body, ids))
}

/// Build an NDJSON body of `delete` actions.
pub(crate) fn delete_body(documents: &[DocumentRef]) -> (Vec<JsonBody<Value>>, Vec<String>) {
    let ids: Vec<String> = documents.iter().map(DocumentRef::document_id).collect();
    let body = ids
        .iter()
        .map(|id| json!({ DELETE_ACTION: { "_id": id } }).into())
        .collect();
    (body, ids)
}

/// Match each requested id to its item in a bulk response.
///
/// Items come back in request order. An item that is missing, carries an
/// `error`, or has a non-2xx status is a failure, except that deleting a
/// missing document succeeds.
pub(crate) fn summarize(action: &str, ids: &[String], response: &Value) -> BatchOperationSummary {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let results = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let Some(item) = items.get(i).and_then(|item| item.get(action)) else {
                return BatchOperationResult::failed(
                    id.as_str(),
                    SearchIndexError::bulk_operation("no item in bulk response"),
                );
            };

            let status = item.get("status").and_then(Value::as_u64).unwrap_or(0);
            if action == DELETE_ACTION && status == 404 {
                return BatchOperationResult::succeeded(id.as_str());
            }

            match item.get("error") {
                Some(error) => BatchOperationResult::failed(id.as_str(), item_error(action, error)),
                None if (200..300).contains(&status) => BatchOperationResult::succeeded(id.as_str()),
                None => BatchOperationResult::failed(
                    id.as_str(),
                    item_error(action, &json!({ "type": "status", "reason": status })),
                ),
            }
        })
        .collect();

    BatchOperationSummary::from_results(results)
}

fn item_error(action: &str, error: &Value) -> SearchIndexError {
    let error_type = error.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let reason = match error.get("reason") {
        Some(Value::String(reason)) => reason.clone(),
        Some(other) => other.to_string(),
        None => error.to_string(),
    };
    let message = format!("{}: {}", error_type, reason);

    if action == DELETE_ACTION {
        SearchIndexError::delete(message)
    } else {
        SearchIndexError::index(message)
    }
}
