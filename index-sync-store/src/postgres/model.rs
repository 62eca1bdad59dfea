//! Generic table access over any PostgreSQL executor.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{FromRow, PgExecutor, QueryBuilder};
use tracing::debug;

use crate::errors::StoreError;
use index_sync_shared::UpdatedAtRange;

/// A row type backed by a table with a `cumulus_id` identity column.
pub trait PgRecord: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    /// Name of the backing table.
    const TABLE: &'static str;
    /// Select list producing the row type's columns.
    const COLUMNS: &'static str;

    fn cumulus_id(&self) -> i64;
}

/// A value bound into a generated query.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("NULL"),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            FieldValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// A conjunction of column equality conditions.
///
/// A `Null` value matches with `IS NULL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(&'static str, FieldValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the internal identity.
    pub fn by_cumulus_id(cumulus_id: i64) -> Self {
        Self::new().eq("cumulus_id", cumulus_id)
    }

    /// Require `column` to equal `value`.
    pub fn eq(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the filter for error messages, e.g. `name=x, version=y`.
    pub fn describe(&self) -> String {
        self.conditions
            .iter()
            .map(|(column, value)| format!("{}={}", column, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Column values for inserts and updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: Vec<(&'static str, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Null => {
            builder.push("NULL");
        }
        FieldValue::Bool(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Int(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Float(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Text(v) => {
            builder.push_bind(v.clone());
        }
        FieldValue::Timestamp(v) => {
            builder.push_bind(*v);
        }
        FieldValue::Json(v) => {
            builder.push_bind(sqlx::types::Json(v.clone()));
        }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (column, value) in &filter.conditions {
        builder.push(" AND ").push(*column);
        if *value == FieldValue::Null {
            builder.push(" IS NULL");
        } else {
            builder.push(" = ");
            push_value(builder, value);
        }
    }
}

fn push_range(builder: &mut QueryBuilder<'_, Postgres>, range: &UpdatedAtRange) {
    if let Some(from) = range.from {
        builder.push(" AND updated_at >= ").push_bind(from);
    }
    if let Some(to) = range.to {
        builder.push(" AND updated_at < ").push_bind(to);
    }
}

/// Build a `SELECT` for `R`.
///
/// Rows come back ordered by identity; `after` starts the page after a
/// previously seen identity.
pub(crate) fn select_query<'args, R: PgRecord>(
    filter: &Filter,
    range: Option<&UpdatedAtRange>,
    after: Option<i64>,
    limit: Option<usize>,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE TRUE",
        R::COLUMNS,
        R::TABLE
    ));
    push_filter(&mut builder, filter);
    if let Some(range) = range {
        push_range(&mut builder, range);
    }
    if let Some(after) = after {
        builder.push(" AND cumulus_id > ").push_bind(after);
    }
    builder.push(" ORDER BY cumulus_id");
    if let Some(limit) = limit {
        builder.push(" LIMIT ").push_bind(limit as i64);
    }
    builder
}

fn update_query<'args, R: PgRecord>(
    filter: &Filter,
    fields: &Fields,
    returning: &str,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    for (i, (column, value)) in fields.values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(*column).push(" = ");
        push_value(&mut builder, value);
    }
    builder.push(" WHERE TRUE");
    push_filter(&mut builder, filter);
    builder.push(" RETURNING ").push(returning);
    builder
}

/// Generic access to the table backing `R`.
///
/// Every method takes the executor explicitly. Pass `&PgPool` for pooled
/// access or `&mut *tx` to run inside a caller-managed transaction.
pub struct PgModel<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PgModel<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for PgModel<R> {}

impl<R> Default for PgModel<R> {
    fn default() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R: PgRecord> PgModel<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &'static str {
        R::TABLE
    }

    /// Insert a row and return its `cumulus_id`.
    pub async fn create<'e, E>(&self, executor: E, fields: &Fields) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {}", R::TABLE));

        if fields.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            builder.push(" (");
            for (i, (column, _)) in fields.values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                builder.push(*column);
            }
            builder.push(") VALUES (");
            for (i, (_, value)) in fields.values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(&mut builder, value);
            }
            builder.push(")");
        }
        builder.push(" RETURNING cumulus_id::bigint");

        let cumulus_id = builder
            .build_query_scalar::<i64>()
            .fetch_one(executor)
            .await?;

        debug!(table = R::TABLE, cumulus_id, "Created record");
        Ok(cumulus_id)
    }

    /// Fetch the single row matching `filter`.
    ///
    /// # Returns
    ///
    /// * `Ok(R)` - The first matching row
    /// * `Err(StoreError::RecordNotFound)` - If nothing matches
    pub async fn get<'e, E>(&self, executor: E, filter: &Filter) -> Result<R, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder = select_query::<R>(filter, None, None, Some(1));
        builder
            .build_query_as::<R>()
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| StoreError::not_found(R::TABLE, filter.describe()))
    }

    /// Fetch the `cumulus_id` of the row matching `filter`.
    pub async fn get_record_cumulus_id<'e, E>(
        &self,
        executor: E,
        filter: &Filter,
    ) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT cumulus_id::bigint FROM {} WHERE TRUE",
            R::TABLE
        ));
        push_filter(&mut builder, filter);
        builder.push(" LIMIT 1");

        builder
            .build_query_scalar::<i64>()
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| StoreError::not_found(R::TABLE, filter.describe()))
    }

    /// Fetch the `cumulus_id`s of every row whose `column` is one of `values`.
    pub async fn get_records_cumulus_ids<'e, E>(
        &self,
        executor: E,
        column: &'static str,
        values: &[FieldValue],
    ) -> Result<Vec<i64>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT cumulus_id::bigint FROM {} WHERE {} IN (",
            R::TABLE,
            column
        ));
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, value);
        }
        builder.push(") ORDER BY cumulus_id");

        Ok(builder
            .build_query_scalar::<i64>()
            .fetch_all(executor)
            .await?)
    }

    /// Check whether any row matches `filter`.
    pub async fn exists<'e, E>(&self, executor: E, filter: &Filter) -> Result<bool, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE TRUE",
            R::TABLE
        ));
        push_filter(&mut builder, filter);
        builder.push(")");

        Ok(builder
            .build_query_scalar::<bool>()
            .fetch_one(executor)
            .await?)
    }

    /// Delete the rows matching `filter` and return how many were removed.
    ///
    /// An empty filter is rejected rather than truncating the table.
    pub async fn delete<'e, E>(&self, executor: E, filter: &Filter) -> Result<u64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        if filter.is_empty() {
            return Err(StoreError::query(format!(
                "refusing to delete from {} without a filter",
                R::TABLE
            )));
        }

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("DELETE FROM {} WHERE TRUE", R::TABLE));
        push_filter(&mut builder, filter);

        let result = builder.build().execute(executor).await?;
        Ok(result.rows_affected())
    }

    /// Set `fields` on the rows matching `filter` and return the updated rows.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        filter: &Filter,
        fields: &Fields,
    ) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        self.update_returning(executor, filter, fields, R::COLUMNS).await
    }

    /// Set `fields` on the rows matching `filter` and return `returning` of
    /// each updated row, decoded as `T`.
    ///
    /// # Arguments
    ///
    /// * `returning` - Select list for the `RETURNING` clause, e.g. `"name"`
    pub async fn update_returning<'e, T, E>(
        &self,
        executor: E,
        filter: &Filter,
        fields: &Fields,
        returning: &str,
    ) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: PgExecutor<'e>,
    {
        if fields.is_empty() {
            return Err(StoreError::query(format!(
                "refusing to update {} without fields",
                R::TABLE
            )));
        }

        let mut builder = update_query::<R>(filter, fields, returning);
        let rows = builder.build_query_as::<T>().fetch_all(executor).await?;

        debug!(table = R::TABLE, rows = rows.len(), "Updated records");
        Ok(rows)
    }

    /// Count the rows matching `filter`.
    pub async fn count<'e, E>(&self, executor: E, filter: &Filter) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE TRUE", R::TABLE));
        push_filter(&mut builder, filter);

        Ok(builder
            .build_query_scalar::<i64>()
            .fetch_one(executor)
            .await?)
    }

    /// Fetch every row matching `filter`. Returns an empty vec if none match.
    pub async fn search<'e, E>(&self, executor: E, filter: &Filter) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder = select_query::<R>(filter, None, None, None);
        Ok(builder.build_query_as::<R>().fetch_all(executor).await?)
    }

    /// Fetch every row matching `filter` whose `updated_at` is within `range`.
    pub async fn search_with_updated_at_range<'e, E>(
        &self,
        executor: E,
        filter: &Filter,
        range: &UpdatedAtRange,
    ) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder = select_query::<R>(filter, Some(range), None, None);
        Ok(builder.build_query_as::<R>().fetch_all(executor).await?)
    }

    /// Fetch one keyset page of rows within `range`, after identity `after`.
    pub async fn page<'e, E>(
        &self,
        executor: E,
        range: &UpdatedAtRange,
        after: Option<i64>,
        limit: usize,
    ) -> Result<Vec<R>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let mut builder = select_query::<R>(&Filter::new(), Some(range), after, Some(limit));
        Ok(builder.build_query_as::<R>().fetch_all(executor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CollectionRecord, GranuleRecord};
    use chrono::TimeZone;

    #[test]
    fn test_select_with_filter() {
        let filter = Filter::new().eq("name", "MOD09GQ").eq("version", "006");
        let builder = select_query::<CollectionRecord>(&filter, None, None, None);

        let sql = builder.sql();
        assert!(sql.starts_with("SELECT cumulus_id::bigint AS cumulus_id"));
        assert!(sql.contains("FROM collections WHERE TRUE AND name = $1 AND version = $2"));
        assert!(sql.ends_with("ORDER BY cumulus_id"));
    }

    #[test]
    fn test_select_null_filter_uses_is_null() {
        let filter = Filter::new().eq("pdr_cumulus_id", None::<i64>);
        let builder = select_query::<GranuleRecord>(&filter, None, None, None);
        assert!(builder.sql().contains("AND pdr_cumulus_id IS NULL ORDER BY"));
    }

    #[test]
    fn test_page_query_is_half_open_keyset() {
        let range = UpdatedAtRange::unbounded()
            .starting_at(Utc.timestamp_millis_opt(4999).unwrap())
            .ending_before(Utc.timestamp_millis_opt(5001).unwrap());
        let builder = select_query::<GranuleRecord>(&Filter::new(), Some(&range), Some(42), Some(100));

        let sql = builder.sql();
        assert!(sql.contains(
            "WHERE TRUE AND updated_at >= $1 AND updated_at < $2 AND cumulus_id > $3 ORDER BY cumulus_id LIMIT $4"
        ));
    }

    #[test]
    fn test_unbounded_page_query() {
        let builder = select_query::<GranuleRecord>(
            &Filter::new(),
            Some(&UpdatedAtRange::unbounded()),
            None,
            Some(10),
        );
        assert!(builder.sql().ends_with("FROM granules WHERE TRUE ORDER BY cumulus_id LIMIT $1"));
    }

    #[test]
    fn test_update_returns_requested_columns() {
        let fields = Fields::new().set("process", "modis").set("url_path", None::<String>);
        let filter = Filter::new().eq("name", "MOD09GQ");
        let builder = update_query::<CollectionRecord>(&filter, &fields, "name, version");

        assert_eq!(
            builder.sql(),
            "UPDATE collections SET process = $1, url_path = NULL WHERE TRUE AND name = $2 RETURNING name, version"
        );
    }

    #[test]
    fn test_filter_describe() {
        let filter = Filter::by_cumulus_id(7).eq("name", "x");
        assert_eq!(filter.describe(), "cumulus_id=7, name=x");
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(Some(3_i32)), FieldValue::Int(3));
        assert_eq!(FieldValue::from(None::<String>), FieldValue::Null);
        assert_eq!(FieldValue::from("a"), FieldValue::Text("a".to_string()));
        assert!(Fields::new().is_empty());
        assert!(!Fields::new().set("info", "x").is_empty());
    }
}
