//! Run configuration for the synchronization pipeline.
//!
//! Process-wide settings are read from the environment once at startup into
//! `SyncSettings`. Per-run options arrive with each trigger as `SyncOptions`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ConfigurationError;
use index_sync_shared::UpdatedAtRange;

/// Concurrency used when neither the trigger nor the environment sets one.
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Records fetched per store round-trip.
pub const DEFAULT_PAGE_SIZE: usize = 500;
/// Upper bound on one index write.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const EXPLICIT_SETTING: &str = "esRequestConcurrency";
const ENV_SETTING: &str = "ES_CONCURRENCY";

/// How a record whose referenced relation no longer exists is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationPolicy {
    /// Fail the record.
    #[default]
    Fail,
    /// Index the record without the fields derived from the missing relation.
    Omit,
}

/// The global ceiling on in-flight index writes for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self(limit)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Resolve the limit from the trigger value, else the environment
    /// default, else `DEFAULT_CONCURRENCY`.
    ///
    /// The first source present must hold a positive integer, either as a
    /// JSON number or as a string. A JSON `null` counts as absent, as does a
    /// blank environment value.
    pub fn resolve(explicit: Option<&Value>, env_default: Option<&str>) -> Result<Self, ConfigurationError> {
        if let Some(value) = explicit.filter(|value| !value.is_null()) {
            return Self::parse_value(value)
                .ok_or_else(|| ConfigurationError::invalid_concurrency(EXPLICIT_SETTING, value));
        }

        if let Some(raw) = env_default.filter(|raw| !raw.trim().is_empty()) {
            return Self::parse_str(raw).ok_or_else(|| {
                ConfigurationError::invalid_concurrency(ENV_SETTING, &Value::String(raw.to_string()))
            });
        }

        Ok(Self::default())
    }

    fn parse_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => {
                if let Some(n) = number.as_u64() {
                    return Self::from_u64(n);
                }
                if number.is_i64() {
                    return None;
                }
                let n = number.as_f64()?;
                if n.fract() == 0.0 && n >= 1.0 && n <= usize::MAX as f64 {
                    Self::from_u64(n as u64)
                } else {
                    None
                }
            }
            Value::String(raw) => Self::parse_str(raw),
            _ => None,
        }
    }

    fn parse_str(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().and_then(Self::from_u64)
    }

    fn from_u64(n: u64) -> Option<Self> {
        usize::try_from(n).ok().and_then(NonZeroUsize::new).map(Self)
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Process-wide settings captured once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Raw `ES_CONCURRENCY`; validated when a run resolves its limit.
    pub default_concurrency: Option<String>,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub relation_policy: RelationPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            default_concurrency: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            relation_policy: RelationPolicy::default(),
        }
    }
}

impl SyncSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self {
            default_concurrency: lookup(ENV_SETTING),
            ..Self::default()
        };

        if let Some(raw) = lookup("SYNC_PAGE_SIZE") {
            settings.page_size = parse_positive("SYNC_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("ES_REQUEST_TIMEOUT_MS") {
            settings.request_timeout =
                Duration::from_millis(parse_positive("ES_REQUEST_TIMEOUT_MS", &raw)? as u64);
        }

        Ok(settings)
    }

    pub fn with_default_concurrency(mut self, value: impl Into<String>) -> Self {
        self.default_concurrency = Some(value.into());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_relation_policy(mut self, policy: RelationPolicy) -> Self {
        self.relation_policy = policy;
        self
    }
}

fn parse_positive(setting: &'static str, raw: &str) -> Result<usize, ConfigurationError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigurationError::invalid_setting(setting, raw))
}

/// Options for one synchronization run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Target index or alias.
    pub index_name: String,
    /// Concurrency from the trigger, in whatever JSON form it arrived.
    pub es_request_concurrency: Option<Value>,
    pub range: UpdatedAtRange,
    /// Overrides `SyncSettings::relation_policy` when set.
    pub relation_policy: Option<RelationPolicy>,
}

impl SyncOptions {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            es_request_concurrency: None,
            range: UpdatedAtRange::unbounded(),
            relation_policy: None,
        }
    }

    pub fn with_concurrency(mut self, value: impl Into<Value>) -> Self {
        self.es_request_concurrency = Some(value.into());
        self
    }

    pub fn with_range(mut self, range: UpdatedAtRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_relation_policy(mut self, policy: RelationPolicy) -> Self {
        self.relation_policy = Some(policy);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(explicit: Option<Value>, env: Option<&str>) -> Result<usize, ConfigurationError> {
        ConcurrencyLimit::resolve(explicit.as_ref(), env).map(|limit| limit.get())
    }

    #[test]
    fn test_explicit_value_wins() {
        assert_eq!(resolve(Some(json!(5)), Some("35")).unwrap(), 5);
        assert_eq!(resolve(Some(json!("7")), None).unwrap(), 7);
        assert_eq!(resolve(Some(json!(" 8 ")), None).unwrap(), 8);
        assert_eq!(resolve(Some(json!(4.0)), None).unwrap(), 4);
    }

    #[test]
    fn test_environment_default() {
        assert_eq!(resolve(None, Some("35")).unwrap(), 35);
        assert_eq!(resolve(Some(Value::Null), Some("35")).unwrap(), 35);
    }

    #[test]
    fn test_fallback_is_ten() {
        assert_eq!(resolve(None, None).unwrap(), 10);
        assert_eq!(resolve(None, Some("  ")).unwrap(), 10);
    }

    #[test]
    fn test_invalid_explicit_values() {
        for value in [json!(-1), json!(0), json!("asdf"), json!("0"), json!(2.5), json!(true), json!([5])] {
            let err = resolve(Some(value.clone()), Some("35")).unwrap_err();
            assert!(
                matches!(err, ConfigurationError::InvalidConcurrency { setting: "esRequestConcurrency", .. }),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_invalid_environment_values() {
        for raw in ["-1", "0", "asdf", "1.5"] {
            let err = resolve(None, Some(raw)).unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::InvalidConcurrency { setting: "ES_CONCURRENCY", .. }
            ));
        }
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = SyncSettings::from_lookup(|name| match name {
            "ES_CONCURRENCY" => Some("35".to_string()),
            "SYNC_PAGE_SIZE" => Some("100".to_string()),
            "ES_REQUEST_TIMEOUT_MS" => Some("2500".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(settings.default_concurrency.as_deref(), Some("35"));
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.request_timeout, Duration::from_millis(2500));
        assert_eq!(settings.relation_policy, RelationPolicy::Fail);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = SyncSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, SyncSettings::default());
        assert_eq!(settings.page_size, 500);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_settings_reject_bad_page_size() {
        let err = SyncSettings::from_lookup(|name| (name == "SYNC_PAGE_SIZE").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetting { setting: "SYNC_PAGE_SIZE", .. }));
    }

    #[test]
    fn test_relation_policy_wire_names() {
        assert_eq!(serde_json::to_value(RelationPolicy::Omit).unwrap(), json!("omit"));
        let policy: RelationPolicy = serde_json::from_value(json!("fail")).unwrap();
        assert_eq!(policy, RelationPolicy::Fail);
    }
}
