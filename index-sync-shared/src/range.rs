//! Time range filtering on `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `updated_at` window.
///
/// `from` is inclusive and `to` exclusive; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedAtRange {
    #[serde(rename = "updatedAtFrom", default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAtTo", default)]
    pub to: Option<DateTime<Utc>>,
}

impl UpdatedAtRange {
    /// A range with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Set the inclusive lower bound.
    pub fn starting_at(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the exclusive upper bound.
    pub fn ending_before(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Check whether `updated_at` falls inside the range.
    pub fn contains(&self, updated_at: &DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| *updated_at >= from)
            && self.to.map_or(true, |to| *updated_at < to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_unbounded_contains_everything() {
        let range = UpdatedAtRange::unbounded();
        assert!(range.is_unbounded());
        assert!(range.contains(&at(0)));
        assert!(range.contains(&Utc::now()));
    }

    #[test]
    fn test_half_open_bounds() {
        let range = UpdatedAtRange::unbounded().starting_at(at(4999)).ending_before(at(5001));
        assert!(!range.contains(&at(4998)));
        assert!(range.contains(&at(4999)));
        assert!(range.contains(&at(5000)));
        assert!(!range.contains(&at(5001)));
    }

    #[test]
    fn test_single_sided_bounds() {
        let only_to = UpdatedAtRange::unbounded().ending_before(at(5001));
        assert!(only_to.contains(&at(5000)));
        assert!(!only_to.contains(&Utc::now()));

        let only_from = UpdatedAtRange::unbounded().starting_at(at(5000));
        assert!(!only_from.contains(&at(10)));
        assert!(only_from.contains(&Utc::now()));
    }

    #[test]
    fn test_deserializes_trigger_field_names() {
        let range: UpdatedAtRange =
            serde_json::from_str(r#"{"updatedAtFrom":"1970-01-01T00:00:05Z"}"#).unwrap();
        assert_eq!(range.from, Some(at(5000)));
        assert!(range.to.is_none());
    }
}
