//! OpenSearch index configuration and mappings.
//!
//! This module defines the bootstrap settings and mappings for the synchronized
//! index. Only the envelope fields are mapped explicitly; each kind's `source`
//! object is mapped dynamically.

use serde_json::{json, Value};

/// Shard layout and mapping used when bootstrapping an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl IndexConfig {
    pub fn new(number_of_shards: u32, number_of_replicas: u32) -> Self {
        Self {
            number_of_shards,
            number_of_replicas,
        }
    }

    /// Get the index settings and mappings.
    ///
    /// - **Keyword fields**: `kind`, `key` and `parent` for filtering and exact lookups
    /// - **Date field**: `indexed_at`
    /// - **Dynamic object**: `source`, with string fields mapped as keywords
    pub fn settings(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.number_of_shards,
                "number_of_replicas": self.number_of_replicas
            },
            "mappings": {
                "dynamic_templates": [
                    {
                        "source_strings": {
                            "path_match": "source.*",
                            "match_mapping_type": "string",
                            "mapping": { "type": "keyword", "ignore_above": 8191 }
                        }
                    }
                ],
                "properties": {
                    "kind": { "type": "keyword" },
                    "key": { "type": "keyword" },
                    "parent": { "type": "keyword" },
                    "indexed_at": { "type": "date" },
                    "source": { "type": "object", "dynamic": true }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = IndexConfig::default().settings();

        assert_eq!(settings["settings"]["number_of_shards"], 1);
        assert_eq!(settings["settings"]["number_of_replicas"], 1);

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["kind"]["type"], "keyword");
        assert_eq!(properties["key"]["type"], "keyword");
        assert_eq!(properties["indexed_at"]["type"], "date");
        assert_eq!(properties["source"]["dynamic"], true);
    }

    #[test]
    fn test_custom_shards() {
        let settings = IndexConfig::new(3, 0).settings();
        assert_eq!(settings["settings"]["number_of_shards"], 3);
        assert_eq!(settings["settings"]["number_of_replicas"], 0);
    }
}
