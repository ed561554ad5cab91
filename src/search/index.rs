//! Search index lifecycle management
//!
//! Search queries silently return nothing (or fail outright) when the index
//! definitions they rely on are missing or stale, so the definitions are
//! reconciled once at startup, before any traffic is accepted: list what the
//! store has, update on a name match, create otherwise.

use crate::search::error::SearchError;
use crate::search::profile::SearchTopology;
use crate::search::store::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Declared type of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMappingKind {
    Autocomplete,
    String,
    Keyword,
    /// Nested document; searchable sub-fields live in `fields`
    Document,
}

/// One way a field is indexed. A field may carry several mappings (for
/// example autocomplete and plain string on the same path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub kind: FieldMappingKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenization: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_grams: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_grams: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_diacritics: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Sub-field mappings when `kind` is `Document`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<FieldMapping>>>,
}

/// Field mapping tree. Undeclared fields are implicitly non-searchable
/// unless `dynamic` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexMappings {
    #[serde(default)]
    pub dynamic: bool,

    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldMapping>>,
}

/// A named search index definition for one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name, unique per collection
    pub name: String,

    /// Disabled definitions are skipped by the lifecycle pass
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub mappings: IndexMappings,
}

fn default_enabled() -> bool {
    true
}

impl IndexDefinition {
    /// Minimal definition with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            mappings: IndexMappings::default(),
        }
    }

    /// Store-native wire form of the definition body
    pub fn to_document(&self) -> Value {
        json!({
            "mappings": {
                "dynamic": self.mappings.dynamic,
                "fields": mappings_to_wire(&self.mappings.fields),
            }
        })
    }
}

fn mappings_to_wire(fields: &BTreeMap<String, Vec<FieldMapping>>) -> Value {
    let mut wire = Map::new();
    for (path, mappings) in fields {
        let entries: Vec<Value> = mappings.iter().map(mapping_to_wire).collect();
        wire.insert(path.clone(), Value::Array(entries));
    }
    Value::Object(wire)
}

fn mapping_to_wire(mapping: &FieldMapping) -> Value {
    let mut body = Map::new();
    let kind = match mapping.kind {
        FieldMappingKind::Autocomplete => "autocomplete",
        FieldMappingKind::String => "string",
        FieldMappingKind::Keyword => "keyword",
        FieldMappingKind::Document => "document",
    };
    body.insert("type".to_string(), json!(kind));

    if let Some(tokenization) = &mapping.tokenization {
        body.insert("tokenization".to_string(), json!(tokenization));
    }
    if let Some(min_grams) = mapping.min_grams {
        body.insert("minGrams".to_string(), json!(min_grams));
    }
    if let Some(max_grams) = mapping.max_grams {
        body.insert("maxGrams".to_string(), json!(max_grams));
    }
    if let Some(fold) = mapping.fold_diacritics {
        body.insert("foldDiacritics".to_string(), json!(fold));
    }
    if let Some(analyzer) = &mapping.analyzer {
        body.insert("analyzer".to_string(), json!(analyzer));
    }
    if let Some(fields) = &mapping.fields {
        body.insert("fields".to_string(), mappings_to_wire(fields));
    }

    Value::Object(body)
}

/// Whether an upsert created or replaced the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Reconciles configured search index definitions against the store.
///
/// Runs once at startup. Create and update are idempotent in the sense that
/// the desired state ends up matching the definition, but they are not
/// transactional: a crash mid-update leaves the previous definition in place.
pub struct IndexLifecycleManager {
    store: Arc<dyn DocumentStore>,
    topology: Arc<SearchTopology>,
}

impl IndexLifecycleManager {
    pub fn new(store: Arc<dyn DocumentStore>, topology: Arc<SearchTopology>) -> Self {
        Self { store, topology }
    }

    /// Upsert every enabled index definition. Any failure is fatal: the
    /// service must not serve search traffic with missing indexes.
    pub async fn upsert_all(&self) -> Result<(), SearchError> {
        tracing::info!("Starting search index upsert (create/update)");

        let enabled: Vec<(&String, &IndexDefinition)> = self
            .topology
            .indexes
            .iter()
            .filter(|(_, definition)| definition.enabled)
            .collect();

        if enabled.is_empty() {
            tracing::warn!("No enabled search index definitions configured");
            return Ok(());
        }

        let total = enabled.len();
        let mut success = 0usize;

        for (collection, definition) in enabled {
            match self.upsert_collection(collection, definition).await {
                Ok(action) => {
                    success += 1;
                    tracing::info!(
                        collection = %collection,
                        index = %definition.name,
                        action = ?action,
                        "Search index upsert succeeded"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        collection = %collection,
                        index = %definition.name,
                        error = %err,
                        "Search index upsert failed"
                    );
                }
            }
        }

        if success == total {
            tracing::info!("Search index upsert completed successfully - {success}/{total}");
            Ok(())
        } else {
            if success > 0 {
                tracing::warn!("Search index upsert partially completed - {success}/{total}");
            } else {
                tracing::error!("Search index upsert failed - 0/{total}");
            }
            Err(SearchError::IndexUpsertFailed {
                failed: total - success,
                total,
            })
        }
    }

    /// One collection's pass: enumerate existing indexes, then update on a
    /// name match or create otherwise (full replace, not a patch).
    async fn upsert_collection(
        &self,
        collection: &str,
        definition: &IndexDefinition,
    ) -> Result<UpsertAction, SearchError> {
        let existing = self.store.list_search_indexes(collection).await?;

        if existing.iter().any(|name| name == &definition.name) {
            tracing::info!(
                collection = %collection,
                index = %definition.name,
                "Index already exists, updating"
            );
            self.store.update_search_index(collection, definition).await?;
            Ok(UpsertAction::Updated)
        } else {
            tracing::info!(
                collection = %collection,
                index = %definition.name,
                "Index not found, creating"
            );
            self.store.create_search_index(collection, definition).await?;
            Ok(UpsertAction::Created)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::profile::SearchSettings;
    use crate::search::store::MemoryStore;

    fn mapping() -> FieldMapping {
        FieldMapping {
            kind: FieldMappingKind::Autocomplete,
            tokenization: Some("nGram".to_string()),
            min_grams: Some(2),
            max_grams: Some(15),
            fold_diacritics: Some(true),
            analyzer: None,
            fields: None,
        }
    }

    fn topology(enabled: bool) -> SearchTopology {
        let definition = IndexDefinition {
            name: "bots_search_index".to_string(),
            enabled,
            mappings: IndexMappings {
                dynamic: false,
                fields: BTreeMap::from([("name".to_string(), vec![mapping()])]),
            },
        };

        SearchTopology {
            categories: BTreeMap::from([("assistant".to_string(), "bots".to_string())]),
            profiles: BTreeMap::new(),
            indexes: BTreeMap::from([("bots".to_string(), definition)]),
            settings: SearchSettings::default(),
        }
    }

    #[test]
    fn test_definition_wire_form() {
        let topology = topology(true);
        let wire = topology.index("bots").unwrap().to_document();

        assert_eq!(wire["mappings"]["dynamic"], false);
        let name_mapping = &wire["mappings"]["fields"]["name"][0];
        assert_eq!(name_mapping["type"], "autocomplete");
        assert_eq!(name_mapping["tokenization"], "nGram");
        assert_eq!(name_mapping["minGrams"], 2);
        assert_eq!(name_mapping["maxGrams"], 15);
        assert_eq!(name_mapping["foldDiacritics"], true);
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = Arc::new(MemoryStore::new());
        let topology = Arc::new(topology(true));
        let manager = IndexLifecycleManager::new(store.clone(), topology);

        // first pass creates
        manager.upsert_all().await.unwrap();
        assert_eq!(
            store.list_search_indexes("bots").await.unwrap(),
            vec!["bots_search_index".to_string()]
        );

        // second pass with an unchanged definition set updates in place and
        // ends in the same observable state
        manager.upsert_all().await.unwrap();
        let definitions = store.index_definitions("bots");
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "bots_search_index");
    }

    #[tokio::test]
    async fn test_disabled_definitions_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let topology = Arc::new(topology(false));
        let manager = IndexLifecycleManager::new(store.clone(), topology);

        manager.upsert_all().await.unwrap();
        assert!(store.list_search_indexes("bots").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.inject_failure("bots", "no permission");
        let topology = Arc::new(topology(true));
        let manager = IndexLifecycleManager::new(store.clone(), topology);

        let err = manager.upsert_all().await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::IndexUpsertFailed { failed: 1, total: 1 }
        ));
    }
}
