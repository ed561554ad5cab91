//! Document store boundary
//!
//! The store is the engine's only true dependency: one search operation that
//! returns ranked, projected documents plus the total match count in a single
//! round trip, and the index-management surface (list/create/update named
//! search index definitions). Connection lifecycle belongs to whichever
//! backend implements the trait.

use crate::config::{StoreBackend, StoreConfig};
use crate::search::error::SearchError;
use crate::search::index::IndexDefinition;
use crate::search::query::{ClauseOperator, CompoundQuery, TenantValue};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One ranked, projected document as returned by the store
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The projected document body
    pub document: Map<String, Value>,

    /// Score assigned by the ranking oracle
    pub score: f64,

    /// Highlight spans, if the oracle supplied any
    pub highlights: Option<Value>,
}

/// Result of one collection search: the top hits and the total match count,
/// obtained together in one round trip
#[derive(Debug, Clone, Default)]
pub struct CollectionHits {
    pub documents: Vec<ScoredDocument>,
    pub total: u64,
}

/// Trait for document store operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Execute a compound search against one collection, returning the top
    /// `limit` ranked documents projected to `projection` together with the
    /// total match count.
    async fn search(
        &self,
        collection: &str,
        query: &CompoundQuery,
        projection: &[String],
        limit: usize,
    ) -> Result<CollectionHits, SearchError>;

    /// Names of the search indexes currently present on a collection
    async fn list_search_indexes(&self, collection: &str) -> Result<Vec<String>, SearchError>;

    /// Create a named search index definition
    async fn create_search_index(
        &self,
        collection: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError>;

    /// Replace a named search index definition in full
    async fn update_search_index(
        &self,
        collection: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError>;
}

/// Build the configured store backend
pub fn create_store(config: &StoreConfig) -> Arc<dyn DocumentStore> {
    match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    }
}

/// In-memory document store.
///
/// Backs tests and the default deployment profile. Scoring is a rough
/// stand-in for the external ranking oracle: each matching should-clause
/// contributes its boost (default 1.0), doubled for the strongest form of
/// the match (prefix for autocomplete, whole-value equality for text).
pub struct MemoryStore {
    collections: DashMap<String, Vec<Map<String, Value>>>,
    indexes: DashMap<String, Vec<IndexDefinition>>,
    failing: DashMap<String, String>,
    search_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            indexes: DashMap::new(),
            failing: DashMap::new(),
            search_calls: AtomicUsize::new(0),
        }
    }

    /// Insert a document into a collection
    pub fn insert_document(&self, collection: &str, document: Map<String, Value>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// Make every subsequent search against a collection fail (test seam)
    pub fn inject_failure(&self, collection: &str, reason: &str) {
        self.failing
            .insert(collection.to_string(), reason.to_string());
    }

    /// Number of search calls issued so far
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Stored index definitions for a collection
    pub fn index_definitions(&self, collection: &str) -> Vec<IndexDefinition> {
        self.indexes
            .get(collection)
            .map(|defs| defs.clone())
            .unwrap_or_default()
    }

    fn score_document(doc: &Map<String, Value>, query: &CompoundQuery) -> Option<(f64, Option<Value>)> {
        if !tenant_matches(doc, query) {
            return None;
        }

        // Filter-only query: every tenant document is a hit with no ranking.
        if query.should.is_empty() {
            return Some((0.0, None));
        }

        let mut score = 0.0;
        let mut highlighted: Option<(String, String)> = None;

        for clause in &query.should {
            let Some(value) = lookup_string(doc, &clause.path) else {
                continue;
            };
            let weight = clause.boost.unwrap_or(1.0);
            let text = value.to_lowercase();
            let needle = clause.query.to_lowercase();

            let contribution = match clause.operator {
                ClauseOperator::Autocomplete => {
                    if text.starts_with(&needle) {
                        weight * 2.0
                    } else if text.contains(&needle) {
                        weight
                    } else {
                        0.0
                    }
                }
                ClauseOperator::Text => {
                    if text == needle {
                        weight * 2.0
                    } else if text.split_whitespace().any(|token| token == needle) {
                        weight
                    } else {
                        0.0
                    }
                }
                ClauseOperator::Term => {
                    if value == clause.query {
                        weight
                    } else {
                        0.0
                    }
                }
            };

            if contribution > 0.0 {
                score += contribution;
                if highlighted.is_none() {
                    highlighted = Some((clause.path.clone(), value.clone()));
                }
            }
        }

        if score > 0.0 {
            let highlights = query.highlight.as_ref().and_then(|_| {
                highlighted.map(|(path, value)| {
                    json!([{
                        "path": path,
                        "texts": [{ "value": value, "type": "hit" }],
                        "score": 1.0,
                    }])
                })
            });
            Some((score, highlights))
        } else {
            None
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn search(
        &self,
        collection: &str,
        query: &CompoundQuery,
        projection: &[String],
        limit: usize,
    ) -> Result<CollectionHits, SearchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.failing.get(collection) {
            return Err(SearchError::StoreFailed(reason.clone()));
        }

        let documents = self
            .collections
            .get(collection)
            .map(|docs| docs.clone())
            .unwrap_or_default();

        let mut hits: Vec<ScoredDocument> = documents
            .iter()
            .filter_map(|doc| {
                Self::score_document(doc, query).map(|(score, highlights)| ScoredDocument {
                    document: project(doc, projection),
                    score,
                    highlights,
                })
            })
            .collect();

        let total = hits.len() as u64;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);

        Ok(CollectionHits {
            documents: hits,
            total,
        })
    }

    async fn list_search_indexes(&self, collection: &str) -> Result<Vec<String>, SearchError> {
        if let Some(reason) = self.failing.get(collection) {
            return Err(SearchError::IndexListFailed {
                collection: collection.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(self
            .indexes
            .get(collection)
            .map(|defs| defs.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default())
    }

    async fn create_search_index(
        &self,
        collection: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError> {
        let mut defs = self.indexes.entry(collection.to_string()).or_default();
        if defs.iter().any(|d| d.name == definition.name) {
            return Err(SearchError::IndexCreateFailed {
                collection: collection.to_string(),
                index: definition.name.clone(),
                reason: "index already exists".to_string(),
            });
        }
        defs.push(definition.clone());
        Ok(())
    }

    async fn update_search_index(
        &self,
        collection: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError> {
        let mut defs = self
            .indexes
            .get_mut(collection)
            .ok_or_else(|| SearchError::IndexUpdateFailed {
                collection: collection.to_string(),
                index: definition.name.clone(),
                reason: "collection has no indexes".to_string(),
            })?;

        match defs.iter_mut().find(|d| d.name == definition.name) {
            Some(existing) => {
                // Full replace, not an incremental patch
                *existing = definition.clone();
                Ok(())
            }
            None => Err(SearchError::IndexUpdateFailed {
                collection: collection.to_string(),
                index: definition.name.clone(),
                reason: "index not found".to_string(),
            }),
        }
    }
}

fn tenant_matches(doc: &Map<String, Value>, query: &CompoundQuery) -> bool {
    let Some(stored) = lookup(doc, &query.tenant_filter.path) else {
        return false;
    };

    match &query.tenant_filter.value {
        TenantValue::Text(expected) => stored.as_str() == Some(expected.as_str()),
        TenantValue::ObjectId(hex) => match stored {
            Value::Object(map) => map.get("$oid").and_then(Value::as_str) == Some(hex.as_str()),
            Value::String(s) => s.eq_ignore_ascii_case(hex),
            _ => false,
        },
    }
}

/// Sequential descent along a dotted path
fn lookup<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn lookup_string(doc: &Map<String, Value>, path: &str) -> Option<String> {
    lookup(doc, path).and_then(|v| v.as_str().map(str::to_string))
}

/// Emulates the projection stage: keep `_id` and the top-level segment of
/// every projected path.
fn project(doc: &Map<String, Value>, projection: &[String]) -> Map<String, Value> {
    let mut keep: Vec<&str> = projection
        .iter()
        .filter_map(|p| p.split('.').next())
        .collect();
    keep.push("_id");

    doc.iter()
        .filter(|(key, _)| keep.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
