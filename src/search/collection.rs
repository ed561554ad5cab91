//! Per-collection search execution and result normalization
//!
//! One store round trip per collection, returning normalized results and the
//! collection's match count. Anything that goes wrong inside one collection
//! (missing profile, missing index, store error) is contained here: the
//! outcome is an explicit `Failed` value the aggregator can count as zero,
//! never an unwound error.

use crate::models::SearchResult;
use crate::search::category::CategoryMapper;
use crate::search::profile::SearchTopology;
use crate::search::query::QueryBuilder;
use crate::search::store::{DocumentStore, ScoredDocument};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Outcome of one collection's search
#[derive(Debug, Clone)]
pub enum CollectionOutcome {
    /// Normalized results plus this collection's total match count
    Hits {
        results: Vec<SearchResult>,
        total: u64,
    },
    /// The collection contributed nothing; the reason stays in the logs
    Failed { collection: String, reason: String },
}

impl CollectionOutcome {
    fn failed(collection: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(collection = %collection, reason = %reason, "Collection search failed");
        CollectionOutcome::Failed {
            collection: collection.to_string(),
            reason,
        }
    }
}

/// Executes one collection's compound search and normalizes its documents
#[derive(Clone)]
pub struct CollectionSearcher {
    store: Arc<dyn DocumentStore>,
    topology: Arc<SearchTopology>,
    mapper: CategoryMapper,
}

impl CollectionSearcher {
    pub fn new(store: Arc<dyn DocumentStore>, topology: Arc<SearchTopology>) -> Self {
        let mapper = CategoryMapper::new(topology.clone());
        Self {
            store,
            topology,
            mapper,
        }
    }

    /// Search a single collection. Never returns an error; failures scoped
    /// to this collection degrade to `CollectionOutcome::Failed`.
    pub async fn search(
        &self,
        collection: &str,
        raw_query: &str,
        team_id: &str,
        limit: usize,
    ) -> CollectionOutcome {
        let Some(profile) = self.topology.profile(collection) else {
            return CollectionOutcome::failed(collection, "no search profile configured");
        };

        let Some(index) = self.topology.index(collection) else {
            return CollectionOutcome::failed(collection, "no search index configured");
        };

        if profile.strategies.is_empty() {
            return CollectionOutcome::failed(collection, "no field strategies configured");
        }

        let builder = QueryBuilder::new(
            profile,
            &index.name,
            self.topology.settings.max_highlight_passages,
        );
        let query = builder.build(raw_query, team_id);

        // Project the returnable fields plus whatever the display name needs
        let mut projection = profile.returnable_fields.clone();
        if !projection.contains(&profile.display_field) {
            projection.push(profile.display_field.clone());
        }

        let hits = match self.store.search(collection, &query, &projection, limit).await {
            Ok(hits) => hits,
            Err(err) => return CollectionOutcome::failed(collection, err.to_string()),
        };

        let category = self.mapper.public_or_internal(collection);
        let results = hits
            .documents
            .iter()
            .filter_map(|doc| self.normalize(doc, &category, profile))
            .collect();

        CollectionOutcome::Hits {
            results,
            total: hits.total,
        }
    }

    /// Convert one projected store document into a `SearchResult`
    fn normalize(
        &self,
        scored: &ScoredDocument,
        category: &str,
        profile: &crate::search::profile::CollectionProfile,
    ) -> Option<SearchResult> {
        let doc = &scored.document;

        let id = doc.get("_id").and_then(value_to_string).or_else(|| {
            tracing::warn!(category = %category, "Document missing primary key, skipping");
            None
        })?;

        let mut result = SearchResult::new(id, category, scored.score.max(0.0));

        for field in &profile.returnable_fields {
            if field == "_id" {
                continue;
            }
            let Some(value) = lookup_path(doc, field) else {
                continue;
            };
            if is_empty(value) {
                continue;
            }
            result
                .fields
                .insert(field.clone(), flatten_object_ids(value));
        }

        // Resolved display value, always surfaced under `name`
        if let Some(display) = lookup_path(doc, &profile.display_field).and_then(value_to_string) {
            if !display.is_empty() {
                result.fields.insert("name".to_string(), Value::String(display));
            }
        }

        if let Some(highlights) = &scored.highlights {
            if !is_empty(highlights) {
                result.highlights = Some(highlights.clone());
            }
        }

        Some(result)
    }
}

/// Sequential descent along a dotted path; absent segments and non-container
/// intermediates yield `None`, never an error.
fn lookup_path<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// String form of a scalar or extended-JSON object id
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            if map.len() == 1 {
                map.get("$oid").and_then(Value::as_str).map(str::to_string)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Recursively replace extended-JSON object ids with their string form
fn flatten_object_ids(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(oid) = map.get("$oid").and_then(Value::as_str) {
                    return Value::String(oid.to_string());
                }
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), flatten_object_ids(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(flatten_object_ids).collect()),
        other => other.clone(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
