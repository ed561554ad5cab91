//! Search topology configuration
//!
//! The topology is the read-only configuration the whole engine runs on:
//! the public↔internal category mapping, one search profile per collection,
//! and the search index definitions. It is constructed once at startup and
//! shared by reference; nothing mutates it afterwards.

use crate::search::index::IndexDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a field contributes to ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Prefix/substring matching for search-as-you-type
    Autocomplete,
    /// Tokenized, analyzed full-text matching
    Text,
    /// Exact-term matching
    Keyword,
}

/// Bounded-edit-distance matching parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyOptions {
    pub max_edits: u32,
    pub prefix_length: u32,
    pub max_expansions: u32,
}

/// One ranking contribution for one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStrategy {
    /// Dotted field locator within a document
    pub path: String,

    /// Matching technique for this field
    pub match_kind: MatchKind,

    /// Optional positive weight applied to this strategy's score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,

    /// Optional fuzzy parameters; ignored for keyword matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<FuzzyOptions>,
}

/// Value type of the tenant-scope field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantKeyKind {
    #[default]
    String,
    ObjectId,
}

/// The field used to scope results to the requesting tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantScope {
    /// Field name holding the tenant identifier
    pub field: String,

    /// Whether stored values are plain strings or binary object identifiers
    #[serde(default)]
    pub kind: TenantKeyKind,
}

/// Per-collection search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionProfile {
    /// Ordered ranking strategies
    pub strategies: Vec<FieldStrategy>,

    /// Field paths copied into results when present
    pub returnable_fields: Vec<String>,

    /// Tenant scoping field
    pub tenant_scope: TenantScope,

    /// Field resolved into the result's human-readable `name`
    pub display_field: String,
}

/// Engine-wide tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Limit applied when the request does not specify one
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Hard ceiling on any request limit
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum highlight passages per field, for cost control
    #[serde(default = "default_max_highlight_passages")]
    pub max_highlight_passages: u32,

    /// Optional per-collection search timeout
    #[serde(default)]
    pub per_collection_timeout_ms: Option<u64>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_results: default_max_results(),
            max_highlight_passages: default_max_highlight_passages(),
            per_collection_timeout_ms: None,
        }
    }
}

/// Immutable, process-wide search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTopology {
    /// Public category name -> internal collection name
    pub categories: BTreeMap<String, String>,

    /// Internal collection name -> search profile
    pub profiles: BTreeMap<String, CollectionProfile>,

    /// Internal collection name -> search index definition
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexDefinition>,

    #[serde(default)]
    pub settings: SearchSettings,
}

impl SearchTopology {
    /// Internal collection name for a public category
    pub fn internal_for(&self, public: &str) -> Option<&str> {
        self.categories.get(public).map(String::as_str)
    }

    /// Public category name for an internal collection
    pub fn public_for(&self, internal: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, collection)| collection.as_str() == internal)
            .map(|(public, _)| public.as_str())
    }

    /// Search profile for an internal collection
    pub fn profile(&self, collection: &str) -> Option<&CollectionProfile> {
        self.profiles.get(collection)
    }

    /// Index definition for an internal collection
    pub fn index(&self, collection: &str) -> Option<&IndexDefinition> {
        self.indexes.get(collection)
    }

    /// All recognized public category names
    pub fn public_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }
}

fn default_limit() -> usize {
    50
}

fn default_max_results() -> usize {
    100
}

fn default_max_highlight_passages() -> u32 {
    5
}
