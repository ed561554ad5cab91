//! Request and response models for the search API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

/// Fixed tag identifying the ranking technique family for every result.
pub const MATCH_TYPE: &str = "atlas_search";

/// Inbound search request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchRequest {
    /// Opaque tenant identifier
    #[serde(rename = "teamId")]
    pub team_id: String,

    /// Search query text
    #[validate(length(min = 1))]
    pub query: String,

    /// Public category names to search, in request order
    #[validate(length(min = 1))]
    pub categories: Vec<String>,

    /// Maximum number of results to return; the configured default applies
    /// when absent
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

/// A single search result.
///
/// The core record is fixed (id, category, score, match type); everything a
/// collection additionally declares as returnable lands in the bounded
/// `fields` extension map and is flattened into the response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// String identifier of the matched document
    pub id: String,

    /// Public category name
    pub category: String,

    /// Relevance score assigned by the store's ranking oracle
    pub score: f64,

    /// Ranking technique family, always [`MATCH_TYPE`]
    pub match_type: String,

    /// Highlight spans supplied by the ranking oracle, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Value>,

    /// Collection-specific returnable fields, including the resolved
    /// display `name`. Absent or empty values are omitted entirely.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, category: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            score,
            match_type: MATCH_TYPE.to_string(),
            highlights: None,
            fields: BTreeMap::new(),
        }
    }
}

/// Search response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Tenant identifier that was searched
    #[serde(rename = "teamId")]
    pub team_id: String,

    /// The original search query, echoed back
    pub query: String,

    /// Globally ranked results, already limited
    pub results: Vec<SearchResult>,

    /// Aggregate match count across searched categories, capped at the
    /// request limit once truncation occurs
    pub total: u64,

    /// Public category names actually queried
    pub categories_searched: Vec<String>,

    /// Elapsed wall time in milliseconds
    pub search_time_ms: f64,
}
