//! Compound search query building
//!
//! A [`QueryBuilder`] turns a raw query string, a collection's search profile
//! and the tenant identifier into a [`CompoundQuery`]: a store-agnostic
//! descriptor with a tenant filter, a list of weighted should-clauses and a
//! bounded highlight specification. The descriptor knows how to render itself
//! to the store-native aggregation pipeline, so backends carry no query
//! knowledge of their own.

use crate::search::profile::{CollectionProfile, FuzzyOptions, MatchKind};
use serde_json::{json, Map, Value};

/// Tenant filter value, typed to match the scope field's storage form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantValue {
    /// Plain string comparison
    Text(String),
    /// Binary object identifier, held as its 24-char hex form
    ObjectId(String),
}

/// Equality constraint on the tenant-scope field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFilter {
    pub path: String,
    pub value: TenantValue,
}

/// Ranking technique of one should-clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseOperator {
    Autocomplete,
    Text,
    Term,
}

/// One weighted matching contribution
#[derive(Debug, Clone, PartialEq)]
pub struct ShouldClause {
    pub path: String,
    pub operator: ClauseOperator,
    pub query: String,
    pub boost: Option<f64>,
    pub fuzzy: Option<FuzzyOptions>,
}

/// Field paths eligible for highlighting, bounded per field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpec {
    pub paths: Vec<String>,
    pub max_passages: u32,
}

/// A collection-specific compound search query.
///
/// A document is a hit when the tenant filter matches and, if any
/// should-clause is present, at least one should-clause matches. An empty
/// should list is the "list everything for this tenant" degenerate form.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundQuery {
    pub index_name: String,
    pub tenant_filter: TenantFilter,
    pub should: Vec<ShouldClause>,
    pub highlight: Option<HighlightSpec>,
}

/// Builds compound queries for one collection
pub struct QueryBuilder<'a> {
    profile: &'a CollectionProfile,
    index_name: &'a str,
    max_highlight_passages: u32,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        profile: &'a CollectionProfile,
        index_name: &'a str,
        max_highlight_passages: u32,
    ) -> Self {
        Self {
            profile,
            index_name,
            max_highlight_passages,
        }
    }

    /// Build the compound query for a raw query string and tenant value
    pub fn build(&self, raw_query: &str, team_id: &str) -> CompoundQuery {
        let clean_query = raw_query.trim();

        let tenant_filter = self.build_tenant_filter(team_id);
        let should = if clean_query.is_empty() {
            Vec::new()
        } else {
            self.build_should_clauses(clean_query)
        };
        let highlight = self.build_highlight(&should);

        CompoundQuery {
            index_name: self.index_name.to_string(),
            tenant_filter,
            should,
            highlight,
        }
    }

    /// Equality constraint on the tenant-scope field. When the scope field
    /// holds binary object identifiers and the tenant string does not parse
    /// as one, the filter degrades to a raw string comparison: an unmatched
    /// filter yields zero results, never wrong ones.
    fn build_tenant_filter(&self, team_id: &str) -> TenantFilter {
        let scope = &self.profile.tenant_scope;
        let value = match scope.kind {
            crate::search::profile::TenantKeyKind::String => {
                TenantValue::Text(team_id.to_string())
            }
            crate::search::profile::TenantKeyKind::ObjectId => {
                if is_object_id(team_id) {
                    TenantValue::ObjectId(team_id.to_ascii_lowercase())
                } else {
                    tracing::warn!(
                        field = %scope.field,
                        "Tenant id is not a valid object id, falling back to string comparison"
                    );
                    TenantValue::Text(team_id.to_string())
                }
            }
        };

        TenantFilter {
            path: scope.field.clone(),
            value,
        }
    }

    fn build_should_clauses(&self, clean_query: &str) -> Vec<ShouldClause> {
        let tenant_field = self.profile.tenant_scope.field.as_str();
        let mut clauses = Vec::new();

        for strategy in &self.profile.strategies {
            // The tenant field is for filtering, not searching
            if strategy.path == tenant_field {
                tracing::debug!(path = %strategy.path, "Skipping tenant field strategy");
                continue;
            }

            let (operator, fuzzy) = match strategy.match_kind {
                MatchKind::Autocomplete => (ClauseOperator::Autocomplete, strategy.fuzzy),
                MatchKind::Text => (ClauseOperator::Text, strategy.fuzzy),
                // Fuzzy parameters are meaningless for exact-term matching
                MatchKind::Keyword => (ClauseOperator::Term, None),
            };

            clauses.push(ShouldClause {
                path: strategy.path.clone(),
                operator,
                query: clean_query.to_string(),
                boost: strategy.boost,
                fuzzy,
            });
        }

        clauses
    }

    fn build_highlight(&self, should: &[ShouldClause]) -> Option<HighlightSpec> {
        if should.is_empty() {
            return None;
        }

        let mut paths: Vec<String> = Vec::new();
        for clause in should {
            if !paths.contains(&clause.path) {
                paths.push(clause.path.clone());
            }
        }

        Some(HighlightSpec {
            paths,
            max_passages: self.max_highlight_passages,
        })
    }
}

impl CompoundQuery {
    /// Render the store-native aggregation pipeline: a `$search` stage (when
    /// there is anything to rank), the tenant `$match`, score/highlight
    /// capture, the projection and a single `$facet` stage that returns the
    /// top hits and the total match count in one round trip.
    pub fn to_pipeline(&self, projection: &[String], limit: usize) -> Vec<Value> {
        let mut pipeline = Vec::new();

        if !self.should.is_empty() {
            pipeline.push(json!({ "$search": self.search_stage() }));
        }

        let mut match_body = Map::new();
        match_body.insert(
            self.tenant_filter.path.clone(),
            self.tenant_filter.value.to_wire(),
        );
        pipeline.push(json!({ "$match": Value::Object(match_body) }));

        if !self.should.is_empty() {
            pipeline.push(json!({
                "$addFields": {
                    "searchScore": { "$meta": "searchScore" },
                    "searchHighlights": { "$meta": "searchHighlights" },
                }
            }));
        }

        let mut project = Map::new();
        for field in projection {
            project.insert(field.clone(), json!(1));
        }
        project.entry("_id".to_string()).or_insert(json!(1));
        project.insert("searchScore".to_string(), json!(1));
        project.insert("searchHighlights".to_string(), json!(1));
        pipeline.push(json!({ "$project": Value::Object(project) }));

        pipeline.push(json!({
            "$facet": {
                "hits": [ { "$limit": limit } ],
                "total": [ { "$count": "count" } ],
            }
        }));

        pipeline
    }

    fn search_stage(&self) -> Value {
        let should: Vec<Value> = self.should.iter().map(ShouldClause::to_wire).collect();

        let mut stage = json!({
            "index": self.index_name,
            "compound": {
                "should": should,
                "minimumShouldMatch": 1,
            }
        });

        if let Some(highlight) = &self.highlight {
            stage["highlight"] = json!({
                "path": highlight.paths,
                "maxNumPassages": highlight.max_passages,
            });
        }

        stage
    }
}

impl ShouldClause {
    fn to_wire(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), json!(self.query));
        body.insert("path".to_string(), json!(self.path));

        let operator = match self.operator {
            ClauseOperator::Autocomplete => {
                body.insert("tokenOrder".to_string(), json!("any"));
                "autocomplete"
            }
            ClauseOperator::Text => "text",
            ClauseOperator::Term => "term",
        };

        if let Some(fuzzy) = &self.fuzzy {
            body.insert(
                "fuzzy".to_string(),
                json!({
                    "maxEdits": fuzzy.max_edits,
                    "prefixLength": fuzzy.prefix_length,
                    "maxExpansions": fuzzy.max_expansions,
                }),
            );
        }

        if let Some(boost) = self.boost {
            body.insert("score".to_string(), json!({ "boost": { "value": boost } }));
        }

        let mut clause = Map::new();
        clause.insert(operator.to_string(), Value::Object(body));
        Value::Object(clause)
    }
}

impl TenantValue {
    /// Extended-JSON wire form of the filter value
    pub fn to_wire(&self) -> Value {
        match self {
            TenantValue::Text(s) => json!(s),
            TenantValue::ObjectId(hex) => json!({ "$oid": hex }),
        }
    }
}

/// A binary object identifier in string form: exactly 24 hex characters.
pub(crate) fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::profile::{
        CollectionProfile, FieldStrategy, TenantKeyKind, TenantScope,
    };

    fn profile(kind: TenantKeyKind) -> CollectionProfile {
        CollectionProfile {
            strategies: vec![
                FieldStrategy {
                    path: "name".to_string(),
                    match_kind: MatchKind::Autocomplete,
                    boost: Some(3.0),
                    fuzzy: Some(FuzzyOptions {
                        max_edits: 1,
                        prefix_length: 1,
                        max_expansions: 50,
                    }),
                },
                FieldStrategy {
                    path: "name".to_string(),
                    match_kind: MatchKind::Text,
                    boost: None,
                    fuzzy: None,
                },
                FieldStrategy {
                    path: "tags".to_string(),
                    match_kind: MatchKind::Keyword,
                    boost: None,
                    // Must be ignored for keyword matching
                    fuzzy: Some(FuzzyOptions {
                        max_edits: 2,
                        prefix_length: 0,
                        max_expansions: 10,
                    }),
                },
                FieldStrategy {
                    path: "teamId".to_string(),
                    match_kind: MatchKind::Text,
                    boost: None,
                    fuzzy: None,
                },
            ],
            returnable_fields: vec!["_id".to_string(), "name".to_string()],
            tenant_scope: TenantScope {
                field: "teamId".to_string(),
                kind,
            },
            display_field: "name".to_string(),
        }
    }

    #[test]
    fn test_clause_dispatch_by_match_kind() {
        let profile = profile(TenantKeyKind::String);
        let builder = QueryBuilder::new(&profile, "bots_search_index", 5);
        let query = builder.build("alex", "t1");

        // tenant-field strategy skipped
        assert_eq!(query.should.len(), 3);
        assert_eq!(query.should[0].operator, ClauseOperator::Autocomplete);
        assert_eq!(query.should[1].operator, ClauseOperator::Text);
        assert_eq!(query.should[2].operator, ClauseOperator::Term);
        // fuzzy dropped for exact-term matching
        assert!(query.should[2].fuzzy.is_none());
        assert_eq!(query.should[0].boost, Some(3.0));
        assert_eq!(
            query.tenant_filter.value,
            TenantValue::Text("t1".to_string())
        );
    }

    #[test]
    fn test_empty_query_is_filter_only() {
        let profile = profile(TenantKeyKind::String);
        let builder = QueryBuilder::new(&profile, "bots_search_index", 5);
        let query = builder.build("   ", "t1");

        assert!(query.should.is_empty());
        assert!(query.highlight.is_none());

        let pipeline = query.to_pipeline(&["name".to_string()], 10);
        // no $search stage: $match, $project, $facet
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0]["$match"]["teamId"], "t1");
    }

    #[test]
    fn test_object_id_tenant_parse_and_fallback() {
        let profile = profile(TenantKeyKind::ObjectId);
        let builder = QueryBuilder::new(&profile, "bots_search_index", 5);

        let query = builder.build("alex", "5F9C0A1B2C3D4E5F6A7B8C9D");
        assert_eq!(
            query.tenant_filter.value,
            TenantValue::ObjectId("5f9c0a1b2c3d4e5f6a7b8c9d".to_string())
        );
        assert_eq!(
            query.tenant_filter.value.to_wire(),
            json!({ "$oid": "5f9c0a1b2c3d4e5f6a7b8c9d" })
        );

        // not parseable: degrade to raw string, never fail
        let query = builder.build("alex", "team-1");
        assert_eq!(
            query.tenant_filter.value,
            TenantValue::Text("team-1".to_string())
        );
    }

    #[test]
    fn test_pipeline_wire_shape() {
        let profile = profile(TenantKeyKind::String);
        let builder = QueryBuilder::new(&profile, "bots_search_index", 5);
        let query = builder.build("alex", "t1");

        let pipeline = query.to_pipeline(&["_id".to_string(), "name".to_string()], 20);
        // $search, $match, $addFields, $project, $facet
        assert_eq!(pipeline.len(), 5);

        let search = &pipeline[0]["$search"];
        assert_eq!(search["index"], "bots_search_index");
        assert_eq!(search["compound"]["minimumShouldMatch"], 1);

        let autocomplete = &search["compound"]["should"][0]["autocomplete"];
        assert_eq!(autocomplete["query"], "alex");
        assert_eq!(autocomplete["path"], "name");
        assert_eq!(autocomplete["tokenOrder"], "any");
        assert_eq!(autocomplete["fuzzy"]["maxEdits"], 1);
        assert_eq!(autocomplete["score"]["boost"]["value"], 3.0);

        assert_eq!(search["highlight"]["path"], json!(["name", "tags"]));
        assert_eq!(search["highlight"]["maxNumPassages"], 5);

        assert_eq!(pipeline[1]["$match"]["teamId"], "t1");
        assert_eq!(pipeline[2]["$addFields"]["searchScore"]["$meta"], "searchScore");
        assert_eq!(pipeline[3]["$project"]["name"], 1);

        let facet = &pipeline[4]["$facet"];
        assert_eq!(facet["hits"][0]["$limit"], 20);
        assert_eq!(facet["total"][0]["$count"], "count");
    }

    #[test]
    fn test_is_object_id() {
        assert!(is_object_id("5f9c0a1b2c3d4e5f6a7b8c9d"));
        assert!(!is_object_id("team-1"));
        assert!(!is_object_id("5f9c0a1b2c3d4e5f6a7b8c9")); // 23 chars
        assert!(!is_object_id("5f9c0a1b2c3d4e5f6a7b8c9z")); // non-hex
    }
}
