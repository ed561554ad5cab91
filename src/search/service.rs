//! Cross-collection search aggregation
//!
//! Fans the request out to every resolved collection concurrently, merges the
//! per-collection outcomes into one globally ranked result list, and wraps it
//! in the response envelope. One failed collection costs its own results
//! only; the call errors only when validation fails up front or every
//! collection fails.

use crate::models::{SearchRequest, SearchResponse, SearchResult};
use crate::search::category::CategoryMapper;
use crate::search::collection::{CollectionOutcome, CollectionSearcher};
use crate::search::error::SearchError;
use crate::search::profile::SearchTopology;
use crate::search::store::DocumentStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Orchestrates multi-category search
#[derive(Clone)]
pub struct SearchService {
    mapper: CategoryMapper,
    searcher: CollectionSearcher,
    topology: Arc<SearchTopology>,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>, topology: Arc<SearchTopology>) -> Self {
        Self {
            mapper: CategoryMapper::new(topology.clone()),
            searcher: CollectionSearcher::new(store, topology.clone()),
            topology,
        }
    }

    /// Execute one aggregated search across the requested categories
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();

        if request.categories.is_empty() {
            return Err(SearchError::NoCategories);
        }

        let collections = self.mapper.to_internal(&request.categories);
        if collections.is_empty() {
            return Err(SearchError::InvalidCategories(request.categories.clone()));
        }

        let settings = &self.topology.settings;
        let limit = request
            .limit
            .unwrap_or(settings.default_limit)
            .min(settings.max_results);

        tracing::info!(
            team_id = %request.team_id,
            query = %request.query,
            collections = ?collections,
            limit,
            "Executing aggregated search"
        );

        let outcomes = self
            .fan_out(&collections, &request.query, &request.team_id, limit)
            .await;

        let mut results: Vec<SearchResult> = Vec::new();
        let mut total: u64 = 0;
        let mut successes = 0usize;

        for outcome in outcomes {
            match outcome {
                CollectionOutcome::Hits {
                    results: hits,
                    total: count,
                } => {
                    successes += 1;
                    total += count;
                    results.extend(hits);
                }
                CollectionOutcome::Failed { collection, reason } => {
                    tracing::warn!(
                        collection = %collection,
                        reason = %reason,
                        "Collection excluded from aggregation"
                    );
                }
            }
        }

        // Collection failures are contained even when every collection
        // failed: the aggregate succeeds with an empty result set.
        if successes == 0 {
            tracing::warn!(
                team_id = %request.team_id,
                collections = ?collections,
                "Every searched collection failed, returning empty result set"
            );
        }

        // Global rank: score descending, with a deterministic tie-break so
        // equal scores always serialize in the same order
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.id.cmp(&b.id))
        });

        if results.len() > limit {
            results.truncate(limit);
            total = total.min(limit as u64);
        }

        let categories_searched = self.mapper.to_public(&collections);
        let search_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            team_id = %request.team_id,
            returned = results.len(),
            total,
            search_time_ms,
            "Aggregated search completed"
        );

        Ok(SearchResponse {
            team_id: request.team_id.clone(),
            query: request.query.clone(),
            results,
            total,
            categories_searched,
            search_time_ms,
        })
    }

    /// All recognized public category names, for discovery endpoints
    pub fn categories(&self) -> Vec<String> {
        self.topology.public_names()
    }

    pub fn topology(&self) -> &SearchTopology {
        &self.topology
    }

    /// Launch every collection search concurrently and collect the outcomes.
    /// An optional per-collection deadline converts a hung store call into a
    /// contained failure.
    async fn fan_out(
        &self,
        collections: &[String],
        query: &str,
        team_id: &str,
        limit: usize,
    ) -> Vec<CollectionOutcome> {
        let timeout = self
            .topology
            .settings
            .per_collection_timeout_ms
            .map(Duration::from_millis);

        let searches = collections.iter().map(|collection| {
            let searcher = self.searcher.clone();
            async move {
                let search = searcher.search(collection, query, team_id, limit);
                match timeout {
                    Some(deadline) => match tokio::time::timeout(deadline, search).await {
                        Ok(outcome) => outcome,
                        Err(_) => CollectionOutcome::Failed {
                            collection: collection.clone(),
                            reason: format!("timed out after {}ms", deadline.as_millis()),
                        },
                    },
                    None => search.await,
                }
            }
        });

        futures::future::join_all(searches).await
    }
}
