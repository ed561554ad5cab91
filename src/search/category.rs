//! Bidirectional translation between public category names and internal
//! collection names. Pure and stateless; unknown names are dropped with a
//! warning rather than failing the whole call.

use crate::search::profile::SearchTopology;
use std::collections::HashSet;
use std::sync::Arc;

/// Maps public category names to internal collection names and back
#[derive(Clone)]
pub struct CategoryMapper {
    topology: Arc<SearchTopology>,
}

impl CategoryMapper {
    pub fn new(topology: Arc<SearchTopology>) -> Self {
        Self { topology }
    }

    /// Translate public category names to internal collection names.
    ///
    /// Preserves input order, deduplicates keeping the first occurrence, and
    /// drops unrecognized names with a warning.
    pub fn to_internal(&self, public: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut collections = Vec::new();

        for name in public {
            match self.topology.internal_for(name) {
                Some(collection) => {
                    if seen.insert(collection.to_string()) {
                        collections.push(collection.to_string());
                    }
                }
                None => {
                    tracing::warn!(category = %name, "Invalid category requested (skipping)");
                }
            }
        }

        collections
    }

    /// Translate internal collection names back to public category names,
    /// dropping names absent from the reverse mapping.
    pub fn to_public(&self, internal: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut categories = Vec::new();

        for collection in internal {
            match self.topology.public_for(collection) {
                Some(public) => {
                    if seen.insert(public.to_string()) {
                        categories.push(public.to_string());
                    }
                }
                None => {
                    tracing::warn!(collection = %collection, "Collection not found in category mapping");
                }
            }
        }

        categories
    }

    /// Public name for a single internal collection, falling back to the
    /// collection name itself when unmapped.
    pub fn public_or_internal(&self, collection: &str) -> String {
        self.topology
            .public_for(collection)
            .unwrap_or(collection)
            .to_string()
    }
}
