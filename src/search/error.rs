//! Error types for search operations

use crate::error::AppError;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No categories supplied with the request
    #[error("At least one category is required for search")]
    NoCategories,

    /// None of the supplied categories are recognized
    #[error("Invalid categories provided: {0:?}. Please use valid category names.")]
    InvalidCategories(Vec<String>),

    /// A store-level request failed
    #[error("Store request failed: {0}")]
    StoreFailed(String),

    /// Listing existing search indexes failed
    #[error("Could not list search indexes for collection '{collection}': {reason}")]
    IndexListFailed { collection: String, reason: String },

    /// Creating a search index failed
    #[error("Failed to create search index '{index}' on '{collection}': {reason}")]
    IndexCreateFailed {
        collection: String,
        index: String,
        reason: String,
    },

    /// Updating a search index failed
    #[error("Failed to update search index '{index}' on '{collection}': {reason}")]
    IndexUpdateFailed {
        collection: String,
        index: String,
        reason: String,
    },

    /// One or more enabled index upserts failed at startup
    #[error("Search index upsert failed for {failed} of {total} enabled collections")]
    IndexUpsertFailed { failed: usize, total: usize },
}

/// Validation errors keep their specific, user-actionable message; anything
/// touching the store surfaces as a generic failure so storage topology
/// (collection and index names) never leaks to the caller.
impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NoCategories | SearchError::InvalidCategories(_) => {
                AppError::Validation(err.to_string())
            }
            _ => AppError::Internal("Search failed".to_string()),
        }
    }
}
