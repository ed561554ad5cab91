//! Multi-category full-text search aggregation service.
//!
//! Translates a generic search request into collection-specific compound
//! search queries, fans them out concurrently against a document store,
//! merges and ranks the results, and manages the search index definitions
//! the queries depend on.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
