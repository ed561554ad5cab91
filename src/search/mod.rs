//! Search aggregation engine
//!
//! Translates a multi-category search request into collection-specific
//! compound search queries, executes them concurrently against the document
//! store, and merges the per-collection hits into a single globally ranked
//! result set:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              SearchService                        │
//! ├──────────────────────────────────────────────────┤
//! │  validate → map categories → fan out → merge     │
//! └──────────────────────────────────────────────────┘
//!          │                              ▲
//!          ▼                              │
//! ┌──────────────────┐          ┌──────────────────┐
//! │  CategoryMapper  │          │ CollectionSearcher│
//! │  public↔internal │          │  query + normalize│
//! └──────────────────┘          └──────────────────┘
//!                                        │
//!                                        ▼
//!                               ┌──────────────────┐
//!                               │  DocumentStore   │
//!                               │  (ranking oracle)│
//!                               └──────────────────┘
//! ```
//!
//! The [`IndexLifecycleManager`] reconciles the search index definitions the
//! queries depend on, once, before the service accepts traffic.

mod category;
mod collection;
mod error;
mod index;
mod profile;
mod query;
mod service;
mod store;

pub use category::CategoryMapper;
pub use collection::{CollectionOutcome, CollectionSearcher};
pub use error::SearchError;
pub use index::{FieldMapping, FieldMappingKind, IndexDefinition, IndexLifecycleManager, IndexMappings, UpsertAction};
pub use profile::{
    CollectionProfile, FieldStrategy, FuzzyOptions, MatchKind, SearchSettings, SearchTopology,
    TenantKeyKind, TenantScope,
};
pub use query::{
    ClauseOperator, CompoundQuery, HighlightSpec, QueryBuilder, ShouldClause, TenantFilter,
    TenantValue,
};
pub use service::SearchService;
pub use store::{
    create_store, CollectionHits, DocumentStore, MemoryStore, ScoredDocument,
};
