//! Analysis domain - enriches approved content and runs the full pipeline.
//!
//! ```text
//! FULL_ANALYSIS
//!     ├─► extract entities     (hard fail)
//!     ├─► generate embeddings  (hard fail)
//!     ├─► cluster topics       (soft fail, skipped below 6 embedded items)
//!     └─► compute score        (always)
//! ```

pub mod actions;
pub mod jobs;

pub use actions::{
    cluster_topics, extract_entities, full_analysis, generate_embeddings, ClusterSummary,
    EmbedSummary, ExtractSummary, FullAnalysisSummary, EMBEDDING_DIMENSIONS,
    EMBED_BATCH_SIZE, EXTRACTION_LIMIT, MIN_ITEMS_FOR_CLUSTERING,
};
