mod cluster_topics;
mod extract_entities;
mod full_analysis;
mod generate_embeddings;

pub use cluster_topics::{cluster_topics, ClusterSummary, MIN_ITEMS_FOR_CLUSTERING};
pub use extract_entities::{extract_entities, ExtractSummary, EXTRACTION_LIMIT};
pub use full_analysis::{full_analysis, FullAnalysisSummary};
pub use generate_embeddings::{
    generate_embeddings, EmbedSummary, EMBEDDING_DIMENSIONS, EMBED_BATCH_SIZE,
};
