//! Vector-set similarity reranking for lexical retrieval runs.
//!
//! A first-stage tantivy search produces a top-N candidate list per query;
//! the reranker scores each candidate again as a set of word-embedding
//! vectors, blends the two normalized signals, and emits a TREC run file.

pub mod config;
pub mod error;
pub mod lexical;
pub mod rerank;
pub mod trec;
pub mod wordvec;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{ErrorContext, RerankError, RerankResult};
pub use lexical::{DocumentIndex, IndexOptions, analyze};
pub use rerank::{
    CandidateMode, DocStore, Reranker, ScoredDoc, SetFormationPolicy, SetSimilarityMeasure,
    TermStats, create_measure,
};
pub use trec::{TrecQuery, read_queries, save_run_file};
pub use wordvec::{VectorSet, VocabClusterIndex, WordEmbeddings, WordVec};
