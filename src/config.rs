//! Layered run configuration.
//!
//! Settings merge three sources, later layers winning:
//! - built-in defaults
//! - a TOML file (`vecrank.toml` by default, overridable per call)
//! - environment variables prefixed `VECRANK_`, with double underscores
//!   separating nested levels: `VECRANK_RERANK__TEXT_WEIGHT=0.4` sets
//!   `rerank.text_weight`.

use crate::rerank::SetFormationPolicy;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "vecrank.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Path to the lexical index directory
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode (verbose tracing)
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Word-embedding source
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Collection indexing behavior
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// First-stage retrieval parameters
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Second-stage reranking parameters
    #[serde(default)]
    pub rerank: RerankConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingsConfig {
    /// Word2vec-format text file: one `word c0 c1 ... cd` line per word
    #[serde(default = "default_embeddings_path")]
    pub path: PathBuf,

    /// Size of the global vocabulary cluster index; 0 disables it
    #[serde(default = "default_vocab_clusters")]
    pub vocab_clusters: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Number of centroids stored per document
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,

    /// Compress the stored centroid payload with lz4
    #[serde(default = "default_true")]
    pub compress: bool,

    /// Cluster and store document centroids at index time
    #[serde(default = "default_true")]
    pub store_centroids: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Final result count per query
    #[serde(default = "default_num_wanted")]
    pub num_wanted: usize,

    /// Extra candidates fetched beyond num_wanted before reranking
    #[serde(default = "default_rerank_slack")]
    pub rerank_slack: usize,

    /// Run tag written into the TREC run file
    #[serde(default = "default_run_name")]
    pub run_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RerankConfig {
    /// Apply the vector-set rerank; false passes the lexical list through
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Measure name: single-link, complete-link, centroid-link,
    /// grpavg-link, hausdorff
    #[serde(default = "default_measure")]
    pub measure: String,

    /// Weight of the normalized lexical score in the blend (0..=1)
    #[serde(default = "default_text_weight")]
    pub text_weight: f32,

    /// Candidate set source: stored, live, or vocab
    #[serde(default = "default_candidate_source")]
    pub candidate_source: String,

    /// Grouping policy under the vocab candidate source
    #[serde(default)]
    pub set_formation: SetFormationPolicy,

    /// IDF-weight the centroid-link measure
    #[serde(default = "default_false")]
    pub idf_weighting: bool,

    /// Fixed clustering seed for reproducible runs; unset seeds from the OS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clustering_seed: Option<u64>,
}

fn default_index_path() -> PathBuf {
    PathBuf::from(".vecrank/index")
}

fn default_embeddings_path() -> PathBuf {
    PathBuf::from("vectors.txt")
}

fn default_vocab_clusters() -> usize {
    0
}

fn default_num_clusters() -> usize {
    5
}

fn default_num_wanted() -> usize {
    1000
}

fn default_rerank_slack() -> usize {
    100
}

fn default_run_name() -> String {
    "vecrank".to_string()
}

fn default_measure() -> String {
    "centroid-link".to_string()
}

fn default_text_weight() -> f32 {
    0.5
}

fn default_candidate_source() -> String {
    "stored".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            debug: false,
            embeddings: EmbeddingsConfig::default(),
            indexing: IndexingConfig::default(),
            retrieval: RetrievalConfig::default(),
            rerank: RerankConfig::default(),
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            path: default_embeddings_path(),
            vocab_clusters: default_vocab_clusters(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            num_clusters: default_num_clusters(),
            compress: true,
            store_centroids: true,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            num_wanted: default_num_wanted(),
            rerank_slack: default_rerank_slack(),
            run_name: default_run_name(),
        }
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            measure: default_measure(),
            text_weight: default_text_weight(),
            candidate_source: default_candidate_source(),
            set_formation: SetFormationPolicy::default(),
            idf_weighting: false,
            clustering_seed: None,
        }
    }
}

impl Settings {
    /// Load configuration from defaults, the default TOML file, and the
    /// environment.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration layering a specific TOML file.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VECRANK_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }
}
