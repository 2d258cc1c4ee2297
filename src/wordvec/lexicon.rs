//! Word-embedding lookup service and the optional vocabulary cluster index.
//!
//! Both are built once at startup and read-only afterwards. They are plain
//! values passed by reference (or `Arc`) to whatever needs them; there is no
//! ambient global state.

use crate::error::{RerankError, RerankResult};
use crate::wordvec::clustering::kmeans_clustering;
use crate::wordvec::types::{VectorDimension, WordVec};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// In-memory word → embedding lookup, loaded from a word2vec-style text
/// file: one `word v1 v2 ... vd` line per vocabulary entry.
///
/// Words absent from the vocabulary are not errors anywhere downstream;
/// callers get `None` and skip.
pub struct WordEmbeddings {
    vectors: HashMap<String, WordVec>,
    dimension: VectorDimension,
}

impl WordEmbeddings {
    /// Loads the lexicon from a text file. Fatal if the file is unreadable,
    /// empty, or has inconsistent dimensions.
    pub fn load(path: &Path) -> RerankResult<Self> {
        let file = File::open(path).map_err(|e| RerankError::EmbeddingsUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut vectors = HashMap::new();
        let mut dimension: Option<usize> = None;

        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| RerankError::EmbeddingsUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let word = match fields.next() {
                Some(w) => w.to_string(),
                None => continue,
            };
            let coords: Vec<f32> = fields
                .map(|f| {
                    f.parse::<f32>()
                        .map_err(|_| RerankError::EmbeddingsUnavailable {
                            path: path.to_path_buf(),
                            reason: format!("malformed coordinate on line {}", lineno + 1),
                        })
                })
                .collect::<RerankResult<_>>()?;

            match dimension {
                None => dimension = Some(coords.len()),
                Some(d) if d != coords.len() => {
                    return Err(RerankError::EmbeddingsUnavailable {
                        path: path.to_path_buf(),
                        reason: format!(
                            "inconsistent dimension on line {}: expected {}, got {}",
                            lineno + 1,
                            d,
                            coords.len()
                        ),
                    });
                }
                Some(_) => {}
            }

            vectors.insert(word.clone(), WordVec::new(word, coords));
        }

        let dim = dimension.ok_or_else(|| RerankError::EmbeddingsUnavailable {
            path: path.to_path_buf(),
            reason: "file contains no vectors".to_string(),
        })?;
        let dimension =
            VectorDimension::new(dim).map_err(|e| RerankError::EmbeddingsUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(
            words = vectors.len(),
            dimension = dimension.get(),
            "loaded word embeddings"
        );

        Ok(Self { vectors, dimension })
    }

    /// Builds a lexicon directly from vectors. Used by tests and tools that
    /// synthesize small vocabularies.
    pub fn from_vectors(entries: Vec<WordVec>) -> RerankResult<Self> {
        let dim = entries
            .first()
            .map(|wv| wv.dimension())
            .ok_or_else(|| RerankError::General("empty embedding set".to_string()))?;
        let dimension = VectorDimension::new(dim)
            .map_err(|e| RerankError::General(e.to_string()))?;
        let vectors = entries
            .into_iter()
            .map(|wv| (wv.word().to_string(), wv))
            .collect();
        Ok(Self { vectors, dimension })
    }

    /// O(1) vocabulary lookup; `None` for out-of-vocabulary words.
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<&WordVec> {
        self.vectors.get(word)
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Iterates over the vocabulary in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &WordVec> {
        self.vectors.values()
    }
}

/// Precomputed global word → cluster-id assignment, the alternative to
/// per-document clustering. Built once by clustering the whole vocabulary;
/// read-only for the lifetime of a run.
pub struct VocabClusterIndex {
    assignments: HashMap<String, u32>,
    num_clusters: usize,
}

impl VocabClusterIndex {
    /// Clusters the entire vocabulary into `num_clusters` groups.
    ///
    /// This is the expensive one-time step of the global mode; per-document
    /// grouping afterwards is a hash lookup per term.
    pub fn build(
        embeddings: &WordEmbeddings,
        num_clusters: usize,
        seed: Option<u64>,
    ) -> RerankResult<Self> {
        // Sorted so a fixed seed yields the same assignments on every build
        let mut words: Vec<&WordVec> = embeddings.iter().collect();
        words.sort_by(|a, b| a.word().cmp(b.word()));
        let k = num_clusters.min(words.len());
        if k == 0 {
            return Err(RerankError::ConfigError {
                reason: "vocabulary clustering requested with an empty vocabulary".to_string(),
            });
        }

        info!(
            vocabulary = words.len(),
            clusters = k,
            "building vocabulary cluster index"
        );

        let vectors: Vec<Vec<f32>> = words.iter().map(|w| w.coords().to_vec()).collect();
        let result = kmeans_clustering(&vectors, k, seed)
            .map_err(|e| RerankError::General(format!("vocabulary clustering failed: {e}")))?;

        let assignments = words
            .iter()
            .zip(result.assignments.iter())
            .map(|(w, &c)| (w.word().to_string(), c as u32))
            .collect();

        Ok(Self {
            assignments,
            num_clusters: k,
        })
    }

    /// Stable cluster id for a vocabulary word; `None` for unknown or
    /// unassigned words, which callers must skip.
    #[must_use]
    pub fn cluster_id_of(&self, word: &str) -> Option<u32> {
        self.assignments.get(word).copied()
    }

    #[must_use]
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn axis_lexicon() -> WordEmbeddings {
        WordEmbeddings::from_vectors(vec![
            WordVec::new("north", vec![1.0, 0.0]),
            WordVec::new("south", vec![0.9, 0.1]),
            WordVec::new("east", vec![0.0, 1.0]),
            WordVec::new("west", vec![0.1, 0.9]),
        ])
        .unwrap()
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat 0.1 0.2 0.3").unwrap();
        writeln!(file, "dog 0.2 0.1 0.4").unwrap();
        file.flush().unwrap();

        let lex = WordEmbeddings::load(file.path()).unwrap();
        assert_eq!(lex.len(), 2);
        assert_eq!(lex.dimension().get(), 3);
        assert!(lex.lookup("cat").is_some());
        assert!(lex.lookup("bird").is_none());
    }

    #[test]
    fn test_load_rejects_inconsistent_dimension() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat 0.1 0.2").unwrap();
        writeln!(file, "dog 0.2 0.1 0.4").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            WordEmbeddings::load(file.path()),
            Err(RerankError::EmbeddingsUnavailable { .. })
        ));
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(WordEmbeddings::load(file.path()).is_err());
    }

    #[test]
    fn test_vocab_cluster_index() {
        let lex = axis_lexicon();
        let index = VocabClusterIndex::build(&lex, 2, Some(11)).unwrap();

        assert_eq!(index.num_clusters(), 2);
        // Words near the same axis share a cluster
        assert_eq!(
            index.cluster_id_of("north"),
            index.cluster_id_of("south")
        );
        assert_eq!(index.cluster_id_of("east"), index.cluster_id_of("west"));
        assert_ne!(index.cluster_id_of("north"), index.cluster_id_of("east"));
        assert_eq!(index.cluster_id_of("unknown"), None);
    }

    #[test]
    fn test_vocab_cluster_index_reproducible_for_fixed_seed() {
        // Two lexicons with the same vocabulary inserted in opposite order
        let forward = axis_lexicon();
        let backward = WordEmbeddings::from_vectors(vec![
            WordVec::new("west", vec![0.1, 0.9]),
            WordVec::new("east", vec![0.0, 1.0]),
            WordVec::new("south", vec![0.9, 0.1]),
            WordVec::new("north", vec![1.0, 0.0]),
        ])
        .unwrap();

        let a = VocabClusterIndex::build(&forward, 2, Some(11)).unwrap();
        let b = VocabClusterIndex::build(&backward, 2, Some(11)).unwrap();
        for word in ["north", "south", "east", "west"] {
            assert_eq!(a.cluster_id_of(word), b.cluster_id_of(word));
        }
    }

    #[test]
    fn test_vocab_cluster_index_clamps_k() {
        let lex = axis_lexicon();
        let index = VocabClusterIndex::build(&lex, 100, Some(1)).unwrap();
        assert_eq!(index.num_clusters(), 4);
    }
}
