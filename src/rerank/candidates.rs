//! Per-candidate vector-set materialization.
//!
//! Three modes exist, chosen once per run by configuration:
//! - stored centroids (the compressed field written at index time),
//! - live per-document clustering at similarity time,
//! - grouping by the global vocabulary cluster index.
//!
//! A candidate resolving zero embeddings materializes as an empty set; the
//! measures score that as 0 and the candidate sinks to the bottom.

use crate::error::{RerankError, RerankResult};
use crate::wordvec::types::centroid;
use crate::wordvec::{VectorSet, VocabClusterIndex, WordEmbeddings, WordVec, codec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Narrow read interface onto the lexical collaborator's per-document data.
pub trait DocStore: Send + Sync {
    /// Stored centroid payload written at index time, if any.
    fn stored_centroids(&self, docid: &str) -> RerankResult<Option<Vec<u8>>>;

    /// The document's analyzed term vector: (term, frequency).
    fn doc_terms(&self, docid: &str) -> RerankResult<Vec<(String, u32)>>;
}

/// How a document's words collapse into set members under vocabulary
/// grouping. Exactly one policy is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SetFormationPolicy {
    /// Group words by their global vocabulary cluster id.
    #[default]
    Cluster,
    /// Collapse all of a document's words into a single centroid.
    One,
    /// Every distinct word is its own singleton cluster (no compression).
    All,
}

/// Per-candidate materialization mode.
#[derive(Debug, Clone, Copy)]
pub enum CandidateMode {
    /// Decode the centroid field stored at index time.
    Stored { compressed: bool },
    /// Re-cluster the document's terms at similarity time.
    LiveClustering { num_clusters: usize, seed: Option<u64> },
    /// Group terms by the vocabulary cluster index under the active policy.
    VocabGrouping { policy: SetFormationPolicy },
}

/// Builds the vector set for one candidate document.
///
/// `vocab` is only consulted in vocabulary-grouping mode with the `cluster`
/// policy; passing it is a configuration-time invariant checked by the
/// pipeline.
pub fn build_candidate_set(
    docid: &str,
    mode: CandidateMode,
    store: &dyn DocStore,
    embeddings: &WordEmbeddings,
    vocab: Option<&VocabClusterIndex>,
) -> RerankResult<VectorSet> {
    match mode {
        CandidateMode::Stored { compressed } => {
            let Some(bytes) = store.stored_centroids(docid)? else {
                return Ok(VectorSet::from_groups(docid, HashMap::new()));
            };
            let payload = if compressed {
                codec::decompress(&bytes).map_err(|e| RerankError::CorruptCentroids {
                    docid: docid.to_string(),
                    reason: e.to_string(),
                })?
            } else {
                String::from_utf8(bytes).map_err(|e| RerankError::CorruptCentroids {
                    docid: docid.to_string(),
                    reason: e.to_string(),
                })?
            };
            VectorSet::from_stored(docid, &payload).map_err(|e| RerankError::CorruptCentroids {
                docid: docid.to_string(),
                reason: e.to_string(),
            })
        }

        CandidateMode::LiveClustering { num_clusters, seed } => {
            let terms = store.doc_terms(docid)?;
            let set = set_from_terms(docid, &terms, embeddings);
            if set.is_empty() {
                return Ok(set);
            }
            let centroids = set
                .cluster_centroids(num_clusters, seed)
                .map_err(|e| RerankError::General(format!("clustering '{docid}' failed: {e}")))?;
            let members = centroids
                .into_iter()
                .map(|wv| (wv.word().to_string(), wv))
                .collect();
            Ok(VectorSet::from_groups(docid, members))
        }

        CandidateMode::VocabGrouping { policy } => {
            let terms = store.doc_terms(docid)?;
            Ok(group_by_policy(docid, &terms, policy, embeddings, vocab))
        }
    }
}

fn set_from_terms(
    docid: &str,
    terms: &[(String, u32)],
    embeddings: &WordEmbeddings,
) -> VectorSet {
    let mut members = HashMap::new();
    for (term, _freq) in terms {
        if members.contains_key(term.as_str()) {
            continue;
        }
        if let Some(wv) = embeddings.lookup(term) {
            members.insert(term.clone(), wv.clone());
        }
    }
    VectorSet::from_groups(docid, members)
}

/// Groups a document's terms per the active policy and computes one
/// centroid per non-empty group.
fn group_by_policy(
    docid: &str,
    terms: &[(String, u32)],
    policy: SetFormationPolicy,
    embeddings: &WordEmbeddings,
    vocab: Option<&VocabClusterIndex>,
) -> VectorSet {
    let mut groups: HashMap<u32, Vec<WordVec>> = HashMap::new();
    let mut seen = std::collections::HashSet::new();
    let mut word_id = 0u32;

    for (term, _freq) in terms {
        if !seen.insert(term.clone()) {
            continue;
        }
        word_id += 1;

        let group_key = match policy {
            SetFormationPolicy::All => word_id,
            SetFormationPolicy::One => 0,
            SetFormationPolicy::Cluster => {
                // Words without a global cluster id are skipped
                match vocab.and_then(|v| v.cluster_id_of(term)) {
                    Some(id) => id,
                    None => continue,
                }
            }
        };

        let Some(wv) = embeddings.lookup(term) else {
            continue;
        };
        groups.entry(group_key).or_default().push(wv.clone());
    }

    let members = groups
        .into_iter()
        .filter_map(|(key, vecs)| {
            let refs: Vec<&WordVec> = vecs.iter().collect();
            centroid(format!("Cluster_{key}"), &refs).map(|c| (c.word().to_string(), c))
        })
        .collect();

    VectorSet::from_groups(docid, members)
}
