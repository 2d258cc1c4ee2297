//! A document or query represented as a set of word-embedding vectors.

use crate::wordvec::clustering::{ClusteringError, density_clustering, kmeans_clustering};
use crate::wordvec::codec;
use crate::wordvec::lexicon::WordEmbeddings;
use crate::wordvec::types::WordVec;
use std::collections::HashMap;

/// A named multiset of word vectors with unique keys.
///
/// Depending on how it was built this holds the full bag of in-vocabulary
/// words of a text, the normalized terms of a query, or a handful of
/// synthetic `Cluster_i` centroids summarizing a document. Membership order
/// never matters; every similarity measure is order-independent.
///
/// Sets are transient: built once per document pass or per query, shared
/// across queries only through the persisted compressed form.
#[derive(Debug, Clone)]
pub struct VectorSet {
    id: String,
    members: HashMap<String, WordVec>,
}

impl VectorSet {
    /// Builds a set from a whitespace-delimited token stream.
    ///
    /// Tokens are deduplicated by word; tokens without an embedding are
    /// silently dropped.
    #[must_use]
    pub fn from_tokens(id: impl Into<String>, text: &str, embeddings: &WordEmbeddings) -> Self {
        let mut members = HashMap::new();
        for token in text.split_whitespace() {
            if members.contains_key(token) {
                continue;
            }
            if let Some(wv) = embeddings.lookup(token) {
                members.insert(token.to_string(), wv.clone());
            }
        }
        Self {
            id: id.into(),
            members,
        }
    }

    /// Builds the vector representation of a query from its literal terms.
    ///
    /// Each resolved term vector is normalized to unit length before use;
    /// document vectors are not. Unknown terms are dropped.
    #[must_use]
    pub fn from_query<'a>(
        id: impl Into<String>,
        terms: impl IntoIterator<Item = &'a str>,
        embeddings: &WordEmbeddings,
    ) -> Self {
        let mut members = HashMap::new();
        for term in terms {
            if members.contains_key(term) {
                continue;
            }
            if let Some(wv) = embeddings.lookup(term) {
                let mut qwv = wv.clone();
                qwv.normalize();
                members.insert(term.to_string(), qwv);
            }
        }
        Self {
            id: id.into(),
            members,
        }
    }

    /// Rebuilds a set from the stored centroid payload.
    ///
    /// The entries carry synthetic cluster labels, not real words; per-word
    /// identity was lost at compression time.
    pub fn from_stored(id: impl Into<String>, payload: &str) -> Result<Self, codec::CodecError> {
        let members = codec::decode(payload)?
            .into_iter()
            .map(|wv| (wv.word().to_string(), wv))
            .collect();
        Ok(Self {
            id: id.into(),
            members,
        })
    }

    /// Adopts a ready-made word → vector grouping, e.g. centroids produced
    /// by the vocabulary-cluster path.
    #[must_use]
    pub fn from_groups(id: impl Into<String>, members: HashMap<String, WordVec>) -> Self {
        Self {
            id: id.into(),
            members,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Snapshot of the current members, the working set for the similarity
    /// measures.
    ///
    /// Sorted by word so that seeded clustering sees the same input order
    /// no matter how the backing map iterates. The measures themselves are
    /// order-independent.
    #[must_use]
    pub fn members(&self) -> Vec<&WordVec> {
        let mut members: Vec<&WordVec> = self.members.values().collect();
        members.sort_by(|a, b| a.word().cmp(b.word()));
        members
    }

    /// Partitions the members into `min(k, len)` centroid groups.
    ///
    /// Results are deterministic only for a fixed seed; tests should pin the
    /// seed or assert invariant properties (count, coverage) rather than
    /// exact coordinates.
    pub fn cluster_centroids(
        &self,
        k: usize,
        seed: Option<u64>,
    ) -> Result<Vec<WordVec>, ClusteringError> {
        let members = self.members();
        if members.is_empty() {
            return Err(ClusteringError::EmptyVectorSet);
        }
        let k = k.min(members.len());

        let vectors: Vec<Vec<f32>> = members.iter().map(|wv| wv.coords().to_vec()).collect();
        let result = kmeans_clustering(&vectors, k, seed)?;

        Ok(result
            .centroids
            .into_iter()
            .enumerate()
            .map(|(i, coords)| WordVec::new(format!("Cluster_{i}"), coords))
            .collect())
    }

    /// Density-based partition of the members with the fixed built-in
    /// thresholds; groups of near-duplicate vectors, not broad clusters.
    pub fn cluster_density(&self) -> Result<Vec<Vec<&WordVec>>, ClusteringError> {
        let members = self.members();
        let vectors: Vec<Vec<f32>> = members.iter().map(|wv| wv.coords().to_vec()).collect();
        let groups = density_clustering(&vectors)?;
        Ok(groups
            .into_iter()
            .map(|idxs| idxs.into_iter().map(|i| members[i]).collect())
            .collect())
    }

    /// Clusters into `k` centroids and renders the delimited stored form.
    ///
    /// This is the compressed on-disk representation consumed by storage.
    pub fn to_centroid_string(
        &self,
        k: usize,
        seed: Option<u64>,
    ) -> Result<String, ClusteringError> {
        let centroids = self.cluster_centroids(k, seed)?;
        Ok(codec::encode(&centroids))
    }
}
