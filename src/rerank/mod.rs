//! Second-stage reranking of a lexical candidate list.
//!
//! One pass per query, no state retained across queries: materialize the
//! query set once, score every candidate with the active similarity
//! measure, sum-normalize both score lists, blend, re-sort, truncate.

pub mod candidates;
pub mod combiner;
pub mod measure;

pub use candidates::{CandidateMode, DocStore, SetFormationPolicy, build_candidate_set};
pub use combiner::{ScoredDoc, combine_similarities, normalize_scores};
pub use measure::{
    MEASURE_NAMES, SetSimilarityMeasure, TermStats, all_measures, create_measure,
};

use crate::error::RerankResult;
use crate::wordvec::{VectorSet, VocabClusterIndex, WordEmbeddings};
use rayon::prelude::*;
use tracing::debug;

/// The per-query reranking engine.
///
/// Holds only run-level configuration and the read-only shared services;
/// everything per-query is rebuilt on each [`Reranker::rerank`] call.
pub struct Reranker<'a> {
    embeddings: &'a WordEmbeddings,
    vocab: Option<&'a VocabClusterIndex>,
    measure: Box<dyn SetSimilarityMeasure>,
    mode: CandidateMode,
    text_weight: f32,
}

impl<'a> Reranker<'a> {
    pub fn new(
        embeddings: &'a WordEmbeddings,
        vocab: Option<&'a VocabClusterIndex>,
        measure: Box<dyn SetSimilarityMeasure>,
        mode: CandidateMode,
        text_weight: f32,
    ) -> Self {
        Self {
            embeddings,
            vocab,
            measure,
            mode,
            text_weight,
        }
    }

    /// Computes the vector-side similarity for every candidate.
    ///
    /// Candidates are independent pure computations over read-only inputs,
    /// so they score in parallel.
    pub fn vector_scores(
        &self,
        query_set: &VectorSet,
        candidates: &[ScoredDoc],
        store: &dyn DocStore,
    ) -> RerankResult<Vec<f32>> {
        candidates
            .par_iter()
            .map(|sd| {
                let doc_set = build_candidate_set(
                    &sd.docid,
                    self.mode,
                    store,
                    self.embeddings,
                    self.vocab,
                )?;
                Ok(self.measure.compute_sim(query_set, &doc_set))
            })
            .collect()
    }

    /// Full rerank of one query's candidate list: score, normalize, blend,
    /// sort descending, truncate to `num_wanted`.
    pub fn rerank(
        &self,
        query_set: &VectorSet,
        candidates: &[ScoredDoc],
        store: &dyn DocStore,
        num_wanted: usize,
    ) -> RerankResult<Vec<ScoredDoc>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let vector_scores = self.vector_scores(query_set, candidates, store)?;
        debug!(
            query = query_set.id(),
            candidates = candidates.len(),
            measure = self.measure.name(),
            "computed vector similarities"
        );

        Ok(combine_similarities(
            candidates,
            &vector_scores,
            self.text_weight,
            num_wanted,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordvec::WordVec;
    use std::collections::HashMap;

    struct TokenStore(HashMap<String, Vec<(String, u32)>>);

    impl DocStore for TokenStore {
        fn stored_centroids(&self, _docid: &str) -> RerankResult<Option<Vec<u8>>> {
            Ok(None)
        }
        fn doc_terms(&self, docid: &str) -> RerankResult<Vec<(String, u32)>> {
            Ok(self.0.get(docid).cloned().unwrap_or_default())
        }
    }

    fn lexicon() -> WordEmbeddings {
        WordEmbeddings::from_vectors(vec![
            WordVec::new("ocean", vec![1.0, 0.0]),
            WordVec::new("sea", vec![0.95, 0.05]),
            WordVec::new("desert", vec![0.0, 1.0]),
        ])
        .unwrap()
    }

    fn store() -> TokenStore {
        let mut docs = HashMap::new();
        docs.insert("about_sea".to_string(), vec![("sea".to_string(), 3)]);
        docs.insert("about_desert".to_string(), vec![("desert".to_string(), 2)]);
        docs.insert("about_nothing".to_string(), vec![("xyzzy".to_string(), 1)]);
        TokenStore(docs)
    }

    #[test]
    fn test_rerank_promotes_semantically_close_candidate() {
        let lex = lexicon();
        let reranker = Reranker::new(
            &lex,
            None,
            create_measure("single-link", false, None).unwrap(),
            CandidateMode::VocabGrouping {
                policy: SetFormationPolicy::All,
            },
            0.3,
        );

        let query_set = VectorSet::from_query("q1", ["ocean"], &lex);
        // Lexical stage slightly prefers the desert document
        let candidates = vec![
            ScoredDoc::new("about_desert", 2.1),
            ScoredDoc::new("about_sea", 2.0),
        ];

        let reranked = reranker
            .rerank(&query_set, &candidates, &store(), 2)
            .unwrap();
        assert_eq!(reranked[0].docid, "about_sea");
    }

    #[test]
    fn test_candidate_without_embeddings_ranks_last() {
        let lex = lexicon();
        let reranker = Reranker::new(
            &lex,
            None,
            create_measure("hausdorff", false, None).unwrap(),
            CandidateMode::VocabGrouping {
                policy: SetFormationPolicy::One,
            },
            0.5,
        );

        let query_set = VectorSet::from_query("q1", ["ocean"], &lex);
        let candidates = vec![
            ScoredDoc::new("about_nothing", 1.0),
            ScoredDoc::new("about_sea", 1.0),
        ];

        let reranked = reranker
            .rerank(&query_set, &candidates, &store(), 2)
            .unwrap();
        assert_eq!(reranked[1].docid, "about_nothing");
    }

    #[test]
    fn test_empty_candidate_list() {
        let lex = lexicon();
        let reranker = Reranker::new(
            &lex,
            None,
            create_measure("grpavg-link", false, None).unwrap(),
            CandidateMode::VocabGrouping {
                policy: SetFormationPolicy::All,
            },
            0.5,
        );
        let query_set = VectorSet::from_query("q1", ["ocean"], &lex);
        let reranked = reranker.rerank(&query_set, &[], &store(), 10).unwrap();
        assert!(reranked.is_empty());
    }
}
