//! The set-similarity measure family.
//!
//! Five interchangeable strategies compare a query [`VectorSet`] against a
//! candidate [`VectorSet`] and return a scalar suitable for descending sort.
//! One measure is active per run, picked by name from the closed registry.
//!
//! Every measure returns the neutral value 0.0 when either operand is
//! empty, so a candidate with no resolvable embeddings sinks to the bottom
//! instead of aborting the query.

use crate::wordvec::VectorSet;
use std::sync::Arc;

/// Per-term collection statistics, consumed by IDF-weighted
/// centroid linkage. Implemented by the lexical index adapter.
pub trait TermStats: Send + Sync {
    /// Number of documents containing the term.
    fn doc_freq(&self, term: &str) -> u32;

    /// Total number of documents in the collection.
    fn num_docs(&self) -> u32;
}

/// A strategy computing a scalar similarity between two vector sets.
pub trait SetSimilarityMeasure: Send + Sync {
    /// Registry name of this measure.
    fn name(&self) -> &'static str;

    /// Similarity of `a` (query) and `b` (candidate). Must return 0.0 when
    /// either set is empty.
    fn compute_sim(&self, a: &VectorSet, b: &VectorSet) -> f32;
}

/// Optimistic best-match: max cosine over all cross pairs. O(|A|·|B|).
pub struct SingleLinkage;

impl SetSimilarityMeasure for SingleLinkage {
    fn name(&self) -> &'static str {
        "single-link"
    }

    fn compute_sim(&self, a: &VectorSet, b: &VectorSet) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let mut max_sim = 0.0f32;
        for avec in a.members() {
            for bvec in b.members() {
                let sim = avec.cosine_sim(bvec);
                if sim > max_sim {
                    max_sim = sim;
                }
            }
        }
        max_sim
    }
}

/// Pessimistic worst-match: min cosine over all cross pairs.
pub struct CompleteLinkage;

impl SetSimilarityMeasure for CompleteLinkage {
    fn name(&self) -> &'static str {
        "complete-link"
    }

    fn compute_sim(&self, a: &VectorSet, b: &VectorSet) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let mut min_sim = 1.0f32;
        for avec in a.members() {
            for bvec in b.members() {
                let sim = avec.cosine_sim(bvec);
                if sim < min_sim {
                    min_sim = sim;
                }
            }
        }
        min_sim
    }
}

/// Weighted average over cross pairs. Weight is 1, or an IDF-style
/// `ln(num_docs / doc_freq)` per query-side word when weighting is enabled.
pub struct CentroidLinkage {
    stats: Option<Arc<dyn TermStats>>,
}

impl CentroidLinkage {
    /// Unweighted centroid linkage.
    #[must_use]
    pub fn new() -> Self {
        Self { stats: None }
    }

    /// IDF-weighted centroid linkage backed by collection statistics.
    #[must_use]
    pub fn with_idf(stats: Arc<dyn TermStats>) -> Self {
        Self { stats: Some(stats) }
    }
}

impl Default for CentroidLinkage {
    fn default() -> Self {
        Self::new()
    }
}

impl SetSimilarityMeasure for CentroidLinkage {
    fn name(&self) -> &'static str {
        "centroid-link"
    }

    fn compute_sim(&self, a: &VectorSet, b: &VectorSet) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let mut avg_sim = 0.0f32;
        let mut weight_sum = 0.0f32;

        for avec in a.members() {
            let wt = match &self.stats {
                Some(stats) => {
                    let df = stats.doc_freq(avec.word());
                    if df == 0 {
                        // Term never indexed; contributes nothing
                        continue;
                    }
                    (stats.num_docs() as f32 / df as f32).ln()
                }
                None => 1.0,
            };

            for bvec in b.members() {
                avg_sim += avec.cosine_sim(bvec) * wt;
                weight_sum += wt;
            }
        }

        if weight_sum == 0.0 {
            return 0.0;
        }
        avg_sim / weight_sum
    }
}

/// Average over intra-A, intra-B, and cross pairs, divided by
/// `|A|(|A|-1)/2 + |B|(|B|-1)/2 + |A||B|`.
pub struct GroupAverage;

impl SetSimilarityMeasure for GroupAverage {
    fn name(&self) -> &'static str {
        "grpavg-link"
    }

    fn compute_sim(&self, a: &VectorSet, b: &VectorSet) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let alist = a.members();
        let blist = b.members();
        let alen = alist.len();
        let blen = blist.len();

        let mut avg_sim = 0.0f32;

        for i in 0..alen {
            for j in (i + 1)..alen {
                avg_sim += alist[i].cosine_sim(alist[j]);
            }
        }
        for i in 0..blen {
            for j in (i + 1)..blen {
                avg_sim += blist[i].cosine_sim(blist[j]);
            }
        }
        for avec in &alist {
            for bvec in &blist {
                avg_sim += avec.cosine_sim(bvec);
            }
        }

        let total_pairs = alen * (alen - 1) / 2 + blen * (blen - 1) / 2 + alen * blen;
        avg_sim / total_pairs as f32
    }
}

/// Symmetric Hausdorff-style measure mapped into (0, 1] by exponential
/// decay: `exp(-h^2)` with `h = max(d(A,B), d(B,A))`.
///
/// The directed "distance" here is the raw cosine similarity minimized per
/// element and then maximized over the set, not `1 - sim`. Changing this to
/// a true distance would silently reorder existing runs, so it stays.
pub struct Hausdorff;

impl Hausdorff {
    fn directed(alist: &[&crate::wordvec::WordVec], blist: &[&crate::wordvec::WordVec]) -> f32 {
        let mut d_ab = 0.0f32;
        for avec in alist {
            let mut d_a_to_b = f32::MAX;
            for bvec in blist {
                let sim = avec.cosine_sim(bvec);
                if sim < d_a_to_b {
                    d_a_to_b = sim;
                }
            }
            if d_a_to_b > d_ab {
                d_ab = d_a_to_b;
            }
        }
        d_ab
    }
}

impl SetSimilarityMeasure for Hausdorff {
    fn name(&self) -> &'static str {
        "hausdorff"
    }

    fn compute_sim(&self, a: &VectorSet, b: &VectorSet) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let alist = a.members();
        let blist = b.members();

        let d_ab = Self::directed(&alist, &blist);
        let d_ba = Self::directed(&blist, &alist);

        let h = d_ab.max(d_ba);
        (-h * h).exp()
    }
}

/// Names accepted by [`create_measure`], in registry order.
pub const MEASURE_NAMES: [&str; 5] = [
    "single-link",
    "complete-link",
    "centroid-link",
    "grpavg-link",
    "hausdorff",
];

/// Closed name → implementation registry.
///
/// `stats` feeds IDF weighting for centroid linkage; pass `None` (or leave
/// `idf_weighting` off) for the unweighted variant. Returns `None` for an
/// unknown name so the caller can fail configuration at startup.
#[must_use]
pub fn create_measure(
    name: &str,
    idf_weighting: bool,
    stats: Option<Arc<dyn TermStats>>,
) -> Option<Box<dyn SetSimilarityMeasure>> {
    match name {
        "single-link" => Some(Box::new(SingleLinkage)),
        "complete-link" => Some(Box::new(CompleteLinkage)),
        "centroid-link" => match (idf_weighting, stats) {
            (true, Some(stats)) => Some(Box::new(CentroidLinkage::with_idf(stats))),
            _ => Some(Box::new(CentroidLinkage::new())),
        },
        "grpavg-link" => Some(Box::new(GroupAverage)),
        "hausdorff" => Some(Box::new(Hausdorff)),
        _ => None,
    }
}

/// All five measures, used by tests that assert family-wide properties.
#[must_use]
pub fn all_measures() -> Vec<Box<dyn SetSimilarityMeasure>> {
    MEASURE_NAMES
        .iter()
        .filter_map(|name| create_measure(name, false, None))
        .collect()
}
