//! Score normalization and blending.
//!
//! The lexical engine and the vector measures score on different scales, so
//! each list is normalized independently by dividing every score by the list
//! sum (not the max) before the linear blend.

/// A candidate document with a relevance score attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    pub docid: String,
    pub score: f32,
}

impl ScoredDoc {
    pub fn new(docid: impl Into<String>, score: f32) -> Self {
        Self {
            docid: docid.into(),
            score,
        }
    }
}

/// Sum-normalizes a score list: `s_i / Σ s`.
///
/// A non-positive sum (all-zero vector scores, degenerate lexical run)
/// yields all zeros instead of dividing by zero.
#[must_use]
pub fn normalize_scores(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| s / sum).collect()
}

/// Blends normalized text and vector scores, re-sorts, and truncates.
///
/// `text` and `vector_scores` are parallel: `vector_scores[i]` belongs to
/// `text[i]`. The result is `w·norm_text + (1−w)·norm_vec` sorted
/// descending and cut to `num_wanted`.
#[must_use]
pub fn combine_similarities(
    text: &[ScoredDoc],
    vector_scores: &[f32],
    text_weight: f32,
    num_wanted: usize,
) -> Vec<ScoredDoc> {
    debug_assert_eq!(text.len(), vector_scores.len());

    let text_raw: Vec<f32> = text.iter().map(|sd| sd.score).collect();
    let norm_text = normalize_scores(&text_raw);
    let norm_vec = normalize_scores(vector_scores);

    let mut combined: Vec<ScoredDoc> = text
        .iter()
        .zip(norm_text.iter().zip(norm_vec.iter()))
        .map(|(sd, (&t, &v))| {
            ScoredDoc::new(&sd.docid, text_weight * t + (1.0 - text_weight) * v)
        })
        .collect();

    combined.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    combined.truncate(num_wanted.min(combined.len()));
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sums_to_one() {
        let normalized = normalize_scores(&[3.0, 1.0, 4.0, 1.5]);
        let sum: f32 = normalized.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_sum() {
        assert_eq!(normalize_scores(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(normalize_scores(&[]), Vec::<f32>::new());
    }

    fn candidates() -> Vec<ScoredDoc> {
        vec![
            ScoredDoc::new("d1", 4.0),
            ScoredDoc::new("d2", 3.0),
            ScoredDoc::new("d3", 1.0),
        ]
    }

    #[test]
    fn test_blend_identity_at_weight_one() {
        let text = candidates();
        let vec_scores = vec![0.0, 1.0, 0.5];

        let combined = combine_similarities(&text, &vec_scores, 1.0, 3);
        let norm_text = normalize_scores(&[4.0, 3.0, 1.0]);

        // w = 1 reproduces the normalized text ranking exactly
        assert_eq!(combined[0].docid, "d1");
        assert!((combined[0].score - norm_text[0]).abs() < 1e-6);
        assert!((combined[1].score - norm_text[1]).abs() < 1e-6);
        assert!((combined[2].score - norm_text[2]).abs() < 1e-6);
    }

    #[test]
    fn test_blend_identity_at_weight_zero() {
        let text = candidates();
        let vec_scores = vec![0.0, 1.0, 0.5];

        let combined = combine_similarities(&text, &vec_scores, 0.0, 3);
        let norm_vec = normalize_scores(&vec_scores);

        // w = 0 reproduces the normalized vector ranking: d2 > d3 > d1
        assert_eq!(combined[0].docid, "d2");
        assert!((combined[0].score - norm_vec[1]).abs() < 1e-6);
        assert_eq!(combined[1].docid, "d3");
        assert_eq!(combined[2].docid, "d1");
    }

    #[test]
    fn test_truncation_and_order() {
        let text = candidates();
        let vec_scores = vec![0.2, 0.9, 0.1];

        let combined = combine_similarities(&text, &vec_scores, 0.6, 2);
        assert_eq!(combined.len(), 2);
        assert!(combined[0].score >= combined[1].score);

        // Truncation never exceeds the candidate count
        let all = combine_similarities(&text, &vec_scores, 0.6, 10);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_zero_vector_candidate_ranks_last() {
        let text = vec![
            ScoredDoc::new("d1", 2.0),
            ScoredDoc::new("d2", 2.0),
            ScoredDoc::new("d3", 2.0),
        ];
        let vec_scores = vec![0.5, 0.5, 0.0];

        let combined = combine_similarities(&text, &vec_scores, 0.5, 3);
        assert_eq!(combined[2].docid, "d3");
    }
}
