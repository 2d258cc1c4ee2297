//! Set-similarity measure behavior through the public API.

use vecrank::rerank::{MEASURE_NAMES, all_measures, create_measure};
use vecrank::wordvec::{VectorSet, WordEmbeddings, WordVec};

fn lexicon() -> WordEmbeddings {
    WordEmbeddings::from_vectors(vec![
        WordVec::new("a", vec![1.0, 0.0]),
        WordVec::new("b", vec![0.0, 1.0]),
        WordVec::new("c", vec![1.0, 1.0]),
    ])
    .unwrap()
}

fn set(id: &str, words: &[&str]) -> VectorSet {
    let lex = lexicon();
    VectorSet::from_query(id, words.iter().copied(), &lex)
}

#[test]
fn registry_knows_all_five_measures() {
    assert_eq!(MEASURE_NAMES.len(), 5);
    for name in MEASURE_NAMES {
        let measure = create_measure(name, false, None)
            .unwrap_or_else(|| panic!("measure '{name}' missing from registry"));
        assert_eq!(measure.name(), name);
    }
    assert!(create_measure("average-link", false, None).is_none());
}

#[test]
fn orthogonal_and_identical_pair_extremes() {
    // {a, b} vs {a}: best cross pair is identical, worst is orthogonal
    let left = set("q", &["a", "b"]);
    let right = set("d", &["a"]);

    let single = create_measure("single-link", false, None).unwrap();
    let complete = create_measure("complete-link", false, None).unwrap();

    assert!((single.compute_sim(&left, &right) - 1.0).abs() < 1e-5);
    assert!(complete.compute_sim(&left, &right).abs() < 1e-5);
}

#[test]
fn empty_set_scores_zero_for_every_measure() {
    let empty = set("q", &[]);
    let full = set("d", &["a", "b", "c"]);

    for measure in all_measures() {
        assert_eq!(
            measure.compute_sim(&empty, &full),
            0.0,
            "measure '{}' must treat an empty side as zero",
            measure.name()
        );
        assert_eq!(measure.compute_sim(&full, &empty), 0.0);
    }
}

#[test]
fn single_dominates_complete_linkage() {
    let left = set("q", &["a", "c"]);
    let right = set("d", &["b", "c"]);

    let single = create_measure("single-link", false, None).unwrap();
    let complete = create_measure("complete-link", false, None).unwrap();

    let max_sim = single.compute_sim(&left, &right);
    let min_sim = complete.compute_sim(&left, &right);
    assert!(max_sim >= min_sim);
}

#[test]
fn measures_are_symmetric() {
    let left = set("q", &["a", "c"]);
    let right = set("d", &["b"]);

    for measure in all_measures() {
        let lr = measure.compute_sim(&left, &right);
        let rl = measure.compute_sim(&right, &left);
        assert!(
            (lr - rl).abs() < 1e-5,
            "measure '{}' asymmetric: {lr} vs {rl}",
            measure.name()
        );
    }
}

#[test]
fn hausdorff_of_identical_sets_is_one() {
    let left = set("q", &["a", "b"]);
    let right = set("d", &["a", "b"]);

    let hausdorff = create_measure("hausdorff", false, None).unwrap();
    // h = 0 for identical normalized sets, exp(-0) = 1
    assert!((hausdorff.compute_sim(&left, &right) - 1.0).abs() < 1e-4);
}
