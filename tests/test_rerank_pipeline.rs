//! End-to-end retrieval + rerank over a temporary tantivy index.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vecrank::lexical::{DocumentIndex, IndexOptions, analyze};
use vecrank::rerank::{CandidateMode, Reranker, SetFormationPolicy, create_measure};
use vecrank::trec::save_run_file;
use vecrank::wordvec::{VectorSet, WordEmbeddings};

fn write_embeddings(path: &Path) {
    fs::write(
        path,
        "ocean 1.0 0.0\n\
         sea 0.95 0.05\n\
         waves 0.9 0.1\n\
         desert 0.0 1.0\n\
         sand 0.05 0.95\n",
    )
    .unwrap();
}

fn write_collection(dir: &Path) {
    fs::write(
        dir.join("doc_sea.txt"),
        "the sea was calm and the waves rolled in slowly over the water",
    )
    .unwrap();
    fs::write(
        dir.join("doc_desert.txt"),
        "desert sand and more sand under the hot dry water mirage",
    )
    .unwrap();
    fs::write(
        dir.join("doc_mixed.txt"),
        "water water water everywhere across the wide gray water",
    )
    .unwrap();
}

struct Fixture {
    _tmp: TempDir,
    index: Arc<DocumentIndex>,
    embeddings: WordEmbeddings,
}

fn fixture(store_centroids: bool) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("collection");
    fs::create_dir_all(&collection).unwrap();
    write_collection(&collection);

    let embeddings_path = tmp.path().join("vectors.txt");
    write_embeddings(&embeddings_path);
    let embeddings = WordEmbeddings::load(&embeddings_path).unwrap();

    let index = DocumentIndex::create(&tmp.path().join("index")).unwrap();
    let opts = IndexOptions {
        embeddings: store_centroids.then_some(&embeddings),
        num_clusters: 2,
        compress: true,
        seed: Some(42),
    };
    index.index_collection(&collection, &opts).unwrap();

    Fixture {
        _tmp: tmp,
        index: Arc::new(index),
        embeddings,
    }
}

fn query_set(fx: &Fixture, id: &str, text: &str) -> VectorSet {
    let terms = analyze(text);
    VectorSet::from_query(id, terms.iter().map(String::as_str), &fx.embeddings)
}

#[test]
fn rerank_with_stored_centroids_promotes_on_topic_doc() {
    let fx = fixture(true);

    // All three documents mention "water"; lexical alone favors doc_mixed
    let hits = fx.index.top_docs("water ocean", 10).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].docid, "doc_mixed");

    let reranker = Reranker::new(
        &fx.embeddings,
        None,
        create_measure("single-link", false, None).unwrap(),
        CandidateMode::Stored { compressed: true },
        0.2,
    );
    let query = query_set(&fx, "q1", "water ocean");
    let ranked = reranker.rerank(&query, &hits, &*fx.index, 10).unwrap();

    // doc_sea's centroids sit next to the query vector and win the blend
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].docid, "doc_sea");
}

#[test]
fn rerank_with_live_clustering_matches_topic() {
    let fx = fixture(false);

    let hits = fx.index.top_docs("water", 10).unwrap();
    assert_eq!(hits.len(), 3);

    let reranker = Reranker::new(
        &fx.embeddings,
        None,
        create_measure("centroid-link", false, None).unwrap(),
        CandidateMode::LiveClustering {
            num_clusters: 2,
            seed: Some(7),
        },
        0.1,
    );
    let query = query_set(&fx, "q2", "desert sand water");
    let ranked = reranker.rerank(&query, &hits, &*fx.index, 10).unwrap();

    assert_eq!(ranked[0].docid, "doc_desert");
}

#[test]
fn truncation_honors_num_wanted() {
    let fx = fixture(true);
    let hits = fx.index.top_docs("water", 10).unwrap();
    assert_eq!(hits.len(), 3);

    let reranker = Reranker::new(
        &fx.embeddings,
        None,
        create_measure("grpavg-link", false, None).unwrap(),
        CandidateMode::VocabGrouping {
            policy: SetFormationPolicy::All,
        },
        0.5,
    );
    let query = query_set(&fx, "q3", "sea waves");
    let ranked = reranker.rerank(&query, &hits, &*fx.index, 2).unwrap();
    assert_eq!(ranked.len(), 2);
    assert!(ranked[0].score >= ranked[1].score);
}

#[test]
fn disabled_rerank_passes_lexical_order_through() {
    let fx = fixture(false);

    // The pass-through path: the lexical list, truncated, untouched
    let mut hits = fx.index.top_docs("water", 10).unwrap();
    let lexical_order: Vec<String> = hits.iter().map(|h| h.docid.clone()).collect();
    hits.truncate(2);

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].docid, lexical_order[0]);
    assert_eq!(hits[1].docid, lexical_order[1]);
}

#[test]
fn run_file_has_trec_format() {
    let fx = fixture(true);
    let hits = fx.index.top_docs("sea waves", 10).unwrap();

    let reranker = Reranker::new(
        &fx.embeddings,
        None,
        create_measure("hausdorff", false, None).unwrap(),
        CandidateMode::Stored { compressed: true },
        0.5,
    );
    let query = query_set(&fx, "401", "sea waves");
    let ranked = reranker.rerank(&query, &hits, &*fx.index, 10).unwrap();

    let run_path = fx._tmp.path().join("run.txt");
    save_run_file(&run_path, &[("401".to_string(), ranked)], "testrun").unwrap();

    let text = fs::read_to_string(&run_path).unwrap();
    for (i, line) in text.lines().enumerate() {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 6);
        assert_eq!(cols[0], "401");
        assert_eq!(cols[1], "Q0");
        assert_eq!(cols[3], (i + 1).to_string());
        assert_eq!(cols[5], "testrun");
        cols[4].parse::<f32>().expect("score column must be numeric");
    }
}
