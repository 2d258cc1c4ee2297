//! Tantivy-backed document index.
//!
//! One document per collection file, docid taken from the file stem. The
//! `centroids` bytes field optionally carries the document's clustered
//! vector-set representation, written at index time so that similarity-time
//! scoring never has to re-cluster.

use crate::error::{RerankError, RerankResult};
use crate::lexical::analyze;
use crate::rerank::{DocStore, ScoredDoc, TermStats};
use crate::wordvec::{VectorSet, WordEmbeddings, codec};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, SchemaBuilder, STORED, STRING, TEXT, Value,
};
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Centroid storage options for collection indexing.
///
/// `embeddings: None` disables centroid storage entirely; the index then only
/// supports live-clustering and vocabulary-grouping candidate modes.
pub struct IndexOptions<'a> {
    pub embeddings: Option<&'a WordEmbeddings>,
    pub num_clusters: usize,
    pub compress: bool,
    pub seed: Option<u64>,
}

impl Default for IndexOptions<'_> {
    fn default() -> Self {
        Self {
            embeddings: None,
            num_clusters: 5,
            compress: true,
            seed: None,
        }
    }
}

struct Fields {
    docid: Field,
    content: Field,
    centroids: Field,
}

/// The lexical collaborator: full-text candidate retrieval plus the narrow
/// per-document read interface the reranker consumes.
pub struct DocumentIndex {
    index: Index,
    reader: IndexReader,
    fields: Fields,
}

impl DocumentIndex {
    fn schema() -> Schema {
        let mut builder = SchemaBuilder::default();
        builder.add_text_field("docid", STRING | STORED);
        builder.add_text_field("content", TEXT | STORED);
        builder.add_bytes_field("centroids", STORED);
        builder.build()
    }

    fn resolve_fields(schema: &Schema) -> RerankResult<Fields> {
        Ok(Fields {
            docid: schema.get_field("docid")?,
            content: schema.get_field("content")?,
            centroids: schema.get_field("centroids")?,
        })
    }

    /// Creates a fresh index at `path`, replacing nothing that is already
    /// there (tantivy refuses to create over an existing index).
    pub fn create(path: &Path) -> RerankResult<Self> {
        fs::create_dir_all(path).map_err(|e| RerankError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        let directory = MmapDirectory::open(path)?;
        let index = Index::create(directory, Self::schema(), Default::default())?;
        let reader = index.reader()?;
        let fields = Self::resolve_fields(&index.schema())?;
        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// Opens an existing index at `path`.
    pub fn open(path: &Path) -> RerankResult<Self> {
        let directory = MmapDirectory::open(path)?;
        let index = Index::open(directory)?;
        let reader = index.reader()?;
        let fields = Self::resolve_fields(&index.schema())?;
        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// Indexes every file under `collection_dir`, one document per file.
    ///
    /// Returns the number of documents indexed. Unreadable files are skipped
    /// with a warning rather than aborting the whole run.
    pub fn index_collection(
        &self,
        collection_dir: &Path,
        opts: &IndexOptions<'_>,
    ) -> RerankResult<usize> {
        let files: Vec<_> = WalkDir::new(collection_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .collect();

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut writer: IndexWriter<TantivyDocument> = self.index.writer(WRITER_HEAP_BYTES)?;
        let mut indexed = 0usize;

        for entry in files {
            progress.inc(1);
            let path = entry.path();
            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let docid = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            let mut doc = TantivyDocument::new();
            doc.add_text(self.fields.docid, &docid);
            doc.add_text(self.fields.content, &content);

            if let Some(embeddings) = opts.embeddings {
                if let Some(bytes) = self.centroid_payload(&docid, &content, embeddings, opts)? {
                    doc.add_bytes(self.fields.centroids, &bytes);
                }
            }

            writer.add_document(doc)?;
            indexed += 1;
        }

        writer.commit()?;
        self.reader.reload()?;
        progress.finish_and_clear();
        info!(count = indexed, "collection indexed");
        Ok(indexed)
    }

    /// Clusters a document's in-vocabulary tokens and renders the stored
    /// centroid payload. Documents with no resolvable embeddings store
    /// nothing and fall back to an empty set at similarity time.
    fn centroid_payload(
        &self,
        docid: &str,
        content: &str,
        embeddings: &WordEmbeddings,
        opts: &IndexOptions<'_>,
    ) -> RerankResult<Option<Vec<u8>>> {
        let tokens = analyze(content).join(" ");
        let set = VectorSet::from_tokens(docid, &tokens, embeddings);
        if set.is_empty() {
            debug!(docid, "no embeddings resolved; centroid field omitted");
            return Ok(None);
        }
        let payload = set
            .to_centroid_string(opts.num_clusters, opts.seed)
            .map_err(|e| RerankError::General(format!("clustering '{docid}' failed: {e}")))?;
        Ok(Some(if opts.compress {
            codec::compress(&payload)
        } else {
            payload.into_bytes()
        }))
    }

    /// Lexical top-`limit` retrieval over the content field.
    ///
    /// The lenient parser is used so that raw query text with stray syntax
    /// characters degrades instead of failing the whole query.
    pub fn top_docs(&self, query_text: &str, limit: usize) -> RerankResult<Vec<ScoredDoc>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let (query, parse_errors) = parser.parse_query_lenient(query_text);
        if !parse_errors.is_empty() {
            debug!(query = query_text, ?parse_errors, "lenient query parse");
        }

        let hits = searcher.search(&query, &TopDocs::with_limit(limit))?;
        let mut results = Vec::with_capacity(hits.len());
        for (score, addr) in hits {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let docid = doc
                .get_first(self.fields.docid)
                .and_then(|v| v.as_str())
                .ok_or_else(|| RerankError::LexicalError {
                    operation: "top_docs".to_string(),
                    cause: "hit without a stored docid".to_string(),
                })?
                .to_string();
            results.push(ScoredDoc::new(docid, score));
        }
        Ok(results)
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn fetch(&self, docid: &str) -> RerankResult<Option<TantivyDocument>> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.fields.docid, docid);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let hits = searcher.search(&query, &TopDocs::with_limit(1))?;
        match hits.first() {
            Some((_score, addr)) => Ok(Some(searcher.doc(*addr)?)),
            None => Ok(None),
        }
    }
}

impl DocStore for DocumentIndex {
    fn stored_centroids(&self, docid: &str) -> RerankResult<Option<Vec<u8>>> {
        let Some(doc) = self.fetch(docid)? else {
            return Ok(None);
        };
        Ok(doc
            .get_first(self.fields.centroids)
            .and_then(|v| v.as_bytes())
            .map(<[u8]>::to_vec))
    }

    fn doc_terms(&self, docid: &str) -> RerankResult<Vec<(String, u32)>> {
        let Some(doc) = self.fetch(docid)? else {
            return Ok(Vec::new());
        };
        let Some(content) = doc.get_first(self.fields.content).and_then(|v| v.as_str()) else {
            return Ok(Vec::new());
        };

        let mut freqs: HashMap<String, u32> = HashMap::new();
        for token in analyze(content) {
            *freqs.entry(token).or_insert(0) += 1;
        }
        Ok(freqs.into_iter().collect())
    }
}

impl TermStats for DocumentIndex {
    fn doc_freq(&self, term: &str) -> u32 {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.fields.content, term);
        searcher.doc_freq(&term).map(|n| n as u32).unwrap_or(0)
    }

    fn num_docs(&self) -> u32 {
        self.reader.searcher().num_docs() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordvec::WordVec;
    use tempfile::TempDir;

    fn write_collection(dir: &Path) {
        fs::write(dir.join("d1.txt"), "the ocean waves crash on the shore").unwrap();
        fs::write(dir.join("d2.txt"), "desert sand stretches to the horizon").unwrap();
        fs::write(dir.join("d3.txt"), "ocean currents and ocean tides").unwrap();
    }

    fn build_index(store_centroids: bool) -> (TempDir, DocumentIndex) {
        let tmp = TempDir::new().unwrap();
        let collection = tmp.path().join("collection");
        let index_dir = tmp.path().join("index");
        fs::create_dir_all(&collection).unwrap();
        write_collection(&collection);

        let index = DocumentIndex::create(&index_dir).unwrap();
        let embeddings = WordEmbeddings::from_vectors(vec![
            WordVec::new("ocean", vec![1.0, 0.0]),
            WordVec::new("waves", vec![0.9, 0.1]),
            WordVec::new("desert", vec![0.0, 1.0]),
            WordVec::new("sand", vec![0.1, 0.9]),
        ])
        .unwrap();
        let opts = IndexOptions {
            embeddings: store_centroids.then_some(&embeddings),
            num_clusters: 2,
            compress: true,
            seed: Some(7),
        };
        let count = index.index_collection(&collection, &opts).unwrap();
        assert_eq!(count, 3);
        (tmp, index)
    }

    #[test]
    fn test_top_docs_ranks_by_term_match() {
        let (_tmp, index) = build_index(false);
        let hits = index.top_docs("ocean", 10).unwrap();
        assert_eq!(hits.len(), 2);
        // d3 mentions ocean twice and should outrank d1
        assert_eq!(hits[0].docid, "d3");
        assert_eq!(hits[1].docid, "d1");
    }

    #[test]
    fn test_top_docs_zero_limit_and_no_match() {
        let (_tmp, index) = build_index(false);
        assert!(index.top_docs("ocean", 0).unwrap().is_empty());
        assert!(index.top_docs("zebra", 10).unwrap().is_empty());
    }

    #[test]
    fn test_doc_terms_counts_frequencies() {
        let (_tmp, index) = build_index(false);
        let terms = index.doc_terms("d3").unwrap();
        let freqs: HashMap<_, _> = terms.into_iter().collect();
        assert_eq!(freqs.get("ocean"), Some(&2));
        assert_eq!(freqs.get("tides"), Some(&1));
    }

    #[test]
    fn test_doc_terms_unknown_docid_is_empty() {
        let (_tmp, index) = build_index(false);
        assert!(index.doc_terms("nope").unwrap().is_empty());
    }

    #[test]
    fn test_term_stats() {
        let (_tmp, index) = build_index(false);
        assert_eq!(TermStats::num_docs(&index), 3);
        assert_eq!(index.doc_freq("ocean"), 2);
        assert_eq!(index.doc_freq("desert"), 1);
        assert_eq!(index.doc_freq("zebra"), 0);
    }

    #[test]
    fn test_stored_centroids_round_trip() {
        let (_tmp, index) = build_index(true);

        let bytes = index.stored_centroids("d1").unwrap().expect("centroids");
        let payload = codec::decompress(&bytes).unwrap();
        let set = VectorSet::from_stored("d1", &payload).unwrap();
        assert!(!set.is_empty());
        assert!(set.len() <= 2);
    }

    #[test]
    fn test_centroids_omitted_without_embeddings_overlap() {
        let (_tmp, index) = build_index(true);
        // d2 only has desert+sand in vocabulary, d3 overlaps via ocean;
        // a doc with no in-vocabulary terms would store nothing
        assert!(index.stored_centroids("d2").unwrap().is_some());
        assert!(index.stored_centroids("missing").unwrap().is_none());
    }

    #[test]
    fn test_open_existing_index() {
        let (tmp, index) = build_index(false);
        drop(index);
        let reopened = DocumentIndex::open(&tmp.path().join("index")).unwrap();
        assert_eq!(reopened.num_docs(), 3);
    }

    #[test]
    fn test_open_missing_directory_is_lexical_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("never-indexed");
        assert!(matches!(
            DocumentIndex::open(&missing),
            Err(RerankError::LexicalError { .. })
        ));
    }
}
