//! TREC-style query input and run-file output.
//!
//! Queries arrive one per line as `id<TAB>text`. Results leave in the
//! six-column run format every TREC evaluation tool consumes:
//! `queryId Q0 docId rank score runName`, tab-separated, ranks 1-based.

use crate::error::{RerankError, RerankResult};
use crate::rerank::ScoredDoc;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// One retrieval topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrecQuery {
    pub id: String,
    pub text: String,
}

/// Reads a query file: one `id<TAB>text` pair per line.
///
/// Blank lines are skipped; a non-blank line without a tab is a format
/// error naming the offending line number.
pub fn read_queries(path: &Path) -> RerankResult<Vec<TrecQuery>> {
    let file = File::open(path).map_err(|e| RerankError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut queries = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| RerankError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((id, text)) = line.split_once('\t') else {
            return Err(RerankError::QueryFileFormat {
                path: path.to_path_buf(),
                line: lineno + 1,
            });
        };
        let id = id.trim();
        let text = text.trim();
        if id.is_empty() || text.is_empty() {
            return Err(RerankError::QueryFileFormat {
                path: path.to_path_buf(),
                line: lineno + 1,
            });
        }
        queries.push(TrecQuery {
            id: id.to_string(),
            text: text.to_string(),
        });
    }
    debug!(count = queries.len(), path = %path.display(), "queries loaded");
    Ok(queries)
}

/// Streams one query's ranked list in run format.
///
/// An empty list writes nothing; absent queries simply do not appear in the
/// run file.
pub fn write_run_lines<W: Write>(
    out: &mut W,
    query_id: &str,
    ranked: &[ScoredDoc],
    run_name: &str,
) -> std::io::Result<()> {
    for (i, sd) in ranked.iter().enumerate() {
        writeln!(
            out,
            "{}\tQ0\t{}\t{}\t{}\t{}",
            query_id,
            sd.docid,
            i + 1,
            sd.score,
            run_name
        )?;
    }
    Ok(())
}

/// Writes a complete run file for a batch of per-query results.
pub fn save_run_file(
    path: &Path,
    results: &[(String, Vec<ScoredDoc>)],
    run_name: &str,
) -> RerankResult<()> {
    let file = File::create(path).map_err(|e| RerankError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    for (query_id, ranked) in results {
        write_run_lines(&mut writer, query_id, ranked, run_name).map_err(|e| {
            RerankError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
    }
    writer.flush().map_err(|e| RerankError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
