//! First-stage lexical retrieval over a tantivy index.

pub mod index;

pub use index::{DocumentIndex, IndexOptions};

/// Lowercased alphanumeric tokenization.
///
/// Used for both document term vectors and query terms so that term
/// frequencies and document frequencies line up with what the index's
/// default analyzer produced.
#[must_use]
pub fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
