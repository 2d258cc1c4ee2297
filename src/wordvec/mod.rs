//! Word-embedding vector sets and the clustering machinery behind them.
//!
//! A document or query is represented as a [`VectorSet`]: a map from word
//! (or synthetic cluster label) to its embedding point. Sets can be
//! compressed into a few k-means centroids, serialized through the codec for
//! storage, and compared by the similarity measures in [`crate::rerank`].

pub mod clustering;
pub mod codec;
pub mod lexicon;
pub mod set;
pub mod types;

pub use clustering::{ClusteringError, KMeansResult, density_clustering, kmeans_clustering};
pub use codec::CodecError;
pub use lexicon::{VocabClusterIndex, WordEmbeddings};
pub use set::VectorSet;
pub use types::{VectorDimension, VectorError, WordVec, centroid, cosine_similarity};
