//! Centroid-seeking and density-based clustering over embedding vectors.
//!
//! K-means uses cosine similarity for assignment and K-means++ for centroid
//! initialization. Centroids are plain componentwise means, matching the
//! centroid contract used for compressed document storage.
//!
//! # Algorithm Details
//! - Distance metric: cosine similarity
//! - Initialization: K-means++
//! - Max iterations: 100
//! - Convergence tolerance: 1e-4

use crate::wordvec::types::{VectorError, cosine_similarity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::warn;

/// Maximum number of iterations for K-means clustering.
const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance for centroid updates.
const CONVERGENCE_TOLERANCE: f32 = 1e-4;

/// Epsilon for floating-point comparisons.
const EPSILON: f32 = 1e-10;

/// Neighborhood radius for density-based clustering (Euclidean).
///
/// At this radius with `DENSITY_MIN_PTS` = 1 the pass collapses
/// near-duplicate vectors rather than finding broad clusters.
pub const DENSITY_EPSILON: f32 = 0.001;

/// Minimum neighborhood size for a core point.
pub const DENSITY_MIN_PTS: usize = 1;

/// Result of a K-means clustering operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster centroids, each a vector of the same dimension as the input.
    pub centroids: Vec<Vec<f32>>,

    /// Cluster index (0-based) for each input vector.
    pub assignments: Vec<usize>,

    /// Number of iterations until convergence.
    pub iterations: usize,
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error(
        "Empty vector set provided for clustering\nSuggestion: Ensure the document resolved at least one embedding before clustering"
    )]
    EmptyVectorSet,

    #[error("Invalid cluster count: {0}\nSuggestion: Use k between 1 and the number of vectors")]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch in vectors\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch,

    #[error("Failed to initialize centroids\nSuggestion: Check that vectors contain valid floating-point values")]
    InitializationFailed,

    #[error("Vector operation error: {0}")]
    VectorError(#[from] VectorError),
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Performs K-means clustering on a set of vectors using cosine similarity.
///
/// # Arguments
/// * `vectors` - Input vectors to cluster (non-empty, same dimension)
/// * `k` - Number of clusters (1..=vectors.len())
/// * `seed` - Optional RNG seed; pass `Some` for deterministic runs
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn kmeans_clustering(
    vectors: &[Vec<f32>],
    k: usize,
    seed: Option<u64>,
) -> Result<KMeansResult, ClusteringError> {
    if vectors.is_empty() {
        return Err(ClusteringError::EmptyVectorSet);
    }

    if k == 0 || k > vectors.len() {
        return Err(ClusteringError::InvalidClusterCount(k));
    }

    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(ClusteringError::DimensionMismatch);
    }

    let mut rng = make_rng(seed);
    let mut centroids = initialize_centroids_kmeans_plus_plus(vectors, k, &mut rng)?;
    // Sentinel so the first pass always runs the update step
    let mut assignments = vec![usize::MAX; vectors.len()];
    let mut iterations = 0;

    loop {
        iterations += 1;

        // Assignment step: nearest centroid by cosine similarity
        let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
        let new_assignments: Vec<usize> = vectors
            .iter()
            .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
            .collect();

        let stable = new_assignments == assignments;
        assignments = new_assignments;

        // Update step: recompute centroids as componentwise means
        let new_centroids = update_centroids(vectors, &assignments, k, &mut rng);
        let centroid_movement = calculate_centroid_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if (stable && centroid_movement < CONVERGENCE_TOLERANCE) || iterations >= MAX_ITERATIONS {
            break;
        }
    }

    if iterations >= MAX_ITERATIONS {
        // Results are still usable when not fully converged
        warn!("K-means did not fully converge after {MAX_ITERATIONS} iterations");
    }

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
    })
}

/// Assigns a vector to the nearest centroid based on cosine similarity.
#[must_use]
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[&[f32]]) -> usize {
    let mut best_similarity = f32::NEG_INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let similarity = cosine_similarity(vector, centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best_cluster = i;
        }
    }

    best_cluster
}

/// Updates centroids as the componentwise mean of their assigned vectors.
fn update_centroids(
    vectors: &[Vec<f32>],
    assignments: &[usize],
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f32>> {
    let dimension = vectors[0].len();
    let mut new_centroids = vec![vec![0.0; dimension]; k];
    let mut cluster_sizes = vec![0usize; k];

    for (vector, &cluster_idx) in vectors.iter().zip(assignments.iter()) {
        for (i, &value) in vector.iter().enumerate() {
            new_centroids[cluster_idx][i] += value;
        }
        cluster_sizes[cluster_idx] += 1;
    }

    for (centroid, &size) in new_centroids.iter_mut().zip(cluster_sizes.iter()) {
        if size == 0 {
            // Empty cluster: reseed from a random member
            let random_idx = rng.random_range(0..vectors.len());
            *centroid = vectors[random_idx].clone();
        } else {
            for value in centroid.iter_mut() {
                *value /= size as f32;
            }
        }
    }

    new_centroids
}

/// Initializes centroids using the K-means++ algorithm.
///
/// K-means++ selects initial centroids that are far apart, leading to
/// better convergence than uniform random initialization.
fn initialize_centroids_kmeans_plus_plus(
    vectors: &[Vec<f32>],
    k: usize,
    rng: &mut StdRng,
) -> Result<Vec<Vec<f32>>, ClusteringError> {
    let mut centroids = Vec::with_capacity(k);

    let first_idx = rng.random_range(0..vectors.len());
    centroids.push(vectors[first_idx].clone());

    for _ in 1..k {
        let mut distances = vec![0.0f32; vectors.len()];
        let mut total_distance = 0.0f32;

        for (i, vector) in vectors.iter().enumerate() {
            let mut min_distance = f32::MAX;

            for centroid in &centroids {
                let distance = 1.0 - cosine_similarity(vector, centroid);
                min_distance = min_distance.min(distance);
            }

            // Squared distance drives the K-means++ probability distribution
            distances[i] = min_distance * min_distance;
            total_distance += distances[i];
        }

        if total_distance < EPSILON {
            // All remaining points coincide with existing centroids
            break;
        }

        let mut cumulative = 0.0;
        let target = rng.random::<f32>() * total_distance;
        let mut added = false;

        for (i, &distance) in distances.iter().enumerate() {
            cumulative += distance;
            if cumulative >= target {
                centroids.push(vectors[i].clone());
                added = true;
                break;
            }
        }

        // Fallback: rounding errors prevented a pick
        if !added && centroids.len() < k {
            centroids.push(vectors[vectors.len() - 1].clone());
        }
    }

    if centroids.is_empty() {
        return Err(ClusteringError::InitializationFailed);
    }

    // total_distance collapse above may leave fewer than k centroids; pad by
    // repeating the last one so callers always see exactly k groups
    while centroids.len() < k {
        let last = centroids[centroids.len() - 1].clone();
        centroids.push(last);
    }

    Ok(centroids)
}

/// Calculates the mean cosine movement of centroids between iterations.
fn calculate_centroid_movement(old: &[Vec<f32>], new: &[Vec<f32>]) -> f32 {
    old.iter()
        .zip(new.iter())
        .map(|(old_c, new_c)| 1.0 - cosine_similarity(old_c, new_c))
        .sum::<f32>()
        / old.len() as f32
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Density-based clustering (DBSCAN) with the fixed built-in thresholds.
///
/// Returns the member indices of each cluster. With `min_pts` = 1 every
/// point is a core point, so this reduces to connected components under the
/// epsilon radius; at epsilon 0.001 that collapses near-duplicates only.
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn density_clustering(vectors: &[Vec<f32>]) -> Result<Vec<Vec<usize>>, ClusteringError> {
    if vectors.is_empty() {
        return Err(ClusteringError::EmptyVectorSet);
    }
    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(ClusteringError::DimensionMismatch);
    }

    let mut visited = vec![false; vectors.len()];
    let mut clusters = Vec::new();

    for start in 0..vectors.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let mut members = vec![start];
        let mut frontier = vec![start];

        while let Some(idx) = frontier.pop() {
            let neighbors: Vec<usize> = (0..vectors.len())
                .filter(|&j| {
                    !visited[j] && euclidean_distance(&vectors[idx], &vectors[j]) <= DENSITY_EPSILON
                })
                .collect();

            // min_pts = 1 means every reachable neighbor joins the cluster
            if neighbors.len() + 1 >= DENSITY_MIN_PTS {
                for j in neighbors {
                    visited[j] = true;
                    members.push(j);
                    frontier.push(j);
                }
            }
        }

        clusters.push(members);
    }

    Ok(clusters)
}
