//! Tuning constants for retrieval, feedback and PageRank.
//!
//! These are compile-time defaults; the `vsr-indexer` binary exposes the
//! run-time knobs as command line arguments.

/// Ide_regular weight of the original query.
///
/// The original query vector is normalized by its max weight and scaled by
/// this value before exemplars are blended in.
pub const ALPHA: f64 = 1.0;

/// Ide_regular weight of each relevant exemplar.
pub const BETA: f64 = 1.0;

/// Ide_regular weight of each irrelevant exemplar.
pub const GAMMA: f64 = 1.0;

/// Teleportation probability of the random surfer.
///
/// Every node receives `damping / N` per iteration regardless of its
/// in-links; the remaining `1 - damping` flows along edges.
pub const DEFAULT_DAMPING: f64 = 0.15;

/// Number of power iterations. PageRank runs a fixed count and never
/// checks for convergence.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Retrievals shown per page of results.
pub const MAX_RETRIEVALS: usize = 10;

/// File name of the persisted PageRank table inside a corpus directory.
pub const SCORE_TABLE_FILE: &str = "page_ranks.txt";

/// Weights of the three Ide_regular terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for FeedbackParams {
    fn default() -> Self {
        Self { alpha: ALPHA, beta: BETA, gamma: GAMMA }
    }
}

/// Parameters of the PageRank power iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    pub damping: f64,
    pub iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self { damping: DEFAULT_DAMPING, iterations: DEFAULT_ITERATIONS }
    }
}
