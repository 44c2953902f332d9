//! PageRank by damped power iteration.
//!
//! Every node starts at `1/N`. Each iteration computes, for every node `j`,
//!
//! ```text
//! raw[j] = (1 - damping) · Σ_{i → j} score[i] / out_degree(i) + damping / N
//! ```
//!
//! and renormalizes `raw` to sum to one. Rank held by nodes without outgoing
//! links is not redistributed beyond the damping term; the renormalization
//! absorbs the loss. The iteration count is fixed, there is no convergence
//! test.

use crate::config::PageRankConfig;
use crate::graph::LinkGraph;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct PageRank {
    config: PageRankConfig,
}

impl PageRank {
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PageRankConfig {
        &self.config
    }

    /// Scores indexed by [`NodeId`](crate::NodeId).
    pub fn scores(&self, graph: &LinkGraph) -> Vec<f64> {
        let n = graph.len();
        if n == 0 {
            return Vec::new();
        }
        let damping = self.config.damping;
        let teleport = damping / n as f64;
        let nodes = graph.nodes();
        let mut scores = vec![1.0 / n as f64; n];
        let mut raw = vec![0.0; n];

        for iteration in 0..self.config.iterations {
            let mut total = 0.0;
            for (j, node) in nodes.iter().enumerate() {
                let inflow: f64 = node
                    .incoming()
                    .iter()
                    .map(|&i| scores[i] / nodes[i].outgoing().len() as f64)
                    .sum();
                raw[j] = (1.0 - damping) * inflow + teleport;
                total += raw[j];
            }
            if total == 0.0 {
                tracing::debug!(iteration, "no rank left to distribute");
                break;
            }
            for (s, r) in scores.iter_mut().zip(&raw) {
                *s = r / total;
            }
            tracing::trace!(iteration, total, "pagerank iteration");
        }
        scores
    }

    /// Scores keyed by page name, in node order.
    pub fn compute(&self, graph: &LinkGraph) -> ScoreTable {
        let scores = self.scores(graph);
        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            iterations = self.config.iterations,
            "pagerank computed"
        );
        graph.nodes().iter().zip(scores).map(|(node, s)| (node.name(), s)).collect()
    }
}

/// Page name → score, remembering insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    entries: Vec<(String, f64)>,
    positions: HashMap<String, usize>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score of `name`, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, score: f64) -> Option<f64> {
        let name = name.into();
        if let Some(&pos) = self.positions.get(&name) {
            return Some(std::mem::replace(&mut self.entries[pos].1, score));
        }
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push((name, score));
        None
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.positions.get(name).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, s)| (name.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, s)| s).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ScoreTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, score) in iter {
            table.insert(name, score);
        }
        table
    }
}
