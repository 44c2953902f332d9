//! Vector-space retrieval: TF-IDF inverted index, cosine ranking, Ide_regular
//! relevance feedback and PageRank-aware scoring.

pub mod config;
pub mod error;
pub mod feedback;
pub mod graph;
pub mod index;
pub mod pagerank;
pub mod persist;
pub mod scoring;
pub mod tokenizer;
pub mod vector;

pub use error::{Result, VsrError};
pub use feedback::{Binary, Feedback, FeedbackPolicy, Graded};
pub use graph::{LinkGraph, Node, NodeId};
pub use index::{DocumentRef, Index, IndexBuilder, Occurrence, Retrieval, TermStats};
pub use pagerank::{PageRank, ScoreTable};
pub use scoring::{Cosine, Hit, PageRankBlend, QueryCoverage, Scorer};
pub use vector::DocumentVector;

/// Position of a document in the order it was added to the index.
pub type DocId = u32;
