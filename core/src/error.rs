use crate::DocId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VsrError>;

/// Failures surfaced by index construction, feedback and score-table I/O.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum VsrError {
    /// The builder already holds a document collection.
    #[error("cannot index documents more than once in the same index")]
    AlreadyIndexed,
    #[error("document `{name}` was added twice")]
    DuplicateDocument { name: String },
    #[error("document {doc} is not part of the index")]
    UnknownDocument { doc: DocId },
    /// Ranks are 1-based positions in the current retrievals.
    #[error("no retrieval at rank {rank}")]
    UnknownRank { rank: usize },
    #[error("rating {rating} is outside [-1, 1]")]
    RatingOutOfRange { rating: f64 },
    /// The PageRank table does not cover an indexed document.
    #[error("no PageRank score for document `{name}`")]
    MissingPageRankData { name: String },
    #[error("malformed score table line {line}: {content:?}")]
    MalformedScoreLine { line: usize, content: String },
    /// Empty names and names containing whitespace cannot be written.
    #[error("page name {name:?} cannot be stored in a score table")]
    InvalidPageName { name: String },
    #[error("page `{name}` is listed twice in the score table (line {line})")]
    DuplicateScore { name: String, line: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
