//! Pluggable final-score strategies for [`Index`](crate::Index).
//!
//! The index always computes the TF-IDF cosine similarity between the query
//! and each candidate document; a [`Scorer`] turns that into the number the
//! results are ranked by.

use crate::error::{Result, VsrError};
use crate::index::DocumentRef;
use crate::pagerank::ScoreTable;

/// Per-document evidence collected while scoring one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Length-normalized dot product of query and document.
    pub cosine: f64,
    /// Query tokens that also occur in the document.
    pub matched_terms: usize,
    /// Distinct tokens in the query, indexed or not.
    pub query_terms: usize,
}

pub trait Scorer {
    fn score(&self, doc: &DocumentRef, hit: &Hit) -> f64;
}

/// Plain cosine ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Scorer for Cosine {
    fn score(&self, _doc: &DocumentRef, hit: &Hit) -> f64 {
        hit.cosine
    }
}

/// Cosine plus the fraction of query tokens the document matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCoverage;

impl Scorer for QueryCoverage {
    fn score(&self, _doc: &DocumentRef, hit: &Hit) -> f64 {
        if hit.query_terms == 0 {
            return hit.cosine;
        }
        hit.cosine + hit.matched_terms as f64 / hit.query_terms as f64
    }
}

/// Cosine plus `page_weight * pagerank(doc)`.
///
/// Scores are resolved per document when the blend is built, so an index
/// carrying this scorer is known to have a PageRank value for every document.
#[derive(Debug)]
pub struct PageRankBlend {
    page_weight: f64,
    ranks: Vec<f64>,
}

impl PageRankBlend {
    pub(crate) fn new(table: &ScoreTable, page_weight: f64, docs: &[DocumentRef]) -> Result<Self> {
        let ranks = docs
            .iter()
            .map(|doc| {
                table
                    .get(doc.name())
                    .ok_or_else(|| VsrError::MissingPageRankData { name: doc.name().to_string() })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { page_weight, ranks })
    }

    pub fn page_weight(&self) -> f64 {
        self.page_weight
    }

    /// PageRank of the document with the given id.
    pub fn rank(&self, doc: &DocumentRef) -> f64 {
        self.ranks[doc.id() as usize]
    }
}

impl Scorer for PageRankBlend {
    fn score(&self, doc: &DocumentRef, hit: &Hit) -> f64 {
        hit.cosine + self.page_weight * self.rank(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::vector::DocumentVector;

    fn hit(cosine: f64, matched_terms: usize, query_terms: usize) -> Hit {
        Hit { cosine, matched_terms, query_terms }
    }

    #[test]
    fn coverage_adds_matched_fraction() {
        let mut b = IndexBuilder::new();
        b.add_document("a", DocumentVector::from_tokens(["x"])).unwrap();
        b.add_document("b", DocumentVector::from_tokens(["y"])).unwrap();
        let index = b.finalize(QueryCoverage);
        let doc = index.document(0).unwrap();
        assert_eq!(QueryCoverage.score(doc, &hit(0.5, 1, 4)), 0.75);
        assert_eq!(Cosine.score(doc, &hit(0.5, 1, 4)), 0.5);
    }

    #[test]
    fn blend_requires_every_document() {
        let mut b = IndexBuilder::new();
        b.add_document("P1.html", DocumentVector::from_tokens(["x"])).unwrap();
        b.add_document("P2.html", DocumentVector::from_tokens(["y"])).unwrap();
        let index = b.finalize(Cosine);

        let partial: ScoreTable = [("P1.html", 1.0)].into_iter().collect();
        match index.with_page_rank(&partial, 1.0) {
            Err(VsrError::MissingPageRankData { name }) => assert_eq!(name, "P2.html"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
