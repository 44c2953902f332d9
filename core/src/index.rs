//! TF-IDF inverted index with cosine-similarity retrieval.
//!
//! Construction is split in two phases. An [`IndexBuilder`] collects raw
//! term frequencies; [`IndexBuilder::finalize`] consumes it, freezes every
//! token's IDF and every document's vector length, and yields an immutable
//! [`Index`]. Retrieval is only available on the finalized index.

use crate::error::{Result, VsrError};
use crate::pagerank::ScoreTable;
use crate::scoring::{Cosine, Hit, PageRankBlend, Scorer};
use crate::vector::DocumentVector;
use crate::DocId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;

/// One document's count for a token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    pub doc: DocId,
    pub count: f64,
}

/// Occurrences of one token plus its inverse document frequency.
#[derive(Debug, Clone)]
pub struct TermStats {
    occurrences: Vec<Occurrence>,
    idf: f64,
}

impl TermStats {
    /// `ln(N / df)`; always positive in a finalized index.
    pub fn idf(&self) -> f64 {
        self.idf
    }

    /// Occurrences in the order documents were indexed.
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Number of documents containing the token.
    pub fn doc_freq(&self) -> usize {
        self.occurrences.len()
    }
}

/// An indexed document and the Euclidean length of its TF-IDF vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    id: DocId,
    name: String,
    length: f64,
}

impl DocumentRef {
    pub fn id(&self) -> DocId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `sqrt(Σ (idf · count)²)` over the document's indexed tokens.
    pub fn length(&self) -> f64 {
        self.length
    }
}

/// A retrieved document and its final score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retrieval {
    pub doc: DocId,
    pub score: f64,
}

/// Best first; equal scores fall back to indexing order.
fn rank_order(a: &Retrieval, b: &Retrieval) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc.cmp(&b.doc))
}

/// Accumulates raw frequencies before IDF weights are known.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: HashMap<String, Vec<Occurrence>>,
    names: HashMap<String, DocId>,
    docs: Vec<(String, DocumentVector)>,
    indexed: bool,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one document and append an occurrence for each of its
    /// tokens. Fails once a whole collection has been indexed.
    pub fn add_document(&mut self, name: impl Into<String>, vector: DocumentVector) -> Result<DocId> {
        if self.indexed {
            return Err(VsrError::AlreadyIndexed);
        }
        self.insert(name.into(), vector)
    }

    fn insert(&mut self, name: String, vector: DocumentVector) -> Result<DocId> {
        if self.names.contains_key(&name) {
            return Err(VsrError::DuplicateDocument { name });
        }
        let id = self.docs.len() as DocId;
        for (token, count) in vector.iter() {
            self.postings
                .entry(token.to_string())
                .or_default()
                .push(Occurrence { doc: id, count });
        }
        self.names.insert(name.clone(), id);
        self.docs.push((name, vector));
        Ok(id)
    }

    /// Index a whole collection. A builder accepts exactly one collection,
    /// even an empty one, and refuses it after documents were added one by
    /// one.
    pub fn index_documents<I, N>(&mut self, documents: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, DocumentVector)>,
        N: Into<String>,
    {
        if self.indexed || !self.docs.is_empty() {
            return Err(VsrError::AlreadyIndexed);
        }
        self.indexed = true;
        for (name, vector) in documents {
            self.insert(name.into(), vector)?;
        }
        Ok(())
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    /// Compute IDFs, drop tokens present in every document and freeze the
    /// document lengths.
    pub fn finalize<S: Scorer>(self, scorer: S) -> Index<S> {
        let n = self.docs.len() as f64;
        let before = self.postings.len();
        let terms: HashMap<String, TermStats> = self
            .postings
            .into_iter()
            .filter_map(|(token, occurrences)| {
                let idf = (n / occurrences.len() as f64).ln();
                if idf == 0.0 {
                    return None;
                }
                Some((token, TermStats { occurrences, idf }))
            })
            .collect();

        let mut docs = Vec::with_capacity(self.docs.len());
        let mut vectors = Vec::with_capacity(self.docs.len());
        for (id, (name, vector)) in self.docs.into_iter().enumerate() {
            let sum_sq: f64 = vector
                .iter()
                .filter_map(|(token, count)| terms.get(token).map(|t| (t.idf * count).powi(2)))
                .sum();
            docs.push(DocumentRef { id: id as DocId, name, length: sum_sq.sqrt() });
            vectors.push(vector);
        }

        tracing::debug!(
            num_docs = docs.len(),
            num_terms = terms.len(),
            dropped = before - terms.len(),
            "index finalized"
        );
        Index { terms, docs, vectors, names: self.names, scorer }
    }
}

/// A finalized, read-only inverted index.
#[derive(Debug)]
pub struct Index<S = Cosine> {
    terms: HashMap<String, TermStats>,
    docs: Vec<DocumentRef>,
    vectors: Vec<DocumentVector>,
    names: HashMap<String, DocId>,
    scorer: S,
}

#[derive(Default)]
struct Accumulator {
    dot: f64,
    matched: usize,
}

impl<S: Scorer> Index<S> {
    /// Rank every document sharing at least one token with `query`.
    ///
    /// Query weights are `idf · count`; document weights are
    /// `idf · count`. Documents without a shared token are never scored.
    pub fn retrieve(&self, query: &DocumentVector) -> Vec<Retrieval> {
        let mut scratch: HashMap<DocId, Accumulator> = HashMap::new();
        let mut query_sq = 0.0;
        for (token, count) in query.iter() {
            let Some(stats) = self.terms.get(token) else { continue };
            let weight = stats.idf * count;
            for occ in &stats.occurrences {
                let acc = scratch.entry(occ.doc).or_default();
                acc.dot += weight * stats.idf * occ.count;
                acc.matched += 1;
            }
            query_sq += weight * weight;
        }
        let query_len = query_sq.sqrt();

        let mut retrievals: Vec<Retrieval> = scratch
            .into_iter()
            .map(|(id, acc)| {
                let doc = &self.docs[id as usize];
                let denom = query_len * doc.length;
                let cosine = if denom == 0.0 { 0.0 } else { acc.dot / denom };
                let hit = Hit { cosine, matched_terms: acc.matched, query_terms: query.len() };
                Retrieval { doc: id, score: self.scorer.score(doc, &hit) }
            })
            .collect();
        retrievals.sort_by(rank_order);
        retrievals
    }

    /// Swap the scoring strategy without rebuilding.
    pub fn with_scorer<T: Scorer>(self, scorer: T) -> Index<T> {
        Index { terms: self.terms, docs: self.docs, vectors: self.vectors, names: self.names, scorer }
    }

    /// Blend PageRank into the ranking. Fails unless `table` covers every
    /// indexed document.
    pub fn with_page_rank(self, table: &ScoreTable, page_weight: f64) -> Result<Index<PageRankBlend>> {
        let blend = PageRankBlend::new(table, page_weight, &self.docs)?;
        Ok(self.with_scorer(blend))
    }
}

impl<S> Index<S> {
    /// Number of indexed tokens.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn term(&self, token: &str) -> Option<&TermStats> {
        self.terms.get(token)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermStats)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn document(&self, id: DocId) -> Option<&DocumentRef> {
        self.docs.get(id as usize)
    }

    pub fn documents(&self) -> &[DocumentRef] {
        &self.docs
    }

    /// Raw-frequency vector the document was indexed with.
    pub fn document_vector(&self, id: DocId) -> Option<&DocumentVector> {
        self.vectors.get(id as usize)
    }

    /// Look a document up by name.
    pub fn find(&self, name: &str) -> Option<DocId> {
        self.names.get(name).copied()
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Print every token with its IDF, then the documents it occurs in with
    /// the occurrence count and document length.
    pub fn dump<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        let mut tokens: Vec<_> = self.terms.iter().collect();
        tokens.sort_by(|a, b| a.0.cmp(b.0));
        for (token, stats) in tokens {
            writeln!(out, "{token} (IDF={}) occurs in:", stats.idf)?;
            for occ in &stats.occurrences {
                let doc = &self.docs[occ.doc as usize];
                writeln!(out, "   {} {} times; |D|={}", doc.name, occ.count, doc.length)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Index {
        let mut b = IndexBuilder::new();
        b.index_documents([
            ("D1", DocumentVector::from_tokens(["cat", "dog"])),
            ("D2", DocumentVector::from_tokens(["dog", "bird"])),
            ("D3", DocumentVector::from_tokens(["cat", "cat", "bird"])),
        ])
        .unwrap();
        b.finalize(Cosine)
    }

    #[test]
    fn builds_once() {
        let mut b = IndexBuilder::new();
        b.index_documents([("a", DocumentVector::from_tokens(["x"]))]).unwrap();
        let again = b.index_documents([("b", DocumentVector::from_tokens(["y"]))]);
        assert!(matches!(again, Err(VsrError::AlreadyIndexed)));
    }

    #[test]
    fn empty_collection_still_counts_as_indexed() {
        let mut b = IndexBuilder::new();
        b.index_documents(Vec::<(String, DocumentVector)>::new()).unwrap();
        let again = b.index_documents([("a", DocumentVector::from_tokens(["x"]))]);
        assert!(matches!(again, Err(VsrError::AlreadyIndexed)));
        let single = b.add_document("b", DocumentVector::from_tokens(["y"]));
        assert!(matches!(single, Err(VsrError::AlreadyIndexed)));
        assert_eq!(b.num_docs(), 0);
    }

    #[test]
    fn collection_after_single_documents_is_refused() {
        let mut b = IndexBuilder::new();
        b.add_document("a", DocumentVector::from_tokens(["x"])).unwrap();
        let again = b.index_documents([("b", DocumentVector::from_tokens(["y"]))]);
        assert!(matches!(again, Err(VsrError::AlreadyIndexed)));
    }

    #[test]
    fn finds_documents_by_name() {
        let index = corpus();
        assert_eq!(index.find("D2"), Some(1));
        assert_eq!(index.find("D4"), None);
        let index = index.with_scorer(crate::scoring::QueryCoverage);
        assert_eq!(index.find("D3"), Some(2));
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut b = IndexBuilder::new();
        b.add_document("a", DocumentVector::from_tokens(["x"])).unwrap();
        let dup = b.add_document("a", DocumentVector::from_tokens(["y"]));
        assert!(matches!(dup, Err(VsrError::DuplicateDocument { .. })));
    }

    #[test]
    fn idf_and_lengths() {
        let index = corpus();
        let cat = index.term("cat").unwrap();
        let idf = (3.0f64 / 2.0).ln();
        assert!((cat.idf() - idf).abs() < 1e-12);
        assert_eq!(cat.doc_freq(), 2);

        // D3: cat x2, bird x1, both idf ln(3/2)
        let d3 = index.document(2).unwrap();
        let expected = ((2.0 * idf).powi(2) + idf.powi(2)).sqrt();
        assert!((d3.length() - expected).abs() < 1e-12);
    }

    #[test]
    fn token_in_every_document_is_dropped() {
        let mut b = IndexBuilder::new();
        b.add_document("a", DocumentVector::from_tokens(["the", "x"])).unwrap();
        b.add_document("b", DocumentVector::from_tokens(["the", "y"])).unwrap();
        let index = b.finalize(Cosine);
        assert!(index.term("the").is_none());
        assert_eq!(index.len(), 2);
        assert!(index.retrieve(&DocumentVector::from_tokens(["the"])).is_empty());
    }

    #[test]
    fn empty_and_unknown_queries_retrieve_nothing() {
        let index = corpus();
        assert!(index.retrieve(&DocumentVector::new()).is_empty());
        assert!(index.retrieve(&DocumentVector::from_tokens(["fish"])).is_empty());
    }

    #[test]
    fn ties_break_by_indexing_order() {
        let mut b = IndexBuilder::new();
        b.add_document("a", DocumentVector::from_tokens(["x"])).unwrap();
        b.add_document("b", DocumentVector::from_tokens(["x"])).unwrap();
        b.add_document("c", DocumentVector::from_tokens(["y"])).unwrap();
        let index = b.finalize(Cosine);
        let r = index.retrieve(&DocumentVector::from_tokens(["x"]));
        assert_eq!(r.iter().map(|r| r.doc).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(r[0].score, r[1].score);
    }

    #[test]
    fn dump_lists_tokens() {
        let index = corpus();
        let mut out = Vec::new();
        index.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("bird (IDF="));
        assert!(text.contains("   D3 2 times; |D|="));
    }
}
