//! Relevance feedback with the Ide_regular algorithm.
//!
//! A [`Feedback`] session remembers the original query, the retrievals the
//! user is looking at, and which of them were judged relevant ("good") or
//! irrelevant ("bad"). [`Feedback::new_query`] then blends the exemplars'
//! raw term vectors into a copy of the query:
//!
//! ```text
//! q' = α·q/max(q) + Σ_good β·w·d/max(d) − Σ_bad γ·(−w)·d/max(d)
//! ```
//!
//! where `w` is the signed feedback weight the [`FeedbackPolicy`] assigned to
//! each judgment.

use crate::config::FeedbackParams;
use crate::error::{Result, VsrError};
use crate::index::{Index, Retrieval};
use crate::vector::DocumentVector;
use crate::DocId;
use std::collections::BTreeMap;

/// Maps a user judgment to a signed feedback weight.
pub trait FeedbackPolicy {
    type Judgment;

    /// Positive weights mark relevant documents, negative ones irrelevant
    /// documents; `None` records nothing.
    fn weight(&self, judgment: Self::Judgment) -> Result<Option<f64>>;
}

/// Relevant / irrelevant judgments with fixed weights of ±1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binary;

impl FeedbackPolicy for Binary {
    type Judgment = bool;

    fn weight(&self, relevant: bool) -> Result<Option<f64>> {
        Ok(Some(if relevant { 1.0 } else { -1.0 }))
    }
}

/// Continuous ratings in `[-1, 1]`; zero means "unsure".
#[derive(Debug, Clone, Copy, Default)]
pub struct Graded;

impl FeedbackPolicy for Graded {
    type Judgment = f64;

    fn weight(&self, rating: f64) -> Result<Option<f64>> {
        if !(-1.0..=1.0).contains(&rating) {
            return Err(VsrError::RatingOutOfRange { rating });
        }
        Ok((rating != 0.0).then_some(rating))
    }
}

#[derive(Debug, Clone, Copy)]
struct Exemplar<'a> {
    weight: f64,
    vector: &'a DocumentVector,
}

pub struct Feedback<'a, S, P> {
    index: &'a Index<S>,
    query: DocumentVector,
    retrievals: Vec<Retrieval>,
    policy: P,
    params: FeedbackParams,
    good: BTreeMap<DocId, Exemplar<'a>>,
    bad: BTreeMap<DocId, Exemplar<'a>>,
}

impl<'a, S, P: FeedbackPolicy> Feedback<'a, S, P> {
    pub fn new(index: &'a Index<S>, query: DocumentVector, retrievals: Vec<Retrieval>, policy: P) -> Self {
        Self {
            index,
            query,
            retrievals,
            policy,
            params: FeedbackParams::default(),
            good: BTreeMap::new(),
            bad: BTreeMap::new(),
        }
    }

    /// Override α, β and γ.
    pub fn params(mut self, params: FeedbackParams) -> Self {
        self.params = params;
        self
    }

    /// Record a judgment for `doc`, replacing any earlier one.
    pub fn judge(&mut self, doc: DocId, judgment: P::Judgment) -> Result<()> {
        let index: &'a Index<S> = self.index;
        let vector = index.document_vector(doc).ok_or(VsrError::UnknownDocument { doc })?;
        let weight = self.policy.weight(judgment)?;
        self.good.remove(&doc);
        self.bad.remove(&doc);
        match weight {
            Some(w) if w > 0.0 => {
                self.good.insert(doc, Exemplar { weight: w, vector });
            }
            Some(w) => {
                self.bad.insert(doc, Exemplar { weight: w, vector });
            }
            None => {}
        }
        Ok(())
    }

    /// Judge the document shown at 1-based `rank` of the current retrievals.
    pub fn judge_rank(&mut self, rank: usize, judgment: P::Judgment) -> Result<DocId> {
        let doc = rank
            .checked_sub(1)
            .and_then(|i| self.retrievals.get(i))
            .map(|r| r.doc)
            .ok_or(VsrError::UnknownRank { rank })?;
        self.judge(doc, judgment)?;
        Ok(doc)
    }

    pub fn have_feedback(&self, doc: DocId) -> bool {
        self.good.contains_key(&doc) || self.bad.contains_key(&doc)
    }

    pub fn is_empty(&self) -> bool {
        self.good.is_empty() && self.bad.is_empty()
    }

    /// Relevant documents with their (positive) weights.
    pub fn good(&self) -> impl Iterator<Item = (DocId, f64)> + '_ {
        self.good.iter().map(|(&doc, e)| (doc, e.weight))
    }

    /// Irrelevant documents with their (negative) weights.
    pub fn bad(&self) -> impl Iterator<Item = (DocId, f64)> + '_ {
        self.bad.iter().map(|(&doc, e)| (doc, e.weight))
    }

    pub fn query(&self) -> &DocumentVector {
        &self.query
    }

    pub fn retrievals(&self) -> &[Retrieval] {
        &self.retrievals
    }

    /// Replace the retrievals after re-running a revised query. Judgments
    /// are kept.
    pub fn set_retrievals(&mut self, retrievals: Vec<Retrieval>) {
        self.retrievals = retrievals;
    }

    /// Revised query. Reads the session state only, so repeated calls return
    /// the same vector.
    pub fn new_query(&self) -> DocumentVector {
        let mut revised = self.query.clone();
        scale_by_max(&mut revised, self.params.alpha);

        for exemplar in self.good.values() {
            let mut v = exemplar.vector.clone();
            scale_by_max(&mut v, self.params.beta);
            v.scale(exemplar.weight);
            revised.add(&v);
        }
        for exemplar in self.bad.values() {
            let mut v = exemplar.vector.clone();
            scale_by_max(&mut v, self.params.gamma);
            v.scale(-exemplar.weight);
            revised.subtract(&v);
        }
        revised
    }
}

/// Multiply by `factor / max_weight`, leaving empty or zero-max vectors alone.
fn scale_by_max(v: &mut DocumentVector, factor: f64) {
    if let Some(max) = v.max_weight().filter(|m| *m != 0.0) {
        v.scale(factor / max);
    }
}
