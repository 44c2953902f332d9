//! Sparse token → weight vectors.
//!
//! A [`DocumentVector`] holds raw term frequencies while a document is being
//! indexed, and arbitrary (possibly negative) weights once relevance feedback
//! has blended exemplars into a query. Tokens are kept sorted so iteration
//! order, and therefore floating point summation order, is deterministic.

use std::collections::btree_map::{self, BTreeMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentVector {
    weights: BTreeMap<String, f64>,
}

impl DocumentVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count each token once per occurrence.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut v = Self::new();
        for token in tokens {
            v.increment(token, 1.0);
        }
        v
    }

    /// Add `by` to the weight of `token`, creating the entry if needed.
    pub fn increment(&mut self, token: impl Into<String>, by: f64) {
        *self.weights.entry(token.into()).or_insert(0.0) += by;
    }

    /// Overwrite the weight of `token`.
    pub fn insert(&mut self, token: impl Into<String>, weight: f64) {
        self.weights.insert(token.into(), weight);
    }

    /// Weight of `token`, zero when absent.
    pub fn get(&self, token: &str) -> f64 {
        self.weights.get(token).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.weights.contains_key(token)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { inner: self.weights.iter() }
    }

    /// Multiply every weight by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for w in self.weights.values_mut() {
            *w *= factor;
        }
    }

    /// Elementwise `self += other`.
    pub fn add(&mut self, other: &DocumentVector) {
        for (token, w) in other.iter() {
            self.increment(token, w);
        }
    }

    /// Elementwise `self -= other`. Tokens only present in `other` end up
    /// with negative weights.
    pub fn subtract(&mut self, other: &DocumentVector) {
        for (token, w) in other.iter() {
            self.increment(token, -w);
        }
    }

    /// Largest weight, `None` for an empty vector.
    pub fn max_weight(&self) -> Option<f64> {
        self.weights.values().copied().reduce(f64::max)
    }

    pub fn dot(&self, other: &DocumentVector) -> f64 {
        // walk the shorter vector
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.iter().map(|(token, w)| w * large.get(token)).sum()
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Cosine of the angle between the two vectors; zero if either is the
    /// zero vector.
    pub fn cosine(&self, other: &DocumentVector) -> f64 {
        let denom = self.length() * other.length();
        if denom == 0.0 {
            return 0.0;
        }
        self.dot(other) / denom
    }
}

/// Iterator over `(token, weight)` in token order.
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, f64>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), *v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a DocumentVector {
    type Item = (&'a str, f64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for DocumentVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut v = Self::new();
        for (token, w) in iter {
            v.increment(token, w);
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(pairs: &[(&str, f64)]) -> DocumentVector {
        pairs.iter().map(|&(t, w)| (t, w)).collect()
    }

    #[test]
    fn counts_tokens() {
        let d = DocumentVector::from_tokens(["cat", "cat", "bird"]);
        assert_eq!(d.get("cat"), 2.0);
        assert_eq!(d.get("bird"), 1.0);
        assert_eq!(d.get("dog"), 0.0);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn add_and_subtract_create_entries() {
        let mut a = v(&[("x", 1.0)]);
        a.add(&v(&[("x", 2.0), ("y", 1.0)]));
        assert_eq!(a.get("x"), 3.0);
        assert_eq!(a.get("y"), 1.0);
        a.subtract(&v(&[("z", 0.5)]));
        assert_eq!(a.get("z"), -0.5);
    }

    #[test]
    fn copy_does_not_alias() {
        let a = v(&[("x", 1.0)]);
        let mut b = a.clone();
        b.scale(4.0);
        assert_eq!(a.get("x"), 1.0);
        assert_eq!(b.get("x"), 4.0);
    }

    #[test]
    fn max_weight_of_empty_is_none() {
        assert_eq!(DocumentVector::new().max_weight(), None);
        assert_eq!(v(&[("a", -2.0), ("b", -1.0)]).max_weight(), Some(-1.0));
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let a = v(&[("x", 1.0), ("y", 2.0)]);
        let b = v(&[("x", 3.0), ("y", 6.0)]);
        assert!((a.cosine(&b) - 1.0).abs() < 1e-12);
        assert_eq!(a.cosine(&DocumentVector::new()), 0.0);
        let c = v(&[("z", 1.0)]);
        assert_eq!(a.cosine(&c), 0.0);
    }
}
