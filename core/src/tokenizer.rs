//! Document source helper: turns raw text into the token → count vectors the
//! index consumes.

use crate::vector::DocumentVector;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Function words dropped before indexing.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at",
    "be", "been", "but", "by", "can", "could", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into", "is",
    "it", "its", "may", "more", "no", "not", "of", "on", "or", "our", "she", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "to", "was", "we", "were", "what", "when", "which",
    "who", "will", "with", "would", "you", "your",
];

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref MARKUP: Regex =
        Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->|<[^>]*>|&[a-z]+;|&#[0-9]+;")
            .expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPSET: HashSet<&'static str> = STOPWORDS.iter().copied().collect();
}

fn is_stopword(token: &str) -> bool {
    STOPSET.contains(token)
}

/// Blank out tags, comments, script and style bodies and character entities
/// of a crawled page so only its visible text is tokenized.
pub fn strip_markup(html: &str) -> String {
    MARKUP.replace_all(html, " ").into_owned()
}

/// Tokenize text into (term, position) using NFKC normalization, lowercase and
/// stopword removal, optionally reducing each term to its English stem.
pub fn tokenize(text: &str, stem: bool) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for (pos, mat) in RE.find_iter(&normalized).enumerate() {
        let token = mat.as_str();
        if is_stopword(token) { continue; }
        let term = if stem { STEMMER.stem(token).into_owned() } else { token.to_string() };
        tokens.push((term, pos));
    }
    tokens
}

/// Raw term-frequency vector of `text`.
pub fn vectorize(text: &str, stem: bool) -> DocumentVector {
    DocumentVector::from_tokens(tokenize(text, stem).into_iter().map(|(term, _pos)| term))
}
