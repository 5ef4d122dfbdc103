use std::cmp::Ordering;

use serde_derive::Serialize;

/// A dataset entry scored against the input; lower scores are better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub score: f64,
}

impl Candidate {
    pub fn new(index: usize, score: f64) -> Candidate {
        Candidate { index, score }
    }
}

/// A recognized label together with its fine-pass score.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Match {
    pub label: String,
    pub score: f64,
}

// Non-finite scores (NaN, infinities) rank after every finite score and tie with each other.
fn cmp_scores(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Best-first order: ascending score, then ascending dataset index.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| cmp_scores(a.score, b.score).then(a.index.cmp(&b.index)));
}
