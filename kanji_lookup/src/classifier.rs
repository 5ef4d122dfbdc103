//! Two-stage nearest-neighbour classification.
//!
//! The coarse pass scores every entry in the stroke-count window with the
//! cheap endpoint metric. The fine pass re-ranks the best of those with the
//! length-weighted whole-whole distance. Scores that come out non-finite
//! (degenerate geometry, empty reference strokes) are not errors: they rank
//! after every finite score.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::candidates::{rank, Candidate, Match};
use super::config::RecognizerConfig;
use super::correspondence::{build_map_with_passes, complete_map, compute_distance, compute_whole_distance_weighted};
use super::dataset::{Dataset, DatasetEntry};
use super::distance::StrokeMetric;
use super::error::LookupError;
use super::features::extract_features;
use super::geometry::Pattern;
use super::normalize::moment_normalize_with;

/// Moment normalization followed by feature extraction: the form both inputs and references are compared in.
pub fn prepare_pattern(pattern: &Pattern, config: &RecognizerConfig) -> Pattern {
    let normalized = moment_normalize_with(pattern, config.per_axis_scale);
    extract_features(&normalized, config.feature_interval)
}

/// Recognizes `input` against `dataset` with the default configuration.
///
/// Returns up to 10 labels, best first. Labels repeat if the dataset has
/// several entries for the same character.
pub fn recognize(input: &Pattern, dataset: &Dataset) -> Vec<String> {
    let config = RecognizerConfig::default();
    let ranked = classify(input, dataset, &config);
    labels(dataset, &ranked, config.max_results)
}

/// A dataset shared between any number of concurrent recognition calls.
#[derive(Debug, Clone)]
pub struct Recognizer {
    dataset: Arc<Dataset>,
    config: RecognizerConfig,
}

impl Recognizer {
    pub fn new(dataset: impl Into<Arc<Dataset>>) -> Recognizer {
        Recognizer::with_config(dataset, RecognizerConfig::default())
    }

    pub fn with_config(dataset: impl Into<Arc<Dataset>>, config: RecognizerConfig) -> Recognizer {
        Recognizer {
            dataset: dataset.into(),
            config,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn recognize(&self, input: &Pattern) -> Vec<String> {
        self.recognize_with_scores(input).into_iter().map(|m| m.label).collect()
    }

    /// Like [`Recognizer::recognize`], keeping the fine-pass score of each label.
    pub fn recognize_with_scores(&self, input: &Pattern) -> Vec<Match> {
        let ranked = classify(input, &self.dataset, &self.config);
        self.matches(&ranked)
    }

    /// Recognition that gives up with [`LookupError::Cancelled`] once `cancel` is raised.
    ///
    /// The flag is polled before each dataset entry is scored.
    pub fn recognize_cancellable(&self, input: &Pattern, cancel: &AtomicBool) -> Result<Vec<String>, LookupError> {
        let ranked = classify_cancellable(input, &self.dataset, &self.config, cancel)?;
        Ok(labels(&self.dataset, &ranked, self.config.max_results))
    }

    fn matches(&self, ranked: &[Candidate]) -> Vec<Match> {
        ranked
            .iter()
            .take(self.config.max_results)
            .map(|c| Match {
                label: self.dataset[c.index].label.clone(),
                score: c.score,
            })
            .collect()
    }
}

fn labels(dataset: &Dataset, ranked: &[Candidate], limit: usize) -> Vec<String> {
    ranked.iter().take(limit).map(|c| dataset[c.index].label.clone()).collect()
}

// Full pipeline; returns every fine-pass candidate, best first.
fn classify(input: &Pattern, dataset: &Dataset, config: &RecognizerConfig) -> Vec<Candidate> {
    if input.is_empty() || dataset.is_empty() {
        return Vec::new();
    }
    let prepared = prepare_pattern(input, config);
    let eligible = coarse_window(&prepared, dataset, config);
    let coarse = ranked_coarse(
        scan(&eligible, |ix| coarse_score(&prepared, &dataset[ix], config)),
        &prepared,
        dataset,
    );
    let eligible = fine_window(&prepared, dataset, &coarse, config);
    ranked_fine(scan(&eligible, |ix| fine_score(&prepared, &dataset[ix].pattern, config)), dataset)
}

fn classify_cancellable(
    input: &Pattern,
    dataset: &Dataset,
    config: &RecognizerConfig,
    cancel: &AtomicBool,
) -> Result<Vec<Candidate>, LookupError> {
    if input.is_empty() || dataset.is_empty() {
        return Ok(Vec::new());
    }
    let prepared = prepare_pattern(input, config);
    let coarse = coarse_classification(&prepared, dataset, config, Some(cancel))?;
    fine_classification(&prepared, dataset, &coarse, config, Some(cancel))
}

/// Endpoint-distance scan over every entry in the stroke-count window, best first.
///
/// `input` must already be prepared with [`prepare_pattern`]. Only a raised
/// `cancel` flag makes this fail.
pub fn coarse_classification(
    input: &Pattern,
    dataset: &Dataset,
    config: &RecognizerConfig,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Candidate>, LookupError> {
    let eligible = coarse_window(input, dataset, config);
    let score = |ix: usize| coarse_score(input, &dataset[ix], config);
    let candidates = match cancel {
        Some(flag) => scan_cancellable(&eligible, flag, score)?,
        None => scan(&eligible, score),
    };
    Ok(ranked_coarse(candidates, input, dataset))
}

/// Weighted whole-whole re-ranking of the first `config.coarse_shortlist` coarse candidates, best first.
///
/// `input` must already be prepared with [`prepare_pattern`].
pub fn fine_classification(
    input: &Pattern,
    dataset: &Dataset,
    coarse: &[Candidate],
    config: &RecognizerConfig,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Candidate>, LookupError> {
    let eligible = fine_window(input, dataset, coarse, config);
    let score = |ix: usize| fine_score(input, &dataset[ix].pattern, config);
    let candidates = match cancel {
        Some(flag) => scan_cancellable(&eligible, flag, score)?,
        None => scan(&eligible, score),
    };
    Ok(ranked_fine(candidates, dataset))
}

fn coarse_window(input: &Pattern, dataset: &Dataset, config: &RecognizerConfig) -> Vec<usize> {
    dataset
        .iter()
        .enumerate()
        .filter(|(_, entry)| config.accepts_stroke_count(input.len(), entry.stroke_count))
        .map(|(ix, _)| ix)
        .collect()
}

fn fine_window(input: &Pattern, dataset: &Dataset, coarse: &[Candidate], config: &RecognizerConfig) -> Vec<usize> {
    coarse
        .iter()
        .take(config.coarse_shortlist)
        .map(|c| c.index)
        .filter(|&ix| config.accepts_stroke_count(input.len(), dataset[ix].stroke_count))
        .collect()
}

fn ranked_coarse(mut candidates: Vec<Candidate>, input: &Pattern, dataset: &Dataset) -> Vec<Candidate> {
    rank(&mut candidates);
    debug!(
        "coarse pass: {} of {} entries in stroke window for {} input strokes",
        candidates.len(),
        dataset.len(),
        input.len()
    );
    candidates
}

fn ranked_fine(mut candidates: Vec<Candidate>, dataset: &Dataset) -> Vec<Candidate> {
    rank(&mut candidates);
    debug!("fine pass: {} candidates re-ranked", candidates.len());
    if let Some(best) = candidates.first() {
        trace!("best fine candidate: {} ({})", dataset[best.index].label, best.score);
    }
    candidates
}

// Scores the entries at `indexes`, keeping their order.
fn scan<F>(indexes: &[usize], score: F) -> Vec<Candidate>
where
    F: Fn(usize) -> f64 + Sync,
{
    #[cfg(feature = "parallel")]
    let iter = indexes.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = indexes.iter();
    iter.map(|&ix| Candidate::new(ix, score(ix))).collect()
}

// Like `scan`, stopping early once `cancel` is raised.
fn scan_cancellable<F>(indexes: &[usize], cancel: &AtomicBool, score: F) -> Result<Vec<Candidate>, LookupError>
where
    F: Fn(usize) -> f64 + Sync,
{
    let score_one = |&ix: &usize| {
        if cancel.load(Ordering::Relaxed) {
            None
        } else {
            Some(Candidate::new(ix, score(ix)))
        }
    };
    #[cfg(feature = "parallel")]
    let scored: Option<Vec<Candidate>> = indexes.par_iter().map(score_one).collect();
    #[cfg(not(feature = "parallel"))]
    let scored: Option<Vec<Candidate>> = indexes.iter().map(score_one).collect();
    scored.ok_or(LookupError::Cancelled)
}

// Larger over smaller stroke count; 1 for equal counts.
fn length_penalty(a: usize, b: usize) -> f64 {
    a.max(b) as f64 / a.min(b) as f64
}

// An entry whose pattern does not have the stroke count it declares is
// penalized by the mismatch; the input's own count only gates the window.
fn coarse_score(input: &Pattern, entry: &DatasetEntry, config: &RecognizerConfig) -> f64 {
    let metric = StrokeMetric::Endpoint;
    let reference = &entry.pattern;
    let map = build_map_with_passes(reference, input, metric, config.refine_passes);
    match complete_map(reference, input, metric, map) {
        Some(map) => {
            compute_distance(reference, input, metric, &map) * length_penalty(entry.stroke_count, reference.len())
        }
        None => f64::INFINITY,
    }
}

fn fine_score(input: &Pattern, reference: &Pattern, config: &RecognizerConfig) -> f64 {
    let map = build_map_with_passes(reference, input, StrokeMetric::Initial, config.refine_passes);
    match complete_map(reference, input, StrokeMetric::WholeWhole, map) {
        Some(map) => {
            let dist = compute_whole_distance_weighted(reference, input, &map);
            dist / input.len().min(reference.len()) as f64
        }
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each stroke pattern is unlike the others
    static DATASET: &str = "[[\"一\",1,[[[0,0],[100,0]]]],[\"二\",2,[[[0,0],[100,0]],[[0,50],[100,50]]]],[\"十\",2,[[[0,50],[100,50]],[[50,0],[50,100]]]],[\"人\",2,[[[50,0],[10,100]],[[50,30],[90,100]]]],[\"口\",3,[[[0,0],[0,100]],[[0,0],[100,0],[100,100]],[[0,100],[100,100]]]]]";

    fn dataset() -> Dataset {
        Dataset::from_json_str(DATASET).unwrap()
    }

    #[test]
    fn test_length_penalty() {
        assert_eq!(length_penalty(3, 3), 1.0);
        assert_eq!(length_penalty(2, 6), 3.0);
        assert_eq!(length_penalty(6, 2), 3.0);
        assert!(length_penalty(0, 2).is_infinite());
    }

    #[test]
    fn test_coarse_penalty_uses_declared_count() {
        let config = RecognizerConfig::default();
        let prepared = dataset().prepare(&config);
        // Two input strokes against a one-stroke entry declaring one
        let input = &prepared[1].pattern;
        let single = &prepared[0];
        let metric = StrokeMetric::Endpoint;
        let map = build_map_with_passes(&single.pattern, input, metric, config.refine_passes);
        let map = complete_map(&single.pattern, input, metric, map).unwrap();
        let raw = compute_distance(&single.pattern, input, metric, &map);
        assert!(raw > 0.0 && raw.is_finite());
        assert_eq!(coarse_score(input, single, &config), raw);

        let overdeclared = DatasetEntry::new("一", 3, single.pattern.clone());
        assert_eq!(coarse_score(input, &overdeclared, &config), raw * 3.0);
    }

    #[test]
    fn test_self_match_scores_zero() {
        let config = RecognizerConfig::default();
        let prepared = dataset().prepare(&config);
        for entry in prepared.iter() {
            assert_eq!(fine_score(&entry.pattern, &entry.pattern, &config), 0.0);
            assert_eq!(coarse_score(&entry.pattern, entry, &config), 0.0);
        }
    }

    #[test]
    fn test_coarse_covers_window_only() {
        let config = RecognizerConfig::default();
        let dataset = dataset().prepare(&config);
        let input = dataset[4].pattern.clone();
        let coarse = coarse_classification(&input, &dataset, &config, None).unwrap();
        // Three strokes accept declared counts 2 to 5
        let mut indexes: Vec<usize> = coarse.iter().map(|c| c.index).collect();
        indexes.sort_unstable();
        assert_eq!(indexes, [1, 2, 3, 4]);
        assert_eq!(coarse[0].index, 4);
    }

    #[test]
    fn test_shortlist_limits_fine_pass() {
        let config = RecognizerConfig {
            coarse_shortlist: 2,
            ..RecognizerConfig::default()
        };
        let prepared = dataset().prepare(&config);
        let input = prepared[3].pattern.clone();
        let coarse = coarse_classification(&input, &prepared, &config, None).unwrap();
        assert!(coarse.len() > 2);
        let fine = fine_classification(&input, &prepared, &coarse, &config, None).unwrap();
        assert_eq!(fine.len(), 2);
        assert_eq!(fine[0].index, 3);
    }

    #[test]
    fn test_recognizer_scores() {
        let config = RecognizerConfig::default();
        let recognizer = Recognizer::new(dataset().prepare(&config));
        let matches = recognizer.recognize_with_scores(&dataset()[2].pattern);
        assert_eq!(matches[0].label, "十");
        assert_eq!(matches[0].score, 0.0);
        assert!(matches.windows(2).all(|w| w[0].score <= w[1].score || !w[1].score.is_finite()));
    }

    #[test]
    fn test_cancelled() {
        let recognizer = Recognizer::new(dataset());
        let cancel = AtomicBool::new(true);
        let res = recognizer.recognize_cancellable(&dataset()[0].pattern, &cancel);
        assert!(matches!(res, Err(LookupError::Cancelled)));
        cancel.store(false, Ordering::Relaxed);
        let res = recognizer.recognize_cancellable(&dataset()[0].pattern, &cancel).unwrap();
        assert_eq!(res, recognizer.recognize(&dataset()[0].pattern));
    }
}
