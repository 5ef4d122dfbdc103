use serde_derive::{Deserialize, Serialize};

use super::correspondence::REFINE_PASSES;
use super::features::DEFAULT_INTERVAL;

/// Recognition parameters. The defaults are what reference datasets are tuned for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Arc-length spacing of feature points, in canonical-frame units.
    pub feature_interval: f64,
    /// How many coarse-pass candidates the fine pass re-ranks.
    pub coarse_shortlist: usize,
    /// Maximum number of labels returned.
    pub max_results: usize,
    /// An entry is considered only if its declared stroke count is greater
    /// than `input - window_below`...
    pub window_below: usize,
    /// ...and less than `input + window_above`.
    pub window_above: usize,
    /// Local-search passes of the correspondence solver.
    pub refine_passes: usize,
    /// Scale y by its own spread during moment normalization instead of reusing x's.
    pub per_axis_scale: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            feature_interval: DEFAULT_INTERVAL,
            coarse_shortlist: 100,
            max_results: 10,
            window_below: 2,
            window_above: 3,
            refine_passes: REFINE_PASSES,
            per_axis_scale: false,
        }
    }
}

impl RecognizerConfig {
    /// Whether an entry declaring `declared` strokes may match an input of `input` strokes.
    ///
    /// With the defaults, an input of 5 strokes accepts 4 to 7.
    pub fn accepts_stroke_count(&self, input: usize, declared: usize) -> bool {
        declared.saturating_add(self.window_below) > input && declared < input.saturating_add(self.window_above)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundaries() {
        let config = RecognizerConfig::default();
        let accepted: Vec<usize> = (0..12).filter(|&k| config.accepts_stroke_count(5, k)).collect();
        assert_eq!(accepted, [4, 5, 6, 7]);
        let accepted: Vec<usize> = (0..12).filter(|&k| config.accepts_stroke_count(1, k)).collect();
        assert_eq!(accepted, [0, 1, 2, 3]);
    }

    #[test]
    fn test_window_huge_counts() {
        let config = RecognizerConfig::default();
        assert!(!config.accepts_stroke_count(5, usize::MAX));
        assert!(!config.accepts_stroke_count(usize::MAX, 5));
        assert!(config.accepts_stroke_count(usize::MAX - 3, usize::MAX - 2));
    }

    #[test]
    fn test_partial_json() {
        let config: RecognizerConfig = serde_json::from_str("{\"max_results\": 3}").unwrap();
        assert_eq!(config.max_results, 3);
        assert_eq!(config.coarse_shortlist, 100);
        assert_eq!(config.feature_interval, 20.0);
    }
}
