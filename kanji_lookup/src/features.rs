use super::geometry::{Pattern, Stroke};

/// Feature-point interval in canonical-frame units.
pub const DEFAULT_INTERVAL: f64 = 20.0;

// Share of the interval the leftover arc length must exceed to keep the true endpoint
const TRAILING_FRACTION: f64 = 0.75;

/// Resamples every stroke at roughly `interval` arc length.
///
/// The stroke count never changes. Every non-empty input stroke yields at
/// least two points.
pub fn extract_features(pattern: &Pattern, interval: f64) -> Pattern {
    Pattern::new(pattern.strokes.iter().map(|s| extract_stroke(s, interval)).collect())
}

fn extract_stroke(stroke: &Stroke, interval: f64) -> Stroke {
    let points = &stroke.points;
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Stroke::default();
    };
    let mut res = vec![first];
    // Carries the remainder past each emitted point so spacing stays even along the stroke
    let mut dist = 0.0;
    for j in 1..points.len() {
        dist += points[j - 1].euclid(points[j]);
        if dist >= interval && j > 1 {
            dist -= interval;
            res.push(points[j]);
        }
    }
    if res.len() == 1 || dist > TRAILING_FRACTION * interval {
        res.push(last);
    }
    Stroke::new(res)
}
