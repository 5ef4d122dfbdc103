//! Stroke-to-stroke dissimilarity measures. All of them work on Manhattan
//! distances between canonical-frame points; lower is more similar.

use serde_derive::{Deserialize, Serialize};

use super::geometry::Stroke;

/// Selects the stroke metric a correspondence search runs with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrokeMetric {
    /// [`endpoint_distance`]
    Endpoint,
    /// [`initial_distance`]
    Initial,
    /// [`whole_whole_distance`]
    WholeWhole,
}

impl StrokeMetric {
    pub fn distance(self, a: &Stroke, b: &Stroke) -> f64 {
        match self {
            StrokeMetric::Endpoint => endpoint_distance(a, b),
            StrokeMetric::Initial => initial_distance(a, b),
            StrokeMetric::WholeWhole => whole_whole_distance(a, b),
        }
    }
}

/// Start-to-start plus end-to-end distance. Zero when either stroke is empty.
pub fn endpoint_distance(a: &Stroke, b: &Stroke) -> f64 {
    match (a.first(), a.last(), b.first(), b.last()) {
        (Some(a0), Some(a1), Some(b0), Some(b1)) => a0.manhattan(b0) + a1.manhattan(b1),
        _ => 0.0,
    }
}

/// Point-by-point distance over the common prefix, scaled up by the length ratio.
///
/// NaN when either stroke is empty.
pub fn initial_distance(a: &Stroke, b: &Stroke) -> f64 {
    let l_min = a.len().min(b.len());
    let l_max = a.len().max(b.len());
    let dist: f64 = a.points.iter().zip(&b.points).map(|(p, q)| p.manhattan(*q)).sum();
    dist * (l_max as f64 / l_min as f64)
}

/// Mean distance between the shorter stroke's points and evenly strided points of the longer one.
///
/// The stride is the integer ratio of the lengths and the mean is truncated
/// toward zero, so results are whole numbers. NaN when the shorter stroke is
/// empty.
pub fn whole_whole_distance(a: &Stroke, b: &Stroke) -> f64 {
    let (longer, shorter) = if a.len() < b.len() { (b, a) } else { (a, b) };
    let m = shorter.len();
    if m == 0 {
        return f64::NAN;
    }
    let step = longer.len() / m;
    let dist: f64 = shorter
        .points
        .iter()
        .enumerate()
        .map(|(i, pt)| longer[step * i].manhattan(*pt))
        .sum();
    (dist / m as f64).trunc()
}
