//! Maps patterns into the 256×256 canonical frame before any comparison.
//!
//! Both normalizers are total: degenerate input (a single point, or a pattern
//! with no extent along the axis used for scaling) produces non-finite
//! coordinates instead of an error. The classifier turns those into
//! worst-possible scores.

use std::f64::consts::FRAC_PI_2;

use super::geometry::{Pattern, Point};

/// Side of the canonical frame.
pub const CANONICAL_SIZE: f64 = 256.0;

// Raw and central moments over all points of a pattern, strokes pooled.
struct Moments {
    m00: f64,
    xc: f64,
    yc: f64,
    mu20: f64,
    mu02: f64,
}

impl Moments {
    fn of(pattern: &Pattern) -> Moments {
        let m00 = pattern.point_count() as f64;
        let (m10, m01) = pattern.points().fold((0.0, 0.0), |(sx, sy), pt| (sx + pt.x, sy + pt.y));
        let xc = m10 / m00;
        let yc = m01 / m00;
        let (mu20, mu02) = pattern.points().fold((0.0, 0.0), |(sx, sy), pt| {
            let dx = pt.x - xc;
            let dy = pt.y - yc;
            (sx + dx * dx, sy + dy * dy)
        });
        Moments { m00, xc, yc, mu20, mu02 }
    }
}

// Non-linear aspect ratio compression: sqrt(sin(pi/2 * short/long)).
fn aspect_ratio_correction(width: f64, height: f64) -> f64 {
    let ratio = if height > width { width / height } else { height / width };
    (FRAC_PI_2 * ratio).sin().sqrt()
}

/// Moment normalization with `alpha` applied to both axes.
pub fn moment_normalize(pattern: &Pattern) -> Pattern {
    moment_normalize_with(pattern, false)
}

/// Moment normalization.
///
/// The shorter side of the drawing shrinks the matching side of the canonical
/// frame by [`aspect_ratio_correction`]; the centroid lands on the center of
/// that box, and the spread along x (four standard deviations) fills its
/// width. With `per_axis_scale` the y axis is scaled by its own spread
/// (`beta`); reference datasets are built with the uniform variant.
pub fn moment_normalize_with(pattern: &Pattern, per_axis_scale: bool) -> Pattern {
    let rect = pattern.bounding_rect();
    let old_width = rect.width();
    let old_height = rect.height();

    let r = aspect_ratio_correction(old_width, old_height);
    let mut box_width = CANONICAL_SIZE;
    let mut box_height = CANONICAL_SIZE;
    if old_height > old_width {
        box_width = r * CANONICAL_SIZE;
    } else {
        box_height = r * CANONICAL_SIZE;
    }
    let x_offset = (CANONICAL_SIZE - box_width) / 2.0;
    let y_offset = (CANONICAL_SIZE - box_height) / 2.0;

    let moments = Moments::of(pattern);
    let alpha = box_width / (4.0 * (moments.mu20 / moments.m00).sqrt());
    let beta = box_height / (4.0 * (moments.mu02 / moments.m00).sqrt());
    let y_scale = if per_axis_scale { beta } else { alpha };

    pattern.map_points(|pt| Point {
        x: alpha * (pt.x - moments.xc) + box_width / 2.0 + x_offset,
        y: y_scale * (pt.y - moments.yc) + box_height / 2.0 + y_offset,
    })
}

/// Stretches the bounding box onto the canonical frame, each axis independently.
pub fn linear_normalize(pattern: &Pattern) -> Pattern {
    let rect = pattern.bounding_rect();
    let sx = CANONICAL_SIZE / rect.width();
    let sy = CANONICAL_SIZE / rect.height();
    pattern.map_points(|pt| Point {
        x: (pt.x - rect.left) * sx,
        y: (pt.y - rect.top) * sy,
    })
}
