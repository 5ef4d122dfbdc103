use serde_derive::{Deserialize, Serialize};

/// One sampled pen position. Serialized as `[x, y]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// City-block distance, the unit of every stroke metric.
    pub fn manhattan(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn euclid(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from(xy: [f64; 2]) -> Self {
        Point { x: xy[0], y: xy[1] }
    }
}

impl From<Point> for [f64; 2] {
    fn from(pt: Point) -> Self {
        [pt.x, pt.y]
    }
}

/// One continuous pen-down to pen-up motion, in drawing order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Stroke {
        Stroke { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Joins strokes point after point, keeping each stroke's drawing order.
    pub fn concat(strokes: &[Stroke]) -> Stroke {
        let count = strokes.iter().map(Stroke::len).sum();
        let mut points = Vec::with_capacity(count);
        for stroke in strokes {
            points.extend_from_slice(&stroke.points);
        }
        Stroke { points }
    }
}

impl From<Vec<Point>> for Stroke {
    fn from(points: Vec<Point>) -> Self {
        Stroke { points }
    }
}

impl std::ops::Index<usize> for Stroke {
    type Output = Point;

    fn index(&self, ix: usize) -> &Point {
        &self.points[ix]
    }
}

/// A character's strokes in writing order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Pattern {
    pub strokes: Vec<Stroke>,
}

impl Pattern {
    pub fn new(strokes: Vec<Stroke>) -> Pattern {
        Pattern { strokes }
    }

    /// Builds a pattern from nested `[x, y]` arrays, the shape strokes take on the wire.
    pub fn from_coords(coords: &[Vec<[f64; 2]>]) -> Pattern {
        let strokes = coords
            .iter()
            .map(|stroke| Stroke::new(stroke.iter().map(|&xy| Point::from(xy)).collect()))
            .collect();
        Pattern { strokes }
    }

    /// Number of strokes.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.strokes.iter().flat_map(|s| s.points.iter().copied())
    }

    /// Applies `f` to every point, producing a new pattern with the same stroke layout.
    pub fn map_points<F: Fn(Point) -> Point>(&self, f: F) -> Pattern {
        let strokes = self
            .strokes
            .iter()
            .map(|s| Stroke::new(s.points.iter().map(|&pt| f(pt)).collect()))
            .collect();
        Pattern { strokes }
    }

    pub(crate) fn bounding_rect(&self) -> Rect {
        let mut res = Rect {
            top: f64::MAX,
            bottom: f64::MIN,
            left: f64::MAX,
            right: f64::MIN,
        };
        for pt in self.points() {
            res.left = res.left.min(pt.x);
            res.right = res.right.max(pt.x);
            res.top = res.top.min(pt.y);
            res.bottom = res.bottom.max(pt.y);
        }
        res
    }
}

impl From<Vec<Stroke>> for Pattern {
    fn from(strokes: Vec<Stroke>) -> Self {
        Pattern { strokes }
    }
}

impl std::ops::Index<usize> for Pattern {
    type Output = Stroke;

    fn index(&self, ix: usize) -> &Stroke {
        &self.strokes[ix]
    }
}

// Axis-aligned extent of a pattern; y grows downwards as on a canvas.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        (self.right - self.left).abs()
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).abs()
    }
}
