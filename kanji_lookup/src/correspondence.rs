//! Elastic stroke correspondence between two patterns with different stroke counts.
//!
//! Every stroke of the pattern with more strokes (the *longer* one) is mapped
//! to one stroke of the other pattern. Where the longer pattern has extra
//! strokes, contiguous runs of them share a target and are compared as one
//! concatenated stroke (a merge group).

use std::borrow::Cow;
use std::ops::Range;

use super::distance::{whole_whole_distance, StrokeMetric};
use super::geometry::{Pattern, Stroke};

/// Local-search passes applied after greedy initialization.
pub const REFINE_PASSES: usize = 3;

/// Target of one longer-pattern stroke while the map is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Assigned(usize),
    Unassigned,
}

impl Slot {
    pub fn target(self) -> Option<usize> {
        match self {
            Slot::Assigned(ix) => Some(ix),
            Slot::Unassigned => None,
        }
    }
}

/// Partial map: one slot per stroke of the longer pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrespondenceMap {
    slots: Vec<Slot>,
}

impl CorrespondenceMap {
    pub fn from_slots(slots: Vec<Slot>) -> CorrespondenceMap {
        CorrespondenceMap { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| *s != Slot::Unassigned)
    }
}

/// A contiguous run of longer-pattern strokes and the shorter-pattern stroke it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub strokes: Range<usize>,
    pub target: usize,
}

/// Completed map: every longer-pattern stroke has a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrokeMap {
    targets: Vec<usize>,
}

impl StrokeMap {
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Runs of equal consecutive targets, in stroke order.
    pub fn groups(&self) -> Vec<MergeGroup> {
        let mut res = Vec::new();
        let mut start = 0;
        while start < self.targets.len() {
            let target = self.targets[start];
            let mut stop = start + 1;
            while stop < self.targets.len() && self.targets[stop] == target {
                stop += 1;
            }
            res.push(MergeGroup { strokes: start..stop, target });
            start = stop;
        }
        res
    }
}

/// Orders two patterns as (longer, shorter) by stroke count; the first wins ties.
///
/// Every function in this module applies the same ordering, so a map built for
/// `(a, b)` is interpreted consistently by the others.
pub fn order_by_length<'a>(a: &'a Pattern, b: &'a Pattern) -> (&'a Pattern, &'a Pattern) {
    if a.len() < b.len() {
        (b, a)
    } else {
        (a, b)
    }
}

// A single stroke is borrowed; only real merges allocate.
fn merged(strokes: &[Stroke]) -> Cow<'_, Stroke> {
    match strokes {
        [single] => Cow::Borrowed(single),
        _ => Cow::Owned(Stroke::concat(strokes)),
    }
}

/// Greedy assignment refined by [`REFINE_PASSES`] passes of pairwise swaps.
pub fn build_map(a: &Pattern, b: &Pattern, metric: StrokeMetric) -> CorrespondenceMap {
    build_map_with_passes(a, b, metric, REFINE_PASSES)
}

pub fn build_map_with_passes(a: &Pattern, b: &Pattern, metric: StrokeMetric, passes: usize) -> CorrespondenceMap {
    let (longer, shorter) = order_by_length(a, b);
    let mut slots = greedy_slots(longer, shorter, metric);
    for _ in 0..passes {
        refine_slots(longer, shorter, metric, &mut slots);
    }
    CorrespondenceMap { slots }
}

// Each shorter stroke, in order, takes the nearest longer stroke still free.
fn greedy_slots(longer: &Pattern, shorter: &Pattern, metric: StrokeMetric) -> Vec<Slot> {
    let mut slots = vec![Slot::Unassigned; longer.len()];
    for (i, target) in shorter.strokes.iter().enumerate() {
        if let Some(j) = nearest_free(&slots, longer, target, metric) {
            slots[j] = Slot::Assigned(i);
        }
    }
    slots
}

fn nearest_free(slots: &[Slot], longer: &Pattern, target: &Stroke, metric: StrokeMetric) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, stroke) in longer.strokes.iter().enumerate() {
        if slots[j] != Slot::Unassigned {
            continue;
        }
        let d = metric.distance(stroke, target);
        let better = match best {
            None => true,
            Some((_, min)) => d < min || (min.is_nan() && !d.is_nan()),
        };
        if better {
            best = Some((j, d));
        }
    }
    best.map(|(j, _)| j)
}

// One pass of local search. A swap is taken as soon as it strictly lowers the
// summed distance of the two slots involved; moving a target onto a free slot
// is taken when that slot is strictly closer.
fn refine_slots(longer: &Pattern, shorter: &Pattern, metric: StrokeMetric, slots: &mut [Slot]) {
    let d = |li: usize, si: usize| metric.distance(&longer[li], &shorter[si]);
    for i in 0..slots.len() {
        let Slot::Assigned(ti) = slots[i] else {
            continue;
        };
        let mut dii = d(i, ti);
        for j in 0..slots.len() {
            // Slot i changes under us: swapped, or vacated by a move
            let Slot::Assigned(ti) = slots[i] else {
                break;
            };
            match slots[j] {
                Slot::Assigned(tj) => {
                    let djj = d(j, tj);
                    let dij = d(j, ti);
                    let dji = d(i, tj);
                    if dji + dij < dii + djj {
                        slots[j] = Slot::Assigned(ti);
                        slots[i] = Slot::Assigned(tj);
                        dii = dji;
                    }
                }
                Slot::Unassigned => {
                    let dij = d(j, ti);
                    if dij < dii {
                        slots[j] = Slot::Assigned(ti);
                        slots[i] = Slot::Unassigned;
                    }
                }
            }
        }
    }
}

/// Fills every unassigned slot, turning extra longer-pattern strokes into merge groups.
///
/// Leading and trailing gaps take the target of the nearest assigned slot.
/// An interior gap between assigned slots `start` and `stop` is split where
/// the concatenation `start..=j` compared against `start`'s target plus
/// `j+1..=stop` against `stop`'s target is smallest.
///
/// Returns `None` only if nothing was assigned, i.e. the shorter pattern has no strokes.
pub fn complete_map(a: &Pattern, b: &Pattern, metric: StrokeMetric, map: CorrespondenceMap) -> Option<StrokeMap> {
    let (longer, shorter) = order_by_length(a, b);
    let mut slots = map.slots;
    let first = slots.iter().position(|s| *s != Slot::Unassigned)?;
    let last = slots.iter().rposition(|s| *s != Slot::Unassigned)?;

    let first_target = slots[first];
    slots[..first].fill(first_target);
    let last_target = slots[last];
    slots[last + 1..].fill(last_target);

    let mut start = first;
    while start < last {
        if slots[start + 1] != Slot::Unassigned {
            start += 1;
            continue;
        }
        let stop = (start + 1..=last).find(|&ix| slots[ix] != Slot::Unassigned).unwrap_or(last);
        let (Some(left), Some(right)) = (slots[start].target(), slots[stop].target()) else {
            break;
        };
        let div = best_split(longer, shorter, metric, start, stop, left, right);
        slots[start..=div].fill(Slot::Assigned(left));
        slots[div + 1..stop].fill(Slot::Assigned(right));
        start = stop;
    }

    let targets = slots.iter().map(|s| s.target()).collect::<Option<Vec<usize>>>()?;
    Some(StrokeMap { targets })
}

// Last stroke of the left run for the gap between assigned slots start and stop.
fn best_split(
    longer: &Pattern,
    shorter: &Pattern,
    metric: StrokeMetric,
    start: usize,
    stop: usize,
    left: usize,
    right: usize,
) -> usize {
    let mut div = start;
    let mut min_dist = f64::INFINITY;
    for j in start..stop {
        let head = merged(&longer.strokes[start..=j]);
        let tail = merged(&longer.strokes[j + 1..=stop]);
        let dist = metric.distance(&head, &shorter[left]) + metric.distance(&tail, &shorter[right]);
        if dist < min_dist {
            div = j;
            min_dist = dist;
        }
    }
    div
}

/// Sum of `metric` over merge groups, each group compared as one concatenated stroke.
pub fn compute_distance(a: &Pattern, b: &Pattern, metric: StrokeMetric, map: &StrokeMap) -> f64 {
    let (longer, shorter) = order_by_length(a, b);
    map.groups()
        .iter()
        .map(|g| metric.distance(&shorter[g.target], &merged(&longer.strokes[g.strokes.clone()])))
        .sum()
}

/// Whole-whole distance over merge groups, with merged groups weighted by
/// how much longer (in points) the merge is than its target, or vice versa.
pub fn compute_whole_distance_weighted(a: &Pattern, b: &Pattern, map: &StrokeMap) -> f64 {
    let (longer, shorter) = order_by_length(a, b);
    let mut dist = 0.0;
    for group in map.groups() {
        let target = &shorter[group.target];
        let concat = merged(&longer.strokes[group.strokes.clone()]);
        let mut group_dist = whole_whole_distance(target, &concat);
        if group.strokes.len() > 1 {
            let mm = target.len().min(concat.len());
            let nn = target.len().max(concat.len());
            group_dist *= nn as f64 / mm as f64;
        }
        dist += group_dist;
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(json: &str) -> Pattern {
        serde_json::from_str(json).unwrap()
    }

    // Strokes spread over the frame so that no two are alike
    fn fan(count: usize) -> Pattern {
        let coords: Vec<Vec<[f64; 2]>> = (0..count)
            .map(|i| {
                let x = 20.0 + 37.0 * i as f64;
                let y = 10.0 + 23.0 * ((i * 5) % 7) as f64;
                vec![[x, y], [x + 15.0, y + 40.0], [x + 5.0, y + 90.0]]
            })
            .collect();
        Pattern::from_coords(&coords)
    }

    #[test]
    fn test_identity_map() {
        let a = fan(5);
        let map = build_map(&a, &a, StrokeMetric::Endpoint);
        let expected: Vec<Slot> = (0..5).map(Slot::Assigned).collect();
        assert_eq!(map.slots(), &expected[..]);
    }

    #[test]
    fn test_argument_order_irrelevant() {
        let a = fan(5);
        let b = fan(3);
        let ab = build_map(&a, &b, StrokeMetric::Initial);
        let ba = build_map(&b, &a, StrokeMetric::Initial);
        assert_eq!(ab, ba);
        assert_eq!(ab.slots().len(), 5);
    }

    #[test]
    fn test_greedy_leaves_extra_slots_free() {
        let a = fan(4);
        let b = fan(2);
        let map = build_map(&a, &b, StrokeMetric::Endpoint);
        let free = map.slots().iter().filter(|s| **s == Slot::Unassigned).count();
        assert_eq!(free, 2);
        assert!(!map.is_complete());
    }

    #[test]
    fn test_refine_swaps_crossed_targets() {
        let longer = pattern("[[[0,0],[10,0]],[[100,0],[110,0]],[[50,90],[60,90]]]");
        let shorter = pattern("[[[100,0],[110,0]],[[0,0],[10,0]]]");
        // Start from the crossed assignment and let one pass untangle it
        let mut slots = vec![Slot::Assigned(0), Slot::Assigned(1), Slot::Unassigned];
        refine_slots(&longer, &shorter, StrokeMetric::Endpoint, &mut slots);
        assert_eq!(slots[0], Slot::Assigned(1));
        assert_eq!(slots[1], Slot::Assigned(0));
    }

    #[test]
    fn test_refine_moves_to_closer_free_slot() {
        let longer = pattern("[[[0,0],[10,0]],[[100,0],[110,0]]]");
        let shorter = pattern("[[[100,0],[110,0]]]");
        let mut slots = vec![Slot::Assigned(0), Slot::Unassigned];
        refine_slots(&longer, &shorter, StrokeMetric::Endpoint, &mut slots);
        assert_eq!(slots, vec![Slot::Unassigned, Slot::Assigned(0)]);
    }

    #[test]
    fn test_complete_ends() {
        let longer = fan(4);
        let shorter = fan(1);
        let map = CorrespondenceMap::from_slots(vec![Slot::Unassigned, Slot::Assigned(0), Slot::Unassigned, Slot::Unassigned]);
        let complete = complete_map(&longer, &shorter, StrokeMetric::Endpoint, map).unwrap();
        assert_eq!(complete.targets(), &[0, 0, 0, 0]);
        assert_eq!(complete.groups(), vec![MergeGroup { strokes: 0..4, target: 0 }]);
    }

    #[test]
    fn test_complete_interior_split() {
        let longer = pattern("[[[0,0],[10,0]],[[50,0],[60,0]],[[70,0],[100,0]]]");
        let shorter = pattern("[[[0,0],[10,0]],[[50,0],[100,0]]]");
        let map = CorrespondenceMap::from_slots(vec![Slot::Assigned(0), Slot::Unassigned, Slot::Assigned(1)]);
        let complete = complete_map(&longer, &shorter, StrokeMetric::Endpoint, map).unwrap();
        assert_eq!(complete.targets(), &[0, 1, 1]);
    }

    #[test]
    fn test_complete_interior_split_left() {
        let longer = pattern("[[[0,0],[10,0]],[[20,0],[40,0]],[[90,0],[100,0]]]");
        let shorter = pattern("[[[0,0],[40,0]],[[90,0],[100,0]]]");
        let map = CorrespondenceMap::from_slots(vec![Slot::Assigned(0), Slot::Unassigned, Slot::Assigned(1)]);
        let complete = complete_map(&longer, &shorter, StrokeMetric::Endpoint, map).unwrap();
        assert_eq!(complete.targets(), &[0, 0, 1]);
    }

    #[test]
    fn test_complete_nothing_assigned() {
        let longer = fan(2);
        let shorter = Pattern::default();
        let map = build_map(&longer, &shorter, StrokeMetric::Endpoint);
        assert_eq!(map.slots(), &[Slot::Unassigned, Slot::Unassigned]);
        assert!(complete_map(&longer, &shorter, StrokeMetric::Endpoint, map).is_none());
    }

    #[test]
    fn test_completeness() {
        for metric in [StrokeMetric::Endpoint, StrokeMetric::Initial, StrokeMetric::WholeWhole] {
            for n in 1..8 {
                for m in 1..=n {
                    let longer = fan(n);
                    // Reverse the shorter one so the greedy pass has something to untangle
                    let mut shorter = fan(m);
                    shorter.strokes.reverse();
                    let map = build_map(&longer, &shorter, metric);
                    let complete = complete_map(&longer, &shorter, metric, map).unwrap();
                    let targets = complete.targets();
                    assert_eq!(targets.len(), n);
                    assert!(targets.iter().all(|&t| t < m));
                    // Each target forms exactly one contiguous run
                    let groups = complete.groups();
                    assert_eq!(groups.len(), m);
                    let mut seen: Vec<usize> = groups.iter().map(|g| g.target).collect();
                    seen.sort_unstable();
                    assert_eq!(seen, (0..m).collect::<Vec<_>>());
                }
            }
        }
    }

    #[test]
    fn test_compute_distance_merges_groups() {
        let longer = pattern("[[[0,0],[10,0]],[[20,0],[40,0]]]");
        let shorter = pattern("[[[0,0],[40,0]]]");
        let map = complete_map(&longer, &shorter, StrokeMetric::Endpoint, CorrespondenceMap::from_slots(vec![Slot::Assigned(0), Slot::Unassigned])).unwrap();
        // Concatenation starts at (0,0) and ends at (40,0)
        assert_eq!(compute_distance(&longer, &shorter, StrokeMetric::Endpoint, &map), 0.0);
    }

    #[test]
    fn test_weighted_penalizes_merges() {
        let longer = pattern("[[[0,0],[100,0]],[[0,50],[100,50]]]");
        let shorter = pattern("[[[64,128],[192,128]]]");
        let map = complete_map(&longer, &shorter, StrokeMetric::WholeWhole, CorrespondenceMap::from_slots(vec![Slot::Unassigned, Slot::Assigned(0)])).unwrap();
        // Stride 2 over the 4 merged points: (192 + 270) / 2 = 231, times 4 / 2
        assert_eq!(compute_whole_distance_weighted(&longer, &shorter, &map), 462.0);
        assert_eq!(compute_distance(&longer, &shorter, StrokeMetric::WholeWhole, &map), 231.0);
    }
}
