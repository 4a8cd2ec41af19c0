//! Douglas-Peucker line simplification and decimal quantization.
//!
//! Both operate on one coordinate sequence (a ring or a line). Distances are
//! planar, measured in the units of the input (degrees for WGS84 outlines).

use crate::error::GeometryError;
use crate::geometry::Position;

/// Rounding beyond this many decimal digits cannot change an f64 lon/lat.
pub const MAX_PRECISION: u32 = 15;

/// Simplify one coordinate sequence.
///
/// Consecutive duplicates are collapsed first. Sequences of two points or
/// fewer are returned as they are after that; longer ones are reduced with
/// Douglas-Peucker. The first and last point always survive.
pub fn simplify(coords: &[Position], tolerance: f64) -> Result<Vec<Position>, GeometryError> {
    validate(coords)?;

    let cleaned = dedup_consecutive(coords);
    if cleaned.len() <= 2 {
        return Ok(cleaned);
    }

    let keep = retained_mask(&cleaned, tolerance);
    Ok(cleaned
        .into_iter()
        .zip(keep)
        .filter_map(|(position, kept)| kept.then_some(position))
        .collect())
}

/// Collapse runs of identical consecutive lon/lat pairs to a single point.
pub fn dedup_consecutive(coords: &[Position]) -> Vec<Position> {
    let mut cleaned = coords.to_vec();
    cleaned.dedup_by(|current, previous| same_lon_lat(current, previous));
    cleaned
}

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// When `a == b` the line is undefined and the Euclidean distance to `a` is
/// returned instead.
#[inline]
pub fn perpendicular_distance(p: &[f64], a: &[f64], b: &[f64]) -> f64 {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let denom = dx * dx + dy * dy;

    if denom == 0.0 {
        return (p[0] - a[0]).hypot(p[1] - a[1]);
    }

    (dy * (p[0] - a[0]) - dx * (p[1] - a[1])).abs() / denom.sqrt()
}

/// Round every component of every position to `precision` decimal digits.
pub fn quantize(coords: &[Position], precision: u32) -> Vec<Position> {
    let mut out = coords.to_vec();
    quantize_in_place(&mut out, precision);
    out
}

pub fn quantize_in_place(coords: &mut [Position], precision: u32) {
    for position in coords {
        quantize_position(position, precision);
    }
}

pub fn quantize_position(position: &mut Position, precision: u32) {
    for value in position.iter_mut() {
        *value = round_to(*value, precision);
    }
}

#[inline]
pub fn round_to(value: f64, precision: u32) -> f64 {
    if precision > MAX_PRECISION || !value.is_finite() {
        return value;
    }

    let scale = 10f64.powi(precision as i32);
    let scaled = value * scale;
    // Past this magnitude the scaled value has no fractional part left to round.
    if scaled.abs() >= SCALED_LIMIT {
        return value;
    }

    scaled.round() / scale
}

const SCALED_LIMIT: f64 = 1e15;

#[inline]
fn same_lon_lat(a: &[f64], b: &[f64]) -> bool {
    a[0] == b[0] && a[1] == b[1]
}

fn validate(coords: &[Position]) -> Result<(), GeometryError> {
    for (index, position) in coords.iter().enumerate() {
        if position.len() < 2 {
            return Err(GeometryError::ShortPosition {
                index,
                len: position.len(),
            });
        }

        if !position[0].is_finite() || !position[1].is_finite() {
            return Err(GeometryError::NonFinite { index });
        }
    }

    Ok(())
}

/// Douglas-Peucker over an explicit stack of `(first, last)` segments.
///
/// Long rings would otherwise recurse once per retained point. The split point
/// is the first interior point of maximum distance, which keeps the result
/// identical to the recursive formulation.
fn retained_mask(points: &[Position], tolerance: f64) -> Vec<bool> {
    let end = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[end] = true;

    let mut segments = vec![(0usize, end)];
    while let Some((first, last)) = segments.pop() {
        if last <= first + 1 {
            continue;
        }

        let (mut max_dist, mut max_index) = (f64::NEG_INFINITY, first + 1);
        for (index, point) in points.iter().enumerate().take(last).skip(first + 1) {
            let dist = perpendicular_distance(point, &points[first], &points[last]);
            if dist > max_dist {
                max_dist = dist;
                max_index = index;
            }
        }

        if max_dist > tolerance {
            keep[max_index] = true;
            segments.push((max_index, last));
            segments.push((first, max_index));
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[[f64; 2]]) -> Vec<Position> {
        points.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn short_sequences_only_lose_duplicates() {
        let input = line(&[[1.0, 1.0], [1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(simplify(&input, 10.0).unwrap(), line(&[[1.0, 1.0], [2.0, 2.0]]));

        assert!(simplify(&[], 1.0).unwrap().is_empty());
    }

    #[test]
    fn collinear_points_collapse_at_zero_tolerance() {
        let input = line(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
        assert_eq!(simplify(&input, 0.0).unwrap(), line(&[[0.0, 0.0], [3.0, 0.0]]));
    }

    #[test]
    fn zero_tolerance_keeps_every_bend() {
        let input = line(&[[0.0, 0.0], [1.0, 0.1], [2.0, -0.1], [3.0, 5.0], [4.0, 6.0]]);
        assert_eq!(simplify(&input, 0.0).unwrap(), input);
    }

    #[test]
    fn small_wiggles_are_removed() {
        let input = line(&[
            [0.0, 0.0],
            [1.0, 0.01],
            [2.0, -0.01],
            [3.0, 5.0],
            [4.0, 6.0],
            [5.0, 7.0],
        ]);

        assert_eq!(
            simplify(&input, 0.5).unwrap(),
            line(&[[0.0, 0.0], [2.0, -0.01], [3.0, 5.0], [5.0, 7.0]])
        );
    }

    #[test]
    fn closed_ring_uses_euclidean_distance() {
        let ring = line(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]);

        // Farthest point from the coincident endpoints is the opposite corner.
        assert_eq!(
            simplify(&ring, 1.2).unwrap(),
            line(&[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]])
        );
        assert_eq!(simplify(&ring, 2.0).unwrap(), line(&[[0.0, 0.0], [0.0, 0.0]]));
    }

    #[test]
    fn extra_components_are_carried() {
        let input = vec![vec![0.0, 0.0, 10.0], vec![1.0, 0.0, 11.0], vec![2.0, 0.0, 12.0]];
        assert_eq!(
            simplify(&input, 0.1).unwrap(),
            vec![vec![0.0, 0.0, 10.0], vec![2.0, 0.0, 12.0]]
        );
    }

    #[test]
    fn malformed_positions_are_errors() {
        let short = vec![vec![0.0, 0.0], vec![1.0]];
        assert_eq!(
            simplify(&short, 0.1),
            Err(GeometryError::ShortPosition { index: 1, len: 1 })
        );

        let nan = vec![vec![0.0, 0.0], vec![f64::NAN, 1.0], vec![2.0, 2.0]];
        assert_eq!(simplify(&nan, 0.1), Err(GeometryError::NonFinite { index: 1 }));
    }

    #[test]
    fn zigzag_keeps_every_point() {
        // Every point is a split point; peels one point per segment.
        let input: Vec<Position> = (0..10_000)
            .map(|i| vec![i as f64, if i % 2 == 0 { 0.0 } else { 1.0 }])
            .collect();

        assert_eq!(simplify(&input, 0.5).unwrap().len(), input.len());
    }

    #[test]
    fn perpendicular_distance_to_horizontal_line() {
        assert_eq!(perpendicular_distance(&[5.0, 3.0], &[0.0, 0.0], &[10.0, 0.0]), 3.0);
        assert_eq!(perpendicular_distance(&[3.0, 4.0], &[0.0, 0.0], &[0.0, 0.0]), 5.0);
    }

    #[test]
    fn quantize_rounds_each_component() {
        let input = vec![vec![172.123456789, -43.987654321, 1.23456]];
        assert_eq!(quantize(&input, 3), vec![vec![172.123, -43.988, 1.235]]);
        assert_eq!(quantize(&input, 0), vec![vec![172.0, -44.0, 1.0]]);
    }

    #[test]
    fn quantize_beyond_f64_precision_is_identity() {
        let input = vec![vec![0.1 + 0.2, 1.0 / 3.0]];
        assert_eq!(quantize(&input, MAX_PRECISION + 1), input);
    }
}
