//! Per-geometry simplification.
//!
//! Rings and lines go through [`simplify`] then [`quantize`]; points are only
//! quantized. Polygon rings are re-closed after rounding, and a ring that
//! simplification would reduce below a triangle keeps its original shape.
//! If any part of a geometry cannot be simplified the whole geometry falls
//! back to quantization of its original coordinates.

use log::warn;

use crate::error::GeometryError;
use crate::geometry::{Geometry, Position};
use crate::simplify::{dedup_consecutive, quantize, quantize_in_place, quantize_position, simplify};

/// A closed ring needs three distinct corners plus the closing position.
const MIN_RING_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyOptions {
    /// Douglas-Peucker tolerance in coordinate units (degrees).
    pub tolerance: f64,
    /// Decimal digits kept after simplification.
    pub precision: u32,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        // ~11 m tolerance, ~1 m precision at NZ latitudes.
        Self {
            tolerance: 0.0001,
            precision: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simplified {
    pub geometry: Geometry,
    /// Set when simplification failed and only quantization was applied.
    pub degraded: Option<GeometryError>,
}

pub fn simplify_geometry(geometry: &Geometry, options: &SimplifyOptions) -> Simplified {
    match try_simplify(geometry, options) {
        Ok(geometry) => Simplified {
            geometry,
            degraded: None,
        },
        Err(err) => {
            warn!(
                "{} could not be simplified ({err}); keeping quantized original",
                geometry.kind()
            );
            Simplified {
                geometry: quantize_geometry(geometry, options.precision),
                degraded: Some(err),
            }
        }
    }
}

/// Quantize every position of `geometry`, leaving its shape untouched.
pub fn quantize_geometry(geometry: &Geometry, precision: u32) -> Geometry {
    match geometry {
        Geometry::Point { coordinates } => Geometry::Point {
            coordinates: quantize_point(coordinates, precision),
        },
        Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
            coordinates: quantize(coordinates, precision),
        },
        Geometry::LineString { coordinates } => Geometry::LineString {
            coordinates: quantize(coordinates, precision),
        },
        Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
            coordinates: quantize_nested(coordinates, precision),
        },
        Geometry::Polygon { coordinates } => Geometry::Polygon {
            coordinates: quantize_nested(coordinates, precision),
        },
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates
                .iter()
                .map(|polygon| quantize_nested(polygon, precision))
                .collect(),
        },
        Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
            geometries: geometries
                .iter()
                .map(|member| quantize_geometry(member, precision))
                .collect(),
        },
    }
}

fn try_simplify(
    geometry: &Geometry,
    options: &SimplifyOptions,
) -> Result<Geometry, GeometryError> {
    let precision = options.precision;

    Ok(match geometry {
        Geometry::Point { coordinates } => Geometry::Point {
            coordinates: quantize_point(coordinates, precision),
        },
        Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
            coordinates: quantize(coordinates, precision),
        },
        Geometry::LineString { coordinates } => Geometry::LineString {
            coordinates: simplify_line(coordinates, options)?,
        },
        Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
            coordinates: coordinates
                .iter()
                .map(|line| simplify_line(line, options))
                .collect::<Result<_, _>>()?,
        },
        Geometry::Polygon { coordinates } => Geometry::Polygon {
            coordinates: simplify_polygon(coordinates, options)?,
        },
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates
                .iter()
                .map(|polygon| simplify_polygon(polygon, options))
                .collect::<Result<_, _>>()?,
        },
        Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
            geometries: geometries
                .iter()
                .map(|member| try_simplify(member, options))
                .collect::<Result<_, _>>()?,
        },
    })
}

fn simplify_line(
    line: &[Position],
    options: &SimplifyOptions,
) -> Result<Vec<Position>, GeometryError> {
    let mut out = simplify(line, options.tolerance)?;
    quantize_in_place(&mut out, options.precision);
    Ok(out)
}

fn simplify_polygon(
    rings: &[Vec<Position>],
    options: &SimplifyOptions,
) -> Result<Vec<Vec<Position>>, GeometryError> {
    rings
        .iter()
        .map(|ring| simplify_ring(ring, options))
        .collect()
}

fn simplify_ring(
    ring: &[Position],
    options: &SimplifyOptions,
) -> Result<Vec<Position>, GeometryError> {
    let mut out = simplify_line(ring, options)?;
    close_ring(&mut out);

    if out.len() < MIN_RING_LEN && ring.len() >= MIN_RING_LEN {
        out = dedup_consecutive(ring);
        quantize_in_place(&mut out, options.precision);
        close_ring(&mut out);
    }

    Ok(out)
}

/// Re-append the first position if rounding or simplification opened the ring.
fn close_ring(ring: &mut Vec<Position>) {
    if ring.first() != ring.last() {
        if let Some(first) = ring.first().cloned() {
            ring.push(first);
        }
    }
}

fn quantize_point(point: &Position, precision: u32) -> Position {
    let mut out = point.clone();
    quantize_position(&mut out, precision);
    out
}

fn quantize_nested(lines: &[Vec<Position>], precision: u32) -> Vec<Vec<Position>> {
    lines.iter().map(|line| quantize(line, precision)).collect()
}
