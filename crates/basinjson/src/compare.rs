//! Diagnostic comparison of two combined artifacts.
//!
//! Two artifacts built from the same inputs by different generators should hold
//! the same features per source file, in the same order. This module reports
//! where they do not.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use crate::artifact::read_artifact;
use crate::error::Result;
use crate::geometry::{Feature, FeatureCollection, Geometry, Position};

/// Key for features whose properties carry no `source_file`.
pub const UNKNOWN_SOURCE: &str = "<unknown>";

/// Positions sampled per feature when looking for duplicates.
const SIGNATURE_POSITIONS: usize = 3;

/// Identity of a feature for duplicate detection: its source file and the bit
/// patterns of its first few positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureSignature {
    pub source_file: String,
    positions: Vec<Vec<u64>>,
}

impl FeatureSignature {
    pub fn of(feature: &Feature) -> Self {
        let geometry = feature.parsed_geometry().and_then(|parsed| parsed.ok());
        let positions = geometry
            .as_ref()
            .map(leading_positions)
            .unwrap_or_default()
            .iter()
            .take(SIGNATURE_POSITIONS)
            .map(|position| position.iter().map(|v| v.to_bits()).collect())
            .collect();

        Self {
            source_file: source_key(feature).to_owned(),
            positions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountDifference {
    pub source_file: String,
    pub a: usize,
    pub b: usize,
}

/// A position in the feature sequence where the two artifacts name different
/// source files. `None` means that side has no feature at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDifference {
    pub index: usize,
    pub a: Option<String>,
    pub b: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonReport {
    pub features_a: usize,
    pub features_b: usize,
    pub counts_a: BTreeMap<String, usize>,
    pub counts_b: BTreeMap<String, usize>,
    /// Per source file, `(first, repeat)` feature indices of every feature
    /// whose signature was already seen.
    pub duplicates_a: BTreeMap<String, Vec<(usize, usize)>>,
    pub duplicates_b: BTreeMap<String, Vec<(usize, usize)>>,
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    pub count_differences: Vec<CountDifference>,
    pub order_differences: Vec<OrderDifference>,
}

impl ComparisonReport {
    pub fn order_identical(&self) -> bool {
        self.order_differences.is_empty()
    }

    /// Same source files, same counts, same order and no duplicates.
    pub fn is_equivalent(&self) -> bool {
        self.features_a == self.features_b
            && self.only_in_a.is_empty()
            && self.only_in_b.is_empty()
            && self.count_differences.is_empty()
            && self.duplicates_a.is_empty()
            && self.duplicates_b.is_empty()
            && self.order_identical()
    }
}

pub fn compare_collections(a: &FeatureCollection, b: &FeatureCollection) -> ComparisonReport {
    let counts_a = source_counts(&a.features);
    let counts_b = source_counts(&b.features);

    let keys_a: BTreeSet<_> = counts_a.keys().cloned().collect();
    let keys_b: BTreeSet<_> = counts_b.keys().cloned().collect();

    let count_differences = keys_a
        .intersection(&keys_b)
        .filter(|key| counts_a[*key] != counts_b[*key])
        .map(|key| CountDifference {
            source_file: key.clone(),
            a: counts_a[key],
            b: counts_b[key],
        })
        .collect();

    let order_a: Vec<_> = a.features.iter().map(source_key).collect();
    let order_b: Vec<_> = b.features.iter().map(source_key).collect();
    let order_differences = (0..order_a.len().max(order_b.len()))
        .filter_map(|index| {
            let left = order_a.get(index).copied();
            let right = order_b.get(index).copied();
            (left != right).then(|| OrderDifference {
                index,
                a: left.map(str::to_owned),
                b: right.map(str::to_owned),
            })
        })
        .collect();

    ComparisonReport {
        features_a: a.features.len(),
        features_b: b.features.len(),
        duplicates_a: duplicates(&a.features),
        duplicates_b: duplicates(&b.features),
        only_in_a: keys_a.difference(&keys_b).cloned().collect(),
        only_in_b: keys_b.difference(&keys_a).cloned().collect(),
        count_differences,
        order_differences,
        counts_a,
        counts_b,
    }
}

/// Read both artifacts (plain or GZIP) and compare them.
pub fn compare_artifacts(a: &Path, b: &Path) -> Result<ComparisonReport> {
    Ok(compare_collections(&read_artifact(a)?, &read_artifact(b)?))
}

fn source_key(feature: &Feature) -> &str {
    feature.source_file().unwrap_or(UNKNOWN_SOURCE)
}

fn source_counts(features: &[Feature]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for feature in features {
        *counts.entry(source_key(feature).to_owned()).or_insert(0) += 1;
    }
    counts
}

fn duplicates(features: &[Feature]) -> BTreeMap<String, Vec<(usize, usize)>> {
    let mut first_seen: HashMap<FeatureSignature, usize> = HashMap::new();
    let mut per_file: BTreeMap<String, Vec<(usize, usize)>> = BTreeMap::new();

    for (index, feature) in features.iter().enumerate() {
        let signature = FeatureSignature::of(feature);
        match first_seen.get(&signature) {
            Some(&first) => per_file
                .entry(signature.source_file)
                .or_default()
                .push((first, index)),
            None => {
                first_seen.insert(signature, index);
            }
        }
    }

    per_file
}

/// The first ring, line or point list of a geometry.
fn leading_positions(geometry: &Geometry) -> &[Position] {
    match geometry {
        Geometry::Point { coordinates } => std::slice::from_ref(coordinates),
        Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => coordinates,
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            coordinates.first().map(Vec::as_slice).unwrap_or_default()
        }
        Geometry::MultiPolygon { coordinates } => coordinates
            .first()
            .and_then(|polygon| polygon.first())
            .map(Vec::as_slice)
            .unwrap_or_default(),
        Geometry::GeometryCollection { geometries } => geometries
            .first()
            .map(leading_positions)
            .unwrap_or_default(),
    }
}

const MAX_LISTED_ORDER_DIFFERENCES: usize = 10;

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Features: {} vs {}", self.features_a, self.features_b)?;
        writeln!(
            f,
            "Source files: {} vs {}",
            self.counts_a.len(),
            self.counts_b.len()
        )?;

        for (label, repeated) in [("A", &self.duplicates_a), ("B", &self.duplicates_b)] {
            for (file, pairs) in repeated {
                let indices: Vec<_> = pairs
                    .iter()
                    .map(|(first, repeat)| format!("[{first}, {repeat}]"))
                    .collect();
                writeln!(
                    f,
                    "Duplicates in {label}: {file} at indices {}",
                    indices.join(" ")
                )?;
            }
        }
        for file in &self.only_in_a {
            writeln!(f, "Only in A: {file} ({})", self.counts_a[file])?;
        }
        for file in &self.only_in_b {
            writeln!(f, "Only in B: {file} ({})", self.counts_b[file])?;
        }
        for diff in &self.count_differences {
            writeln!(f, "Count differs: {} ({} vs {})", diff.source_file, diff.a, diff.b)?;
        }

        if self.order_identical() {
            write!(f, "Feature order: identical")?;
        } else {
            write!(
                f,
                "Feature order: {} position(s) differ",
                self.order_differences.len()
            )?;
            for diff in self.order_differences.iter().take(MAX_LISTED_ORDER_DIFFERENCES) {
                write!(
                    f,
                    "\n  [{}] {} vs {}",
                    diff.index,
                    diff.a.as_deref().unwrap_or("-"),
                    diff.b.as_deref().unwrap_or("-")
                )?;
            }
            if self.order_differences.len() > MAX_LISTED_ORDER_DIFFERENCES {
                write!(
                    f,
                    "\n  ... {} more",
                    self.order_differences.len() - MAX_LISTED_ORDER_DIFFERENCES
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Properties;
    use serde_json::json;

    fn feature(source: &str, x: f64) -> Feature {
        let mut properties = Properties::new();
        properties.insert("source_file".into(), json!(source));
        Feature::new(
            Geometry::Polygon {
                coordinates: vec![vec![
                    vec![x, 0.0],
                    vec![x + 1.0, 0.0],
                    vec![x + 1.0, 1.0],
                    vec![x, 0.0],
                ]],
            },
            properties,
        )
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection::new(features)
    }

    #[test]
    fn identical_collections_are_equivalent() {
        let a = collection(vec![feature("a.geojson", 0.0), feature("b.txt", 1.0)]);
        let report = compare_collections(&a, &a.clone());

        assert!(report.is_equivalent());
        assert!(report.to_string().ends_with("Feature order: identical"));
    }

    #[test]
    fn reports_membership_counts_and_duplicates() {
        let a = collection(vec![
            feature("a.geojson", 0.0),
            feature("a.geojson", 0.0),
            feature("b.txt", 1.0),
        ]);
        let b = collection(vec![feature("a.geojson", 0.0), feature("c.geojson", 2.0)]);

        let report = compare_collections(&a, &b);

        assert_eq!(report.features_a, 3);
        assert_eq!(report.features_b, 2);
        assert_eq!(report.only_in_a, ["b.txt"]);
        assert_eq!(report.only_in_b, ["c.geojson"]);
        assert_eq!(
            report.count_differences,
            [CountDifference {
                source_file: "a.geojson".into(),
                a: 2,
                b: 1
            }]
        );
        assert_eq!(report.duplicates_a.get("a.geojson"), Some(&vec![(0, 1)]));
        assert!(report
            .to_string()
            .contains("Duplicates in A: a.geojson at indices [0, 1]"));
        assert!(report.duplicates_b.is_empty());
        assert!(!report.is_equivalent());
    }

    #[test]
    fn order_differences_name_the_positions() {
        let a = collection(vec![feature("a", 0.0), feature("b", 1.0), feature("c", 2.0)]);
        let b = collection(vec![feature("a", 0.0), feature("c", 2.0), feature("b", 1.0)]);

        let report = compare_collections(&a, &b);

        assert!(report.count_differences.is_empty());
        assert_eq!(
            report.order_differences,
            [
                OrderDifference {
                    index: 1,
                    a: Some("b".into()),
                    b: Some("c".into())
                },
                OrderDifference {
                    index: 2,
                    a: Some("c".into()),
                    b: Some("b".into())
                },
            ]
        );
    }

    #[test]
    fn shorter_side_shows_as_missing() {
        let a = collection(vec![feature("a", 0.0)]);
        let b = collection(vec![feature("a", 0.0), feature("a", 5.0)]);

        let report = compare_collections(&a, &b);
        assert_eq!(
            report.order_differences,
            [OrderDifference {
                index: 1,
                a: None,
                b: Some("a".into())
            }]
        );
        assert!(report.to_string().contains("[1] - vs a"));
    }

    #[test]
    fn same_file_different_shapes_are_not_duplicates() {
        let a = collection(vec![feature("a", 0.0), feature("a", 3.0)]);
        assert!(compare_collections(&a, &a).duplicates_a.is_empty());
    }
}
