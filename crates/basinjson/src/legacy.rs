//! Legacy raw coordinate outlines.
//!
//! One point per line, `<longitude> <latitude>` separated by whitespace. Extra
//! columns are ignored and lines with fewer than two fields are skipped. A file
//! becomes a single Polygon feature whose only ring is the listed points.

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::write_atomic;
use crate::error::{Error, Result};
use crate::geometry::{Feature, FeatureCollection, Geometry, Position, Properties};

pub fn parse_coordinates(text: &str, path: &Path) -> Result<Vec<Position>> {
    let mut coordinates = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let (Some(lon), Some(lat)) = (fields.next(), fields.next()) else {
            continue;
        };

        let parse = |field: &str| {
            field.parse::<f64>().map_err(|err| Error::LegacyCoordinates {
                path: path.to_path_buf(),
                line: index + 1,
                detail: format!("{field:?}: {err}"),
            })
        };

        coordinates.push(vec![parse(lon)?, parse(lat)?]);
    }

    Ok(coordinates)
}

pub fn outline_feature(coordinates: Vec<Position>) -> Feature {
    Feature::new(
        Geometry::Polygon {
            coordinates: vec![coordinates],
        },
        Properties::new(),
    )
}

/// Read a legacy file as a one-feature list.
pub fn read_legacy_file(path: &Path) -> Result<Vec<Feature>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(vec![outline_feature(parse_coordinates(&text, path)?)])
}

/// Write the GeoJSON equivalent of a legacy file next to it and return its path.
pub fn convert_legacy_file(path: &Path) -> Result<PathBuf> {
    let features = read_legacy_file(path)?;
    let out_path = path.with_extension("geojson");

    let bytes = serde_json::to_vec_pretty(&FeatureCollection::new(features)).map_err(|source| {
        Error::Serialize {
            path: out_path.clone(),
            source,
        }
    })?;
    write_atomic(&out_path, &bytes)?;

    Ok(out_path)
}
