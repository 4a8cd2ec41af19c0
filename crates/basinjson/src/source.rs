//! Loading features from one geometry file on disk.

use log::debug;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::{parse_features, Feature};
use crate::legacy::read_legacy_file;

/// On-disk encodings of a basin outline, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    GeoJson,
    Legacy,
}

impl SourceFormat {
    pub const PREFERENCE: [SourceFormat; 2] = [SourceFormat::GeoJson, SourceFormat::Legacy];

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::GeoJson => "geojson",
            SourceFormat::Legacy => "txt",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::PREFERENCE
            .into_iter()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }
}

/// Every feature of `path`, in file order.
pub fn load_features(path: &Path) -> Result<Vec<Feature>> {
    let features = match SourceFormat::from_path(path) {
        Some(SourceFormat::GeoJson) => {
            let text = fs::read_to_string(path).map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse_features(&text, path)?
        }
        Some(SourceFormat::Legacy) => read_legacy_file(path)?,
        None => {
            return Err(Error::UnsupportedDocument {
                path: path.to_path_buf(),
                kind: path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
        }
    };

    debug!("Loaded {} feature(s) from {}", features.len(), path.display());
    Ok(features)
}
