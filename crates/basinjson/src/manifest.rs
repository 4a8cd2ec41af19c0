//! Model version manifests.
//!
//! A manifest is a YAML file whose `basins` key lists the basins of one model
//! version, in order. Other keys belong to the velocity model generator and are
//! ignored here. The version is identified by the file stem (`2p07.yaml` is
//! version `2p07`).

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::basin::BasinName;
use crate::error::{Error, Result};

pub const MANIFEST_EXTENSION: &str = "yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVersionManifest {
    pub version: String,
    pub path: PathBuf,
    pub basins: Vec<BasinName>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    basins: Option<Vec<BasinName>>,
}

impl ModelVersionManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&text, path)
    }

    /// Parse manifest text; `path` supplies the version stem and error context.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        // Empty and null documents mean "no basins".
        let file: Option<ManifestFile> = if text.trim().is_empty() {
            None
        } else {
            serde_yaml::from_str(text).map_err(|source| Error::Manifest {
                path: path.to_path_buf(),
                source,
            })?
        };

        Ok(Self {
            version: version_stem(path),
            path: path.to_path_buf(),
            basins: file.and_then(|f| f.basins).unwrap_or_default(),
        })
    }
}

pub fn version_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// All manifests of `dir`, sorted by path.
pub fn find_manifests(dir: &Path) -> Result<Vec<PathBuf>> {
    let list_err = |source| Error::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        let is_manifest = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == MANIFEST_EXTENSION);

        if is_manifest && path.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}
