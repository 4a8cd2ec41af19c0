//! Combined artifacts on disk.
//!
//! Naming: `<version>_basins.geojson`, or `<version>_basins.geojson.gz` when
//! GZIP-framed. The serving layer picks the decoding from the suffix alone, so
//! nothing about simplification settings leaks into the file name.
//!
//! Writes are atomic: the document is encoded in memory, written to a hidden
//! temporary sibling, synced and renamed over the final path.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::geometry::{parse_features, FeatureCollection};

pub const ARTIFACT_SUFFIX: &str = "_basins.geojson";
pub const GZIP_SUFFIX: &str = ".gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub compress: bool,
    /// Indented JSON; mainly useful for uncompressed artifacts read by people.
    pub pretty: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: true,
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub bytes: usize,
    /// Artifact of the other encoding that could not be removed.
    pub stale: Option<PathBuf>,
}

/// An artifact found in an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub version: String,
    pub path: PathBuf,
    pub compressed: bool,
}

pub fn artifact_file_name(version: &str, compressed: bool) -> String {
    if compressed {
        format!("{version}{ARTIFACT_SUFFIX}{GZIP_SUFFIX}")
    } else {
        format!("{version}{ARTIFACT_SUFFIX}")
    }
}

pub fn artifact_path(dir: &Path, version: &str, compressed: bool) -> PathBuf {
    dir.join(artifact_file_name(version, compressed))
}

/// Serialize (and optionally compress) a collection. `path` is for errors only.
pub fn encode_artifact(
    collection: &FeatureCollection,
    options: &WriteOptions,
    path: &Path,
) -> Result<Vec<u8>> {
    let json = if options.pretty {
        serde_json::to_vec_pretty(collection)
    } else {
        serde_json::to_vec(collection)
    }
    .map_err(|source| Error::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    if !options.compress {
        return Ok(json);
    }

    let compress_err = |source| Error::Compress {
        path: path.to_path_buf(),
        source,
    };
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json).map_err(compress_err)?;
    let compressed = encoder.finish().map_err(compress_err)?;

    debug!(
        "GZIP {}: {} -> {} bytes ({:.1}%)",
        path.display(),
        json.len(),
        compressed.len(),
        (compressed.len() as f64 / json.len().max(1) as f64) * 100.0
    );

    Ok(compressed)
}

/// Write the artifact for `version` into `dir`.
///
/// An artifact of the same version in the other encoding is removed, so the
/// directory never offers two different documents for one version. Failing to
/// remove it is logged and reported in [`WrittenArtifact::stale`]; the new
/// artifact is already in place at that point.
pub fn write_artifact(
    collection: &FeatureCollection,
    dir: &Path,
    version: &str,
    options: &WriteOptions,
) -> Result<WrittenArtifact> {
    let path = artifact_path(dir, version, options.compress);
    let bytes = encode_artifact(collection, options, &path)?;
    write_atomic(&path, &bytes)?;

    let other = artifact_path(dir, version, !options.compress);
    let mut stale = None;
    if fs::symlink_metadata(&other).is_ok() {
        match fs::remove_file(&other) {
            Ok(()) => debug!("Removed stale {}", other.display()),
            Err(err) => {
                warn!("Could not remove stale {}: {err}", other.display());
                stale = Some(other);
            }
        }
    }

    Ok(WrittenArtifact {
        path,
        bytes: bytes.len(),
        stale,
    })
}

/// Temp-then-rename write of `bytes` to `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_owned());
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();

    result.map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        Error::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Read an artifact, decompressing when the name ends in `.gz`.
pub fn read_artifact(path: &Path) -> Result<FeatureCollection> {
    let read_err = |source| Error::Read {
        path: path.to_path_buf(),
        source,
    };

    let bytes = fs::read(path).map_err(read_err)?;
    let text = if is_compressed(path) {
        let mut text = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut text)
            .map_err(read_err)?;
        text
    } else {
        String::from_utf8(bytes).map_err(|err| {
            read_err(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })?
    };

    Ok(FeatureCollection::new(parse_features(&text, path)?))
}

/// The artifact for `version` in `dir`, preferring the compressed encoding.
pub fn locate_artifact(dir: &Path, version: &str) -> Option<PathBuf> {
    [true, false]
        .into_iter()
        .map(|compressed| artifact_path(dir, version, compressed))
        .find(|path| path.is_file())
}

/// Every artifact in `dir`, newest version name first.
pub fn list_artifacts(dir: &Path) -> Result<Vec<ArtifactEntry>> {
    let list_err = |source| Error::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        let compressed = name.ends_with(GZIP_SUFFIX);
        let Some(version) = name
            .strip_suffix(GZIP_SUFFIX)
            .unwrap_or(name)
            .strip_suffix(ARTIFACT_SUFFIX)
        else {
            continue;
        };

        if version.is_empty() || version.starts_with('.') || !path.is_file() {
            continue;
        }

        entries.push(ArtifactEntry {
            version: version.to_owned(),
            path: path.clone(),
            compressed,
        });
    }

    entries.sort_by(|a, b| {
        b.version
            .cmp(&a.version)
            .then_with(|| b.compressed.cmp(&a.compressed))
    });
    Ok(entries)
}

fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
