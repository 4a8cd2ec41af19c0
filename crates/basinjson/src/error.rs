//! Error types.
//!
//! [`Error`] is fatal for the manifest being processed; every variant names the
//! file and the stage that failed. [`GeometryError`] is recoverable: the geometry
//! adapter catches it and degrades to quantization only, or to the geometry as
//! read when it cannot be parsed at all.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid GeoJSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported GeoJSON document type {kind:?} in {}", path.display())]
    UnsupportedDocument { path: PathBuf, kind: String },

    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}:{line}: {detail}", path.display())]
    LegacyCoordinates {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    #[error("failed to list {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No basin of the manifest produced a single feature.
    #[error("no features found for model version {version}")]
    EmptyResult { version: String },

    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to compress {}: {source}", path.display())]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A coordinate sequence the simplifier refuses to process.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("position {index} has {len} component(s), expected at least 2")]
    ShortPosition { index: usize, len: usize },

    #[error("position {index} has a non-finite longitude/latitude")]
    NonFinite { index: usize },

    /// The geometry object does not have the shape its `type` requires.
    #[error("malformed geometry: {detail}")]
    Malformed { detail: String },
}
