//! basinjson: combined basin outline artifacts for velocity model versions.
//!
//! One artifact per model version manifest, holding the outline of every basin
//! the manifest lists:
//!
//! - Manifests: `<manifests>/<version>.yaml`, ordered basin names under `basins`.
//! - Outlines: `<regional>/<clean name>/<clean name>[_outline_WGS84][_<n>].{geojson,txt}`,
//!   where the clean name drops the `_v<major>p<minor>` suffix.
//! - Artifacts: `<out>/<version>_basins.geojson[.gz]`.
//!
//! Pipeline per manifest:
//!   manifest -> resolve basins -> load features -> style + `source_file`
//!            -> Douglas-Peucker + quantize (optional) -> atomic write
//!
//! Feature order is basin order, then file-part order, then file order, and is
//! identical across runs for identical inputs.
//!
//! Legacy `.txt` outlines: one `<lon> <lat>` pair per line, whitespace
//! separated, extra columns ignored. They load as a single-ring Polygon.

pub mod adapter;
pub mod artifact;
pub mod basin;
pub mod batch;
pub mod combine;
pub mod compare;
pub mod error;
pub mod geometry;
pub mod legacy;
pub mod manifest;
pub mod simplify;
pub mod source;
pub mod style;

pub use adapter::{quantize_geometry, simplify_geometry, Simplified, SimplifyOptions};
pub use artifact::{
    artifact_path, list_artifacts, locate_artifact, read_artifact, write_artifact, ArtifactEntry,
    WriteOptions, WrittenArtifact,
};
pub use basin::{clean_basin_name, BasinName, BasinResolver, ConventionResolver, StaticResolver};
pub use batch::{process_manifest, run_batch, BatchOptions, BatchReport, ManifestOutcome};
pub use combine::{combine, CombineOptions, CombineStats, CombineWarning, Combined};
pub use compare::{compare_artifacts, compare_collections, ComparisonReport};
pub use error::{Error, GeometryError, Result};
pub use geometry::{parse_features, Feature, FeatureCollection, Geometry, Position, Properties};
pub use legacy::convert_legacy_file;
pub use manifest::{find_manifests, ModelVersionManifest};
pub use simplify::{quantize, simplify};
pub use style::{styler_for_colors, CyclingStyler, Style, Styler, UniformStyler};
