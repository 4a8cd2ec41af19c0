//! Merging the outlines of one model version into a single collection.

use log::{debug, info, warn};
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::adapter::{simplify_geometry, SimplifyOptions};
use crate::basin::{BasinName, BasinResolver};
use crate::error::{Error, GeometryError, Result};
use crate::geometry::FeatureCollection;
use crate::manifest::ModelVersionManifest;
use crate::source::load_features;
use crate::style::Styler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombineOptions {
    /// Run the geometry adapter over every feature once all basins are merged.
    pub simplify: bool,
    pub geometry: SimplifyOptions,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            simplify: true,
            geometry: SimplifyOptions::default(),
        }
    }
}

/// A recoverable problem met while combining; the collection is still usable.
#[derive(Debug, Clone, PartialEq)]
pub enum CombineWarning {
    MissingBasin {
        basin: BasinName,
    },
    DegradedGeometry {
        source_file: String,
        feature_index: usize,
        error: GeometryError,
    },
}

impl fmt::Display for CombineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineWarning::MissingBasin { basin } => {
                write!(f, "no outline files found for basin {basin}")
            }
            CombineWarning::DegradedGeometry {
                source_file,
                feature_index,
                error,
            } => write!(
                f,
                "feature {feature_index} from {source_file} was not simplified: {error}"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineStats {
    pub basins_requested: usize,
    pub basins_resolved: usize,
    pub files_loaded: usize,
    pub features: usize,
    pub positions_before: usize,
    pub positions_after: usize,
}

#[derive(Debug, Clone)]
pub struct Combined {
    pub collection: FeatureCollection,
    pub warnings: Vec<CombineWarning>,
    pub stats: CombineStats,
}

/// Resolve, load, style and (optionally) simplify every basin of `manifest`.
///
/// Features appear in basin order, then file order, then file-internal order.
/// A basin without files is a warning; a manifest without any feature is
/// [`Error::EmptyResult`].
pub fn combine(
    manifest: &ModelVersionManifest,
    resolver: &dyn BasinResolver,
    styler: &dyn Styler,
    options: &CombineOptions,
) -> Result<Combined> {
    info!(
        "Found {} basins in {}: {}",
        manifest.basins.len(),
        manifest.version,
        manifest
            .basins
            .iter()
            .map(BasinName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut features = Vec::new();
    let mut warnings = Vec::new();
    let mut stats = CombineStats {
        basins_requested: manifest.basins.len(),
        ..CombineStats::default()
    };

    for basin in &manifest.basins {
        let files = resolver.resolve(basin);
        if files.is_empty() {
            warn!("Could not find outline files for basin {basin}");
            warnings.push(CombineWarning::MissingBasin {
                basin: basin.clone(),
            });
            continue;
        }

        let style = styler.style(basin, stats.basins_resolved);
        stats.basins_resolved += 1;

        for path in &files {
            let source_file = file_name(path);

            for mut feature in load_features(path)? {
                feature.properties.extend(style.clone());
                feature
                    .properties
                    .insert("source_file".into(), Value::String(source_file.clone()));
                features.push(feature);
            }

            stats.files_loaded += 1;
            debug!("  Added: {source_file}");
        }
    }

    if features.is_empty() {
        return Err(Error::EmptyResult {
            version: manifest.version.clone(),
        });
    }

    let mut collection = FeatureCollection::new(features);
    stats.features = collection.features.len();
    stats.positions_before = collection.position_count();

    if options.simplify {
        for (feature_index, feature) in collection.features.iter_mut().enumerate() {
            let Some(parsed) = feature.parsed_geometry() else {
                continue;
            };

            let degraded = match parsed {
                Ok(geometry) => {
                    let simplified = simplify_geometry(&geometry, &options.geometry);
                    feature.replace_geometry(simplified.geometry);
                    simplified.degraded
                }
                Err(error) => {
                    warn!(
                        "Feature {feature_index} from {} kept as read: {error}",
                        feature.source_file().unwrap_or_default()
                    );
                    Some(error)
                }
            };

            if let Some(error) = degraded {
                warnings.push(CombineWarning::DegradedGeometry {
                    source_file: feature.source_file().unwrap_or_default().to_owned(),
                    feature_index,
                    error,
                });
            }
        }
    }

    stats.positions_after = collection.position_count();
    info!(
        "{}: {} feature(s) from {} file(s), {} -> {} positions",
        manifest.version,
        stats.features,
        stats.files_loaded,
        stats.positions_before,
        stats.positions_after
    );

    Ok(Combined {
        collection,
        warnings,
        stats,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
