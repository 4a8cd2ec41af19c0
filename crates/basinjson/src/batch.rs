//! Batch driver: every manifest of a run, one after the other.

use log::{error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::artifact::{write_artifact, WriteOptions, WrittenArtifact};
use crate::basin::BasinResolver;
use crate::combine::{combine, CombineOptions, CombineStats, CombineWarning};
use crate::error::{Error, Result};
use crate::manifest::{version_stem, ModelVersionManifest};
use crate::style::Styler;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchOptions {
    pub combine: CombineOptions,
    pub write: WriteOptions,
}

/// What one successfully processed manifest produced.
#[derive(Debug, Clone)]
pub struct ManifestSuccess {
    pub artifact: WrittenArtifact,
    pub warnings: Vec<CombineWarning>,
    pub stats: CombineStats,
}

#[derive(Debug)]
pub struct ManifestOutcome {
    pub version: String,
    pub manifest: PathBuf,
    pub result: Result<ManifestSuccess>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ManifestOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ManifestOutcome, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (outcome, err)))
    }

    /// True when every manifest produced an artifact.
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.total()
    }

    /// Combine warnings plus stale artifacts that could not be removed.
    pub fn warning_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|success| success.warnings.len() + usize::from(success.artifact.stale.is_some()))
            .sum()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processing complete: {}/{}", self.succeeded(), self.total())?;
        for (outcome, err) in self.failures() {
            write!(
                f,
                "\n  {} ({}) failed: {err}",
                outcome.version,
                outcome.manifest.display()
            )?;
        }
        Ok(())
    }
}

/// Load, combine and write the artifact of a single manifest.
pub fn process_manifest(
    manifest_path: &Path,
    resolver: &dyn BasinResolver,
    styler: &dyn Styler,
    options: &BatchOptions,
    out_dir: &Path,
) -> Result<ManifestSuccess> {
    info!("Processing {}", manifest_path.display());

    let manifest = ModelVersionManifest::load(manifest_path)?;
    let combined = combine(&manifest, resolver, styler, &options.combine)?;
    let artifact = write_artifact(&combined.collection, out_dir, &manifest.version, &options.write)?;

    info!(
        "Wrote {} ({} bytes)",
        artifact.path.display(),
        artifact.bytes
    );

    Ok(ManifestSuccess {
        artifact,
        warnings: combined.warnings,
        stats: combined.stats,
    })
}

/// Process `manifests` in order. A failing manifest is logged and recorded;
/// the remaining manifests still run.
pub fn run_batch(
    manifests: &[PathBuf],
    resolver: &dyn BasinResolver,
    styler: &dyn Styler,
    options: &BatchOptions,
    out_dir: &Path,
) -> BatchReport {
    let mut report = BatchReport::default();

    for manifest in manifests {
        let result = process_manifest(manifest, resolver, styler, options, out_dir);
        let version = version_stem(manifest);

        match &result {
            Ok(success) if success.warnings.is_empty() => {}
            Ok(success) => warn!(
                "{version}: completed with {} warning(s)",
                success.warnings.len()
            ),
            Err(err) => error!("{version}: {err}"),
        }

        report.outcomes.push(ManifestOutcome {
            version,
            manifest: manifest.clone(),
            result,
        });
    }

    info!("{}", report);
    report
}
