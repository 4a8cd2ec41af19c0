mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use basinjson::{
    compare_artifacts, convert_legacy_file, find_manifests, list_artifacts, run_batch,
    styler_for_colors, ConventionResolver,
};

use crate::config::{Command, Config, Dirs, GenerateArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    match config.command().unwrap_or_else(|err| err.exit()) {
        Command::Generate(args) => generate(&config.dirs, &args),
        Command::Compare { a, b } => compare(&a, &b),
        Command::Convert { files } => convert(&files),
        Command::List => list(&config.dirs.output()),
    }
}

fn generate(dirs: &Dirs, args: &GenerateArgs) -> Result<()> {
    if !(args.tolerance.is_finite() && args.tolerance >= 0.0) {
        bail!("--tolerance must be a non-negative number, got {}", args.tolerance);
    }

    let model_versions_dir = dirs.model_versions();
    let regional_dir = dirs.regional();
    let output_dir = dirs.output();

    if !model_versions_dir.is_dir() {
        bail!(
            "Model versions directory not found: {}",
            model_versions_dir.display()
        );
    }
    if !regional_dir.is_dir() {
        bail!("Regional data directory not found: {}", regional_dir.display());
    }

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let resolver = ConventionResolver::new(regional_dir);
    info!("Output directory: {}", output_dir.display());
    info!("Looking for basin data files in: {}", resolver.root().display());

    let manifests = find_manifests(&model_versions_dir)?;
    if manifests.is_empty() {
        bail!(
            "No model version YAML files found in {}",
            model_versions_dir.display()
        );
    }

    info!("Found {} model version files to process:", manifests.len());
    for manifest in &manifests {
        info!(
            "  - {}",
            manifest.file_name().unwrap_or_default().to_string_lossy()
        );
    }

    let styler = styler_for_colors(&args.colors, args.stroke_width, args.fill_opacity);
    let report = run_batch(
        &manifests,
        &resolver,
        styler.as_ref(),
        &args.batch_options(),
        &output_dir,
    );

    println!("{report}");

    let warnings = report.warning_count();
    if warnings > 0 {
        warn!("{warnings} warning(s) across all model versions; see the log above");
    }

    if !report.is_success() {
        bail!(
            "{} of {} model version(s) failed to process",
            report.total() - report.succeeded(),
            report.total()
        );
    }

    info!("Generated files are in: {}", output_dir.display());
    Ok(())
}

fn compare(a: &Path, b: &Path) -> Result<()> {
    let report = compare_artifacts(a, b)
        .with_context(|| format!("comparing {} with {}", a.display(), b.display()))?;

    println!("A: {}\nB: {}\n{report}", a.display(), b.display());
    Ok(())
}

fn convert(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let out = convert_legacy_file(file)
            .with_context(|| format!("converting {}", file.display()))?;
        info!("Converted {} -> {}", file.display(), out.display());
    }

    Ok(())
}

fn list(output_dir: &Path) -> Result<()> {
    for entry in list_artifacts(output_dir)? {
        println!("{}\t{}", entry.version, entry.path.display());
    }

    Ok(())
}
