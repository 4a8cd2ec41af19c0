//! Basin names and their resolution to outline files.
//!
//! The regional tree is laid out by convention, not schema:
//!
//! ```text
//! <root>/<clean name>/<clean name>_outline_WGS84[_<n>].{geojson,txt}
//! <root>/<clean name>/<clean name>[_<n>].{geojson,txt}
//! ```
//!
//! where `<clean name>` is the manifest's basin name with its `_v<major>p<minor>`
//! version suffix removed. Everything that knows about this convention lives
//! behind [`BasinResolver`].

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::source::SourceFormat;

/// Start of the version suffix in a basin name (`cant_v19p1`).
pub const VERSION_MARKER: &str = "_v";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasinName(String);

impl BasinName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name used for file lookup.
    pub fn clean_name(&self) -> &str {
        clean_basin_name(&self.0)
    }
}

impl fmt::Display for BasinName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BasinName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Cut `name` at the first `_v`. Idempotent, since the result holds no `_v`.
pub fn clean_basin_name(name: &str) -> &str {
    name.split_once(VERSION_MARKER)
        .map_or(name, |(head, _)| head)
}

/// Maps a basin to its outline files, in combination order.
///
/// An empty result means the basin has no outline; it is not an error.
pub trait BasinResolver {
    fn resolve(&self, basin: &BasinName) -> Vec<PathBuf>;
}

/// Resolver for the regional directory naming convention.
#[derive(Debug, Clone)]
pub struct ConventionResolver {
    root: PathBuf,
}

impl ConventionResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BasinResolver for ConventionResolver {
    fn resolve(&self, basin: &BasinName) -> Vec<PathBuf> {
        let clean = basin.clean_name();
        let patterns = base_patterns(clean);
        let basin_dir = self.root.join(clean);
        let mut found = Vec::new();

        if basin_dir.is_dir() {
            collect_parts(&basin_dir, &patterns, &mut found);
            if !found.is_empty() {
                debug!("{basin}: {} file(s) in {}", found.len(), basin_dir.display());
                return found;
            }
        }

        // Fallback: same patterns in every directory of the tree, in a stable order.
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_dir() || entry.path() == basin_dir {
                continue;
            }

            collect_parts(entry.path(), &patterns, &mut found);
        }

        debug!(
            "{basin}: {} file(s) found by searching {}",
            found.len(),
            self.root.display()
        );
        found
    }
}

/// Fixed clean-name → files table; bypasses the directory convention.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    files: HashMap<String, Vec<PathBuf>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clean_name: impl Into<String>, files: Vec<PathBuf>) -> &mut Self {
        self.files.insert(clean_name.into(), files);
        self
    }
}

impl BasinResolver for StaticResolver {
    fn resolve(&self, basin: &BasinName) -> Vec<PathBuf> {
        self.files
            .get(basin.clean_name())
            .cloned()
            .unwrap_or_default()
    }
}

fn base_patterns(clean: &str) -> [String; 2] {
    [format!("{clean}_outline_WGS84"), clean.to_owned()]
}

/// For each pattern: the main file, then parts `_1`, `_2`, ... up to the first gap.
fn collect_parts(dir: &Path, patterns: &[String], found: &mut Vec<PathBuf>) {
    for pattern in patterns {
        if let Some(path) = pick_slot(dir, pattern) {
            push_unique(found, path);
        }

        for part in 1usize.. {
            match pick_slot(dir, &format!("{pattern}_{part}")) {
                Some(path) => push_unique(found, path),
                None => break,
            }
        }
    }
}

/// The preferred existing encoding of `<dir>/<stem>.*`.
fn pick_slot(dir: &Path, stem: &str) -> Option<PathBuf> {
    SourceFormat::PREFERENCE
        .into_iter()
        .map(|format| dir.join(format!("{stem}.{}", format.extension())))
        .find(|path| path.is_file())
}

fn push_unique(found: &mut Vec<PathBuf>, path: PathBuf) {
    if !found.contains(&path) {
        found.push(path);
    }
}
