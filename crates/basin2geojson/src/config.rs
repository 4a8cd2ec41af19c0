use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use basinjson::{BatchOptions, CombineOptions, SimplifyOptions, WriteOptions};

/// `basin2geojson` - combined basin outlines per velocity model version.
///
/// Reads every model version manifest, resolves the outline files of the
/// basins it lists and writes one (optionally simplified and compressed)
/// GeoJSON FeatureCollection per version for the web map front end.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub dirs: Dirs,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for `generate` when no subcommand is given.
    #[command(flatten)]
    pub generate: GenerateArgs,
}

impl Config {
    /// The subcommand to run; `generate` when none was given.
    ///
    /// Generate options given before a named subcommand are rejected, since
    /// only the options after it would take effect.
    pub fn command(&self) -> Result<Command, clap::Error> {
        match &self.command {
            None => Ok(Command::Generate(self.generate.clone())),
            Some(command) if self.generate == GenerateArgs::default() => Ok(command.clone()),
            Some(_) => Err(<Self as CommandFactory>::command().error(
                ErrorKind::ArgumentConflict,
                "generate options must follow the subcommand, e.g. `generate --no-compress`",
            )),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write one artifact per model version manifest (the default).
    Generate(GenerateArgs),

    /// Compare two artifacts (plain or .gz) feature by feature.
    Compare { a: PathBuf, b: PathBuf },

    /// Convert legacy `.txt` outlines to `.geojson` files next to them.
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the artifacts in the output directory, newest version first.
    List,
}

#[derive(Args, Debug, Clone)]
pub struct Dirs {
    /// Velocity modelling root holding `model_versions/`, `data/regional/`
    /// and `generated_basin_geojsons/`.
    #[arg(long, env = "BASIN2GEOJSON_PATH", default_value = ".", global = true)]
    pub path: PathBuf,

    /// Manifest directory; overrides `<path>/model_versions`.
    #[arg(long, env = "BASIN2GEOJSON_MODEL_VERSIONS_DIR", global = true)]
    pub model_versions_dir: Option<PathBuf>,

    /// Regional outline tree; overrides `<path>/data/regional`.
    #[arg(long, env = "BASIN2GEOJSON_REGIONAL_DIR", global = true)]
    pub regional_dir: Option<PathBuf>,

    /// Artifact directory; overrides `<path>/generated_basin_geojsons`.
    #[arg(long, env = "BASIN2GEOJSON_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,
}

impl Dirs {
    pub fn model_versions(&self) -> PathBuf {
        self.model_versions_dir
            .clone()
            .unwrap_or_else(|| self.path.join("model_versions"))
    }

    pub fn regional(&self) -> PathBuf {
        self.regional_dir
            .clone()
            .unwrap_or_else(|| self.path.join("data").join("regional"))
    }

    pub fn output(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.path.join("generated_basin_geojsons"))
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct GenerateArgs {
    /// Write coordinates exactly as read.
    #[arg(long)]
    pub no_simplify: bool,

    /// Douglas-Peucker tolerance in degrees.
    #[arg(long, default_value_t = 0.0001)]
    pub tolerance: f64,

    /// Decimal digits kept per coordinate after simplification.
    #[arg(long, default_value_t = 5)]
    pub precision: u32,

    /// Write plain `.geojson` instead of `.geojson.gz`.
    #[arg(long)]
    pub no_compress: bool,

    /// Indent the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Basin color; repeat to cycle through a palette per basin.
    #[arg(long = "color", value_name = "COLOR")]
    pub colors: Vec<String>,

    #[arg(long, default_value_t = 1.0)]
    pub stroke_width: f64,

    #[arg(long, default_value_t = 0.3)]
    pub fill_opacity: f64,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            no_simplify: false,
            tolerance: 0.0001,
            precision: 5,
            no_compress: false,
            pretty: false,
            colors: Vec::new(),
            stroke_width: 1.0,
            fill_opacity: 0.3,
        }
    }
}

impl GenerateArgs {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            combine: CombineOptions {
                simplify: !self.no_simplify,
                geometry: SimplifyOptions {
                    tolerance: self.tolerance,
                    precision: self.precision,
                },
            },
            write: WriteOptions {
                compress: !self.no_compress,
                pretty: self.pretty,
            },
        }
    }
}
