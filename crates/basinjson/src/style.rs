//! Display styling stamped onto combined features.
//!
//! Properties follow the simplestyle convention (`stroke`, `fill`,
//! `stroke-width`, `fill-opacity`) understood by the web map front end.

use serde_json::{json, Value};

use crate::basin::BasinName;
use crate::geometry::Properties;

pub const DEFAULT_COLOR: &str = "#ba0045";

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub stroke: String,
    pub fill: String,
    pub stroke_width: f64,
    pub fill_opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self::with_color(DEFAULT_COLOR)
    }
}

impl Style {
    pub fn with_color(color: &str) -> Self {
        Self {
            stroke: color.to_owned(),
            fill: color.to_owned(),
            stroke_width: 1.0,
            fill_opacity: 0.3,
        }
    }

    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert("stroke".into(), json!(self.stroke));
        props.insert("fill".into(), json!(self.fill));
        props.insert("stroke-width".into(), number(self.stroke_width));
        props.insert("fill-opacity".into(), number(self.fill_opacity));
        props
    }
}

/// Produces the styling properties for the features of one basin.
///
/// `group` is the position of the basin among the basins that resolved to at
/// least one file.
pub trait Styler {
    fn style(&self, basin: &BasinName, group: usize) -> Properties;
}

/// The same style for every feature.
#[derive(Debug, Clone, Default)]
pub struct UniformStyler(pub Style);

impl Styler for UniformStyler {
    fn style(&self, _basin: &BasinName, _group: usize) -> Properties {
        self.0.to_properties()
    }
}

/// One palette entry per basin group, wrapping around.
#[derive(Debug, Clone)]
pub struct CyclingStyler {
    palette: Vec<Style>,
}

impl CyclingStyler {
    /// `None` for an empty palette.
    pub fn new(palette: Vec<Style>) -> Option<Self> {
        (!palette.is_empty()).then_some(Self { palette })
    }
}

impl Styler for CyclingStyler {
    fn style(&self, _basin: &BasinName, group: usize) -> Properties {
        self.palette[group % self.palette.len()].to_properties()
    }
}

/// Uniform styling for zero or one color, cycling for more.
pub fn styler_for_colors(colors: &[String], stroke_width: f64, fill_opacity: f64) -> Box<dyn Styler> {
    let palette: Vec<Style> = colors
        .iter()
        .map(|color| Style {
            stroke_width,
            fill_opacity,
            ..Style::with_color(color)
        })
        .collect();

    match CyclingStyler::new(palette) {
        Some(cycling) if cycling.palette.len() > 1 => Box::new(cycling),
        Some(mut single) => Box::new(UniformStyler(single.palette.remove(0))),
        None => Box::new(UniformStyler(Style {
            stroke_width,
            fill_opacity,
            ..Style::default()
        })),
    }
}

/// Integral values are written without a fraction (`1`, not `1.0`).
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
