//! Configuration loading for Filament.
//!
//! Configuration is loaded from TOML files with environment variable overrides.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "filament.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilamentConfig {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub animation: AnimationConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub roster: RosterConfig,
}

/// One band of the radius distribution.
///
/// A point falls in the first tier whose `threshold` exceeds its size
/// percentile (`size_seed % 100`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeTier {
    pub threshold: u32,
    pub min: f64,
    pub max: f64,
}

impl SizeTier {
    pub const fn new(threshold: u32, min: f64, max: f64) -> Self {
        Self {
            threshold,
            min,
            max,
        }
    }
}

/// Distance cutoff for proximity edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityThreshold {
    /// Fixed distance in pixels.
    Pixels(f64),
    /// Fraction of the viewport diagonal.
    DiagonalFraction(f64),
}

impl ProximityThreshold {
    /// Resolve to a pixel distance for a viewport of the given size.
    pub fn resolve(&self, width: f64, height: f64) -> f64 {
        match *self {
            ProximityThreshold::Pixels(px) => px,
            ProximityThreshold::DiagonalFraction(fraction) => {
                (width * width + height * height).sqrt() * fraction
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_point_count")]
    pub point_count: usize,

    #[serde(default = "default_min_point_margin")]
    pub min_point_margin: f64,

    /// Fraction of points placed in the structured band.
    #[serde(default = "default_right_side_ratio")]
    pub right_side_ratio: f64,

    /// Left edge of the structured band as a fraction of the width.
    #[serde(default = "default_right_side_threshold")]
    pub right_side_threshold: f64,

    #[serde(default = "default_center_y_ratio")]
    pub center_y_ratio: f64,

    #[serde(default = "default_center_y_offset")]
    pub center_y_offset: f64,

    #[serde(default = "default_size_tiers")]
    pub size_tiers: Vec<SizeTier>,

    #[serde(default = "default_radius_scale")]
    pub radius_scale: f64,

    #[serde(default = "default_min_opacity")]
    pub min_opacity: f64,

    #[serde(default = "default_opacity_step")]
    pub opacity_step: f64,

    #[serde(default = "default_connection_ratio")]
    pub connection_ratio: f64,

    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: ProximityThreshold,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            point_count: default_point_count(),
            min_point_margin: default_min_point_margin(),
            right_side_ratio: default_right_side_ratio(),
            right_side_threshold: default_right_side_threshold(),
            center_y_ratio: default_center_y_ratio(),
            center_y_offset: default_center_y_offset(),
            size_tiers: default_size_tiers(),
            radius_scale: default_radius_scale(),
            min_opacity: default_min_opacity(),
            opacity_step: default_opacity_step(),
            connection_ratio: default_connection_ratio(),
            proximity_threshold: default_proximity_threshold(),
        }
    }
}

fn default_point_count() -> usize {
    80
}

fn default_min_point_margin() -> f64 {
    20.0
}

fn default_right_side_ratio() -> f64 {
    0.5
}

fn default_right_side_threshold() -> f64 {
    0.6
}

fn default_center_y_ratio() -> f64 {
    0.7
}

fn default_center_y_offset() -> f64 {
    0.15
}

fn default_size_tiers() -> Vec<SizeTier> {
    vec![
        SizeTier::new(70, 0.8, 1.2),
        SizeTier::new(90, 1.5, 2.0),
        SizeTier::new(100, 2.5, 3.25),
    ]
}

fn default_radius_scale() -> f64 {
    2.0
}

fn default_min_opacity() -> f64 {
    0.6
}

fn default_opacity_step() -> f64 {
    0.08
}

fn default_connection_ratio() -> f64 {
    0.75
}

fn default_proximity_threshold() -> ProximityThreshold {
    ProximityThreshold::Pixels(400.0)
}

/// Timing of the transition between two layouts. All delays are in
/// milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_fade_delay_base")]
    pub fade_delay_base: u64,

    #[serde(default = "default_fade_delay_step")]
    pub fade_delay_step: u64,

    #[serde(default = "default_edge_fade_delay_step")]
    pub edge_fade_delay_step: u64,

    /// Stagger multiplier for proximity edges; structured edges use 1.
    #[serde(default = "default_proximity_stagger")]
    pub proximity_stagger: f64,

    #[serde(default = "default_edge_opacity")]
    pub edge_opacity: f64,

    #[serde(default = "default_transition_settle_ms")]
    pub transition_settle_ms: u64,

    #[serde(default = "default_removal_ms")]
    pub removal_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fade_delay_base: default_fade_delay_base(),
            fade_delay_step: default_fade_delay_step(),
            edge_fade_delay_step: default_edge_fade_delay_step(),
            proximity_stagger: default_proximity_stagger(),
            edge_opacity: default_edge_opacity(),
            transition_settle_ms: default_transition_settle_ms(),
            removal_ms: default_removal_ms(),
        }
    }
}

fn default_fade_delay_base() -> u64 {
    10
}

fn default_fade_delay_step() -> u64 {
    5
}

fn default_edge_fade_delay_step() -> u64 {
    20
}

fn default_proximity_stagger() -> f64 {
    0.5
}

fn default_edge_opacity() -> f64 {
    0.8
}

fn default_transition_settle_ms() -> u64 {
    800
}

fn default_removal_ms() -> u64 {
    800
}

/// How edges are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeShape {
    Line,
    /// Quadratic curve bowed sideways by `offset` pixels.
    Curve { offset: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_point_fill")]
    pub point_fill: String,

    #[serde(default = "default_edge_stroke")]
    pub edge_stroke: String,

    #[serde(default = "default_edge_stroke_width")]
    pub edge_stroke_width: f64,

    #[serde(default = "default_edge_shape")]
    pub edge_shape: EdgeShape,

    /// Duration hint for position transitions, emitted as CSS.
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            point_fill: default_point_fill(),
            edge_stroke: default_edge_stroke(),
            edge_stroke_width: default_edge_stroke_width(),
            edge_shape: default_edge_shape(),
            transition_ms: default_transition_ms(),
        }
    }
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_point_fill() -> String {
    "#ffffff".to_string()
}

fn default_edge_stroke() -> String {
    "#ffffff".to_string()
}

fn default_edge_stroke_width() -> f64 {
    1.0
}

fn default_edge_shape() -> EdgeShape {
    EdgeShape::Line
}

fn default_transition_ms() -> u64 {
    800
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_directory() -> String {
    "output".to_string()
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_roster_path")]
    pub path: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: default_roster_path(),
        }
    }
}

fn default_roster_path() -> String {
    "members.json".to_string()
}

impl FilamentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("FILAMENT").separator("__"))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;

        let filament_config: FilamentConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(filament_config)
    }
}
