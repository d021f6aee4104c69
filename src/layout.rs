//! Deterministic network layout.
//!
//! Turns a [`Subject`] into a set of positioned points and the edges that
//! connect them. Nothing here is random in the `rand` sense: every
//! position, radius and connection is derived from [`string_hash`] over
//! the subject's attributes, so the same subject on the same viewport
//! always produces a bit-identical layout.
//!
//! Points come in two groups:
//! - Structured points occupy a band on the right of the viewport and are
//!   wired together by seeded index offsets
//! - Random points spread over the whole viewport and are wired to any
//!   other random point within a proximity threshold

use crate::config::{LayoutConfig, SizeTier};
use crate::hash::string_hash;
use crate::roster::Subject;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

const X_PRIME_MUL: u64 = 17;
const X_PRIME_MOD: u64 = 997;
const Y_PRIME_MUL: u64 = 31;
const Y_PRIME_MOD: u64 = 991;

/// Drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp both dimensions to at least one pixel. Non-finite sizes are
    /// treated as degenerate.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.max(1.0) } else { 1.0 };
        Self {
            width: clamp(self.width),
            height: clamp(self.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointGroup {
    Structured,
    Random,
}

impl PointGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointGroup::Structured => "structured",
            PointGroup::Random => "random",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Structured,
    Proximity,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Structured => "structured",
            EdgeKind::Proximity => "proximity",
        }
    }
}

/// A generated node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    /// `point-<index>`; stable across regenerations with the same count.
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub opacity: f64,
    pub group: PointGroup,
}

/// A connection between two points. Coordinates are copied from the
/// endpoints when the edge is generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub kind: EdgeKind,
}

impl Edge {
    fn between(
        id: String,
        kind: EdgeKind,
        points: &[Point],
        source: usize,
        target: usize,
    ) -> Self {
        let (a, b) = (&points[source], &points[target]);
        Self {
            id,
            source,
            target,
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            kind,
        }
    }
}

/// Points plus the edges derived from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    pub points: Vec<Point>,
    pub edges: Vec<Edge>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub struct LayoutGenerator {
    pub config: LayoutConfig,
}

impl Default for LayoutGenerator {
    fn default() -> Self {
        Self {
            config: LayoutConfig::default(),
        }
    }
}

impl LayoutGenerator {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Number of leading point indices that belong to the structured group.
    pub fn structured_count(&self) -> usize {
        let count = self.config.point_count as f64 * self.config.right_side_ratio;
        (count.round().max(0.0) as usize).min(self.config.point_count)
    }

    /// Upper bound on the number of structured edges.
    pub fn connection_count(&self) -> usize {
        let count = self.config.point_count as f64 * self.config.connection_ratio;
        count.floor().max(0.0) as usize
    }

    /// Generate the layout for `subject` on `viewport`.
    pub fn generate(&self, subject: &Subject, viewport: Viewport) -> Layout {
        let viewport = viewport.clamped();
        let base_seed = string_hash(&format!("{}{}{}", subject.id, subject.name, subject.since));
        let structured_count = self.structured_count();

        let points: Vec<Point> = (0..self.config.point_count)
            .map(|i| {
                let point_seed = string_hash(&format!(
                    "{}-{}-{}",
                    subject.seed_source(i),
                    i,
                    base_seed
                ));
                let group = if i < structured_count {
                    PointGroup::Structured
                } else {
                    PointGroup::Random
                };
                let (x, y) = self.place(point_seed, group, viewport);

                let size_seed =
                    string_hash(&format!("{}-{}-size-{}", subject.id, subject.name, i));
                let radius = self.radius(size_seed);
                let opacity =
                    self.config.min_opacity + (size_seed % 5) as f64 * self.config.opacity_step;

                Point {
                    id: format!("point-{}", i),
                    x,
                    y,
                    radius,
                    opacity,
                    group,
                }
            })
            .collect();

        let (structured, random): (Vec<usize>, Vec<usize>) =
            (0..points.len()).partition(|&i| points[i].group == PointGroup::Structured);

        let mut edges = self.structured_edges(subject, &points, &structured);
        let structured_edges = edges.len();
        let threshold = self
            .config
            .proximity_threshold
            .resolve(viewport.width, viewport.height);
        edges.extend(Self::proximity_edges(&points, &random, threshold));

        debug!(
            subject = %subject.id,
            points = points.len(),
            structured_edges,
            proximity_edges = edges.len() - structured_edges,
            "generated layout"
        );

        Layout { points, edges }
    }

    /// Map a point seed into the band for its group.
    fn place(&self, seed: u32, group: PointGroup, viewport: Viewport) -> (f64, f64) {
        let margin = self.config.min_point_margin;
        let seed = u64::from(seed);
        let fx = ((seed * X_PRIME_MUL) % X_PRIME_MOD) as f64 / X_PRIME_MOD as f64;
        let fy = ((seed * Y_PRIME_MUL) % Y_PRIME_MOD) as f64 / Y_PRIME_MOD as f64;

        match group {
            PointGroup::Structured => {
                let band_left = viewport.width * self.config.right_side_threshold;
                let band_width = viewport.width * (1.0 - self.config.right_side_threshold);
                let band_top = viewport.height * self.config.center_y_offset;
                let band_height = viewport.height * self.config.center_y_ratio;
                (
                    band_left + margin + fx * (band_width - margin * 2.0),
                    band_top + margin + fy * (band_height - margin * 2.0),
                )
            }
            PointGroup::Random => (
                margin + fx * (viewport.width - margin * 2.0),
                margin + fy * (viewport.height - margin * 2.0),
            ),
        }
    }

    /// Tier for a size seed: the first tier whose threshold exceeds the
    /// seed's percentile, falling back to the last tier.
    pub fn tier_for(&self, size_seed: u32) -> Option<&SizeTier> {
        let percentile = size_seed % 100;
        self.config
            .size_tiers
            .iter()
            .find(|tier| percentile < tier.threshold)
            .or_else(|| self.config.size_tiers.last())
    }

    fn radius(&self, size_seed: u32) -> f64 {
        let Some(tier) = self.tier_for(size_seed) else {
            return 0.0;
        };
        let span = (tier.max - tier.min) * 10.0;
        let radius = if span > 0.0 {
            tier.min + (size_seed as f64 % span) / 10.0
        } else {
            tier.min
        };
        radius * self.config.radius_scale
    }

    /// Seeded index-offset pairing within the structured group.
    fn structured_edges(
        &self,
        subject: &Subject,
        points: &[Point],
        structured: &[usize],
    ) -> Vec<Edge> {
        let len = structured.len();
        if len <= 1 {
            return Vec::new();
        }

        (0..self.connection_count().min(len))
            .filter_map(|i| {
                let source = structured[i % len];
                let connect_seed =
                    string_hash(&format!("{}-{}-conn-{}", subject.id, subject.name, i));
                let offset = 1 + connect_seed as usize % (len - 1);
                let target = structured[(i + offset) % len];
                if source == target {
                    return None;
                }
                Some(Edge::between(
                    format!("connection-structured-{}", i),
                    EdgeKind::Structured,
                    points,
                    source,
                    target,
                ))
            })
            .collect()
    }

    /// Every pair of random points within `threshold` of each other.
    fn proximity_edges(points: &[Point], random: &[usize], threshold: f64) -> Vec<Edge> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for (i, &a) in random.iter().enumerate() {
            for &b in &random[i + 1..] {
                let dx = points[a].x - points[b].x;
                let dy = points[a].y - points[b].y;
                // A NaN threshold connects nothing.
                let within = (dx * dx + dy * dy).sqrt() <= threshold;
                if !within {
                    continue;
                }
                let (lo, hi) = (a.min(b), a.max(b));
                if seen.insert((lo, hi)) {
                    edges.push(Edge::between(
                        format!("proximity-{}-{}", lo, hi),
                        EdgeKind::Proximity,
                        points,
                        a,
                        b,
                    ));
                }
            }
        }

        edges
    }
}
