//! In-memory SVG scene.
//!
//! A retained scene graph that implements [`RenderSurface`] by keeping its
//! own timeline of scheduled opacity changes and removals. Advancing the
//! clock applies whatever has come due, and [`SvgScene::to_svg`] writes the
//! scene as it stands at that moment.

use crate::config::{EdgeShape, RenderConfig};
use crate::layout::{Edge, Point, PointGroup};
use crate::surface::RenderSurface;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Handle to an element in an [`SvgScene`]. Ids increase in creation
/// order, which is also paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Dot {
        point_id: String,
        index: usize,
        group: PointGroup,
        x: f64,
        y: f64,
        radius: f64,
    },
    Connector(Edge),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub shape: Shape,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    SetOpacity(f64),
    Remove,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due_ms: u64,
    seq: u64,
    target: ElementId,
    action: Action,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        (self.due_ms, self.seq) == (other.due_ms, other.seq)
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

pub struct SvgScene {
    pub width: u32,
    pub height: u32,
    pub render: RenderConfig,
    elements: BTreeMap<ElementId, Element>,
    timeline: BinaryHeap<Reverse<Scheduled>>,
    next_id: u64,
    next_seq: u64,
    now_ms: u64,
}

impl SvgScene {
    pub fn new(width: u32, height: u32, render: RenderConfig) -> Self {
        Self {
            width,
            height,
            render,
            elements: BTreeMap::new(),
            timeline: BinaryHeap::new(),
            next_id: 0,
            next_seq: 0,
            now_ms: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Number of scheduled actions not yet applied.
    pub fn pending(&self) -> usize {
        self.timeline.len()
    }

    /// Ids of the point elements currently in the scene, in paint order.
    pub fn point_ids(&self) -> Vec<&str> {
        self.elements
            .values()
            .filter_map(|el| match &el.shape {
                Shape::Dot { point_id, .. } => Some(point_id.as_str()),
                Shape::Connector(_) => None,
            })
            .collect()
    }

    /// Ids of the edge elements currently in the scene, in paint order.
    pub fn edge_ids(&self) -> Vec<&str> {
        self.elements
            .values()
            .filter_map(|el| match &el.shape {
                Shape::Connector(edge) => Some(edge.id.as_str()),
                Shape::Dot { .. } => None,
            })
            .collect()
    }

    /// Current opacity of the element drawing `id` (point or edge id).
    pub fn opacity_of(&self, id: &str) -> Option<f64> {
        self.elements.values().find_map(|el| {
            let matches = match &el.shape {
                Shape::Dot { point_id, .. } => point_id == id,
                Shape::Connector(edge) => edge.id == id,
            };
            matches.then_some(el.opacity)
        })
    }

    fn insert(&mut self, shape: Shape) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, Element { shape, opacity: 0.0 });
        id
    }

    fn schedule(&mut self, target: ElementId, action: Action, delay_ms: u64) {
        let scheduled = Scheduled {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            target,
            action,
        };
        self.next_seq += 1;
        if delay_ms == 0 {
            self.apply(scheduled);
        } else {
            self.timeline.push(Reverse(scheduled));
        }
    }

    fn apply(&mut self, scheduled: Scheduled) {
        match scheduled.action {
            Action::SetOpacity(opacity) => {
                if let Some(el) = self.elements.get_mut(&scheduled.target) {
                    el.opacity = opacity;
                }
            }
            Action::Remove => {
                self.elements.remove(&scheduled.target);
            }
        }
    }

    /// Render the scene as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut edges = Vec::new();
        let mut dots = Vec::new();

        for el in self.elements.values() {
            match &el.shape {
                Shape::Connector(edge) => edges.push(self.draw_edge(edge, el.opacity)),
                Shape::Dot {
                    point_id,
                    index,
                    group,
                    x,
                    y,
                    radius,
                } => {
                    // Blink phase staggers with the creation index.
                    let blink_delay = (*index as f64 * 0.05) % 2.0;
                    dots.push(format!(
                        r#"<circle cx="{:.1}" cy="{:.1}" r="{:.2}" fill="{}" class="animate-blink" style="animation-delay: {:.2}s; opacity: {:.2};" data-id="{}" data-group="{}"/>"#,
                        x,
                        y,
                        radius,
                        self.render.point_fill,
                        blink_delay,
                        el.opacity,
                        point_id,
                        group.as_str()
                    ));
                }
            }
        }

        self.wrap_svg(&format!("{}\n{}", edges.join("\n"), dots.join("\n")))
    }

    fn draw_edge(&self, edge: &Edge, opacity: f64) -> String {
        let stroke = format!(
            r#"stroke="{}" stroke-width="{}" style="opacity: {:.2};" data-id="{}" data-type="{}""#,
            self.render.edge_stroke,
            self.render.edge_stroke_width,
            opacity,
            edge.id,
            edge.kind.as_str()
        );

        match self.render.edge_shape {
            EdgeShape::Line => format!(
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" {}/>"#,
                edge.x1, edge.y1, edge.x2, edge.y2, stroke
            ),
            EdgeShape::Curve { offset } => format!(
                r#"<path d="{}" fill="none" {}/>"#,
                quad_curve_path(edge.x1, edge.y1, edge.x2, edge.y2, offset),
                stroke
            ),
        }
    }

    fn wrap_svg(&self, content: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">
  <style>circle {{ transition: cx {}ms, cy {}ms, r {}ms, opacity {}ms; }}</style>
  <rect width="100%" height="100%" fill="{}"/>
  {}
</svg>"#,
            self.width,
            self.height,
            self.width,
            self.height,
            self.render.transition_ms,
            self.render.transition_ms,
            self.render.transition_ms,
            self.render.transition_ms,
            self.render.background,
            content
        )
    }
}

/// Quadratic curve from `(x1, y1)` to `(x2, y2)` whose control point sits
/// `offset` pixels off the midpoint, perpendicular to the chord.
pub fn quad_curve_path(x1: f64, y1: f64, x2: f64, y2: f64, offset: f64) -> String {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return format!("M {:.1},{:.1} L {:.1},{:.1}", x1, y1, x2, y2);
    }

    let (ux, uy) = (-dy / len, dx / len);
    let cx = (x1 + x2) / 2.0 + ux * offset;
    let cy = (y1 + y2) / 2.0 + uy * offset;
    format!(
        "M {:.1},{:.1} Q {:.1},{:.1} {:.1},{:.1}",
        x1, y1, cx, cy, x2, y2
    )
}

impl RenderSurface for SvgScene {
    type Handle = ElementId;

    fn create_point(&mut self, point: &Point) -> ElementId {
        let index = point
            .id
            .strip_prefix("point-")
            .and_then(|i| i.parse().ok())
            .unwrap_or(0);
        self.insert(Shape::Dot {
            point_id: point.id.clone(),
            index,
            group: point.group,
            x: point.x,
            y: point.y,
            radius: point.radius,
        })
    }

    fn update_point(&mut self, handle: ElementId, new_x: f64, new_y: f64, new_radius: f64) {
        if let Some(Element {
            shape: Shape::Dot { x, y, radius, .. },
            ..
        }) = self.elements.get_mut(&handle)
        {
            *x = new_x;
            *y = new_y;
            *radius = new_radius;
        }
    }

    fn set_opacity_after(&mut self, handle: ElementId, opacity: f64, delay_ms: u64) {
        self.schedule(handle, Action::SetOpacity(opacity), delay_ms);
    }

    fn remove_after(&mut self, handle: ElementId, delay_ms: u64) {
        self.schedule(handle, Action::Remove, delay_ms);
    }

    fn create_edge(&mut self, edge: &Edge) -> ElementId {
        self.insert(Shape::Connector(edge.clone()))
    }

    fn remove_edge(&mut self, handle: ElementId) {
        self.elements.remove(&handle);
    }

    fn is_live(&self, handle: ElementId) -> bool {
        self.elements.contains_key(&handle)
    }

    fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        while let Some(Reverse(next)) = self.timeline.peek().copied() {
            if next.due_ms > self.now_ms {
                break;
            }
            self.timeline.pop();
            self.apply(next);
        }
    }
}
