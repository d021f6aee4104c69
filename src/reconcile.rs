//! Transition from one layout to the next without discarding unaffected
//! elements.
//!
//! Points are matched by id and moved in place; new points fade in one
//! after another; departed points fade out and are removed. Edges never
//! survive a transition: they are torn down immediately and recreated
//! from the new layout once the points have had time to settle.
//!
//! Deferred work is modelled as a single settle task tagged with a
//! generation token. Every call to [`Reconciler::reconcile`] bumps the
//! token, so a superseded task can never materialize its edges.

use crate::config::AnimationConfig;
use crate::layout::{Edge, EdgeKind, Layout};
use crate::surface::RenderSurface;
use std::collections::{HashMap, HashSet};
use std::mem;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    /// No deferred edge task is pending.
    Idle,
    /// A settle timer is running; edges appear when it fires.
    AwaitingEdges,
}

struct SettleTask {
    generation: u64,
    due_ms: u64,
    edges: Vec<Edge>,
}

pub struct Reconciler<S: RenderSurface> {
    surface: S,
    config: AnimationConfig,
    previous: Layout,
    points: HashMap<String, S::Handle>,
    edges: Vec<S::Handle>,
    generation: u64,
    pending: Option<SettleTask>,
    now_ms: u64,
    quiescent_ms: u64,
}

impl<S: RenderSurface> Reconciler<S> {
    pub fn new(surface: S, config: AnimationConfig) -> Self {
        Self {
            surface,
            config,
            previous: Layout::default(),
            points: HashMap::new(),
            edges: Vec::new(),
            generation: 0,
            pending: None,
            now_ms: 0,
            quiescent_ms: 0,
        }
    }

    pub fn state(&self) -> ReconcilerState {
        if self.pending.is_some() {
            ReconcilerState::AwaitingEdges
        } else {
            ReconcilerState::Idle
        }
    }

    /// The most recently reconciled layout.
    pub fn previous(&self) -> &Layout {
        &self.previous
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Time by which every fade, removal and deferred edge scheduled so far
    /// has taken effect.
    pub fn quiescent_at(&self) -> u64 {
        self.quiescent_ms
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Reconcile the surface against `next` and make it the current layout.
    ///
    /// Returns after scheduling; edges appear once [`advance`](Self::advance)
    /// reaches the settle deadline.
    pub fn reconcile(&mut self, next: Layout) {
        self.generation += 1;
        if let Some(task) = self.pending.take() {
            debug!(
                cancelled = task.generation,
                edges = task.edges.len(),
                "cancelled pending edges"
            );
        }

        for handle in self.edges.drain(..) {
            self.surface.remove_edge(handle);
        }

        let had_previous = !self.previous.is_empty();
        let previous_len = self.previous.points.len();
        let mut handles = HashMap::with_capacity(next.points.len());
        let mut moved = 0usize;

        for (index, point) in next.points.iter().enumerate() {
            let existing = self
                .points
                .remove(&point.id)
                .filter(|&handle| self.surface.is_live(handle));

            match existing {
                Some(handle) if index < previous_len => {
                    // Position and size only; opacity stays where it was.
                    self.surface
                        .update_point(handle, point.x, point.y, point.radius);
                    handles.insert(point.id.clone(), handle);
                    moved += 1;
                }
                stale => {
                    // A live element that fails the index guard is replaced
                    // so the id keeps exactly one element.
                    if let Some(handle) = stale {
                        self.surface.remove_after(handle, 0);
                    }
                    let handle = self.surface.create_point(point);
                    let delay = self
                        .config
                        .fade_delay_step
                        .saturating_mul(index as u64)
                        .saturating_add(self.config.fade_delay_base);
                    self.surface.set_opacity_after(handle, point.opacity, delay);
                    self.extend_quiescence(self.now_ms.saturating_add(delay));
                    handles.insert(point.id.clone(), handle);
                }
            }
        }

        let leftover = mem::replace(&mut self.points, handles);
        let mut removed = 0usize;
        if had_previous {
            let keep: HashSet<&str> = next.points.iter().map(|p| p.id.as_str()).collect();
            for (id, handle) in leftover {
                if keep.contains(id.as_str()) || !self.surface.is_live(handle) {
                    continue;
                }
                self.surface.set_opacity_after(handle, 0.0, 0);
                self.surface.remove_after(handle, self.config.removal_ms);
                self.extend_quiescence(self.now_ms.saturating_add(self.config.removal_ms));
                removed += 1;
            }
        }

        let due_ms = self.now_ms.saturating_add(self.config.transition_settle_ms);
        let created = next.points.len() - moved;
        debug!(
            generation = self.generation,
            moved,
            created,
            removed,
            edges = next.edges.len(),
            due_ms,
            "reconciled layout"
        );

        self.extend_quiescence(due_ms.saturating_add(self.edge_stagger_span(&next.edges)));
        self.pending = Some(SettleTask {
            generation: self.generation,
            due_ms,
            edges: next.edges.clone(),
        });
        self.previous = next;
    }

    /// Advance the host clock to `now_ms`, firing the settle task if it is
    /// due and still current.
    pub fn advance(&mut self, now_ms: u64) {
        let now_ms = now_ms.max(self.now_ms);

        let due = self
            .pending
            .as_ref()
            .is_some_and(|task| task.due_ms <= now_ms);
        if due {
            if let Some(task) = self.pending.take() {
                self.surface.advance_to(task.due_ms);
                self.now_ms = task.due_ms;
                self.materialize_edges(task);
            }
        }

        self.now_ms = now_ms;
        self.surface.advance_to(now_ms);
    }

    fn materialize_edges(&mut self, task: SettleTask) {
        if task.generation != self.generation {
            debug!(stale = task.generation, "dropped stale edge task");
            return;
        }

        for (index, edge) in task.edges.iter().enumerate() {
            let handle = self.surface.create_edge(edge);
            let delay = self.edge_delay(index, edge.kind);
            self.surface
                .set_opacity_after(handle, self.config.edge_opacity, delay);
            self.edges.push(handle);
        }
        debug!(
            generation = task.generation,
            edges = task.edges.len(),
            "materialized edges"
        );
    }

    fn edge_delay(&self, index: usize, kind: EdgeKind) -> u64 {
        let multiplier = match kind {
            EdgeKind::Proximity => self.config.proximity_stagger,
            EdgeKind::Structured => 1.0,
        };
        let delay = index as f64 * self.config.edge_fade_delay_step as f64 * multiplier;
        delay.max(0.0).round() as u64
    }

    fn edge_stagger_span(&self, edges: &[Edge]) -> u64 {
        edges
            .iter()
            .enumerate()
            .map(|(index, edge)| self.edge_delay(index, edge.kind))
            .max()
            .unwrap_or(0)
    }

    fn extend_quiescence(&mut self, at_ms: u64) {
        self.quiescent_ms = self.quiescent_ms.max(at_ms);
    }
}
