//! Entry point for hosts: select a subject, advance the clock.

use crate::config::{AnimationConfig, LayoutConfig};
use crate::layout::{Layout, LayoutGenerator, Viewport};
use crate::reconcile::{Reconciler, ReconcilerState};
use crate::roster::Subject;
use crate::surface::RenderSurface;
use tracing::{info, warn};

/// One visualization instance bound to one render surface.
pub struct NetworkView<S: RenderSurface> {
    generator: LayoutGenerator,
    reconciler: Reconciler<S>,
}

impl<S: RenderSurface> NetworkView<S> {
    pub fn new(surface: S, layout: LayoutConfig, animation: AnimationConfig) -> Self {
        Self {
            generator: LayoutGenerator::new(layout),
            reconciler: Reconciler::new(surface, animation),
        }
    }

    /// Lay out `subject` on a freshly measured viewport and transition the
    /// surface to it.
    pub fn on_subject_selected(&mut self, subject: &Subject, viewport: Viewport) -> &Layout {
        if !subject.is_complete() {
            warn!(
                subject = %subject.id,
                "subject has empty attributes; its layout may collide with others"
            );
        }
        info!(subject = %subject.id, name = %subject.name, "subject selected");

        let layout = self.generator.generate(subject, viewport);
        self.reconciler.reconcile(layout);
        self.reconciler.previous()
    }

    pub fn advance(&mut self, now_ms: u64) {
        self.reconciler.advance(now_ms);
    }

    /// Advance to the point where every scheduled transition has finished.
    pub fn settle(&mut self) {
        let at = self.reconciler.quiescent_at().max(self.reconciler.now_ms());
        self.reconciler.advance(at);
    }

    pub fn now_ms(&self) -> u64 {
        self.reconciler.now_ms()
    }

    pub fn state(&self) -> ReconcilerState {
        self.reconciler.state()
    }

    pub fn layout(&self) -> &Layout {
        self.reconciler.previous()
    }

    pub fn surface(&self) -> &S {
        self.reconciler.surface()
    }

    pub fn into_surface(self) -> S {
        self.reconciler.into_surface()
    }
}
