//! The drawing target a [`Reconciler`](crate::reconcile::Reconciler) drives.

use crate::layout::{Edge, Point};
use std::fmt::Debug;

/// A retained-mode scene that can create, move, fade and remove elements.
///
/// Delays are relative to the surface's current time. Surfaces that keep
/// their own timers off the host clock receive that clock through
/// [`advance_to`](RenderSurface::advance_to); surfaces backed by a real
/// event loop can ignore it.
pub trait RenderSurface {
    type Handle: Copy + Eq + Debug;

    /// Create a point element at zero opacity.
    fn create_point(&mut self, point: &Point) -> Self::Handle;

    /// Move and resize an existing point. The surface animates the change.
    fn update_point(&mut self, handle: Self::Handle, x: f64, y: f64, radius: f64);

    fn set_opacity_after(&mut self, handle: Self::Handle, opacity: f64, delay_ms: u64);

    fn remove_after(&mut self, handle: Self::Handle, delay_ms: u64);

    /// Create an edge element at zero opacity.
    fn create_edge(&mut self, edge: &Edge) -> Self::Handle;

    fn remove_edge(&mut self, handle: Self::Handle);

    /// Whether the element behind `handle` still exists.
    fn is_live(&self, handle: Self::Handle) -> bool;

    fn advance_to(&mut self, _now_ms: u64) {}
}
