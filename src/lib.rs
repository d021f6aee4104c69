//! Filament - deterministic generative network visualizations.
//!
//! Each subject in a roster hashes into its own constellation of points
//! and connecting lines. Switching subjects moves the points that persist,
//! fades in the new ones, and redraws the lines once everything settles.

pub mod config;
pub mod hash;
pub mod layout;
pub mod reconcile;
pub mod roster;
pub mod scene;
pub mod surface;
pub mod view;

pub use config::FilamentConfig;
pub use layout::{Edge, EdgeKind, Layout, LayoutGenerator, Point, PointGroup, Viewport};
pub use reconcile::{Reconciler, ReconcilerState};
pub use roster::{Roster, Subject};
pub use scene::SvgScene;
pub use surface::RenderSurface;
pub use view::NetworkView;
