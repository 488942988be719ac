//! Intersection of discretized light rays with scene objects in curved and moving spacetimes.
//!
//! A geodesic solver hands over a polyline of spacetime points; scene objects
//! (primitives, compounds, boolean combinations and objects moving along a worldline)
//! report where the polyline meets them.

pub mod error;
pub mod geometry;
pub mod metric;
pub mod motion;
pub mod ray;
pub mod scene;
pub mod settings;
pub mod tetrad;
pub mod util;

pub use error::CoreError;
pub use ray::{HitPolicy, Intersection, Ray, SpanList};
pub use scene::{SceneObject, Surface};
pub use settings::TraceSettings;
pub use tetrad::LocalTetrad;
