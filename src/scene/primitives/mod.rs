//! Canonical shapes.
//!
//! | shape | local geometry | parts |
//! |---|---|---|
//! | [`Cuboid`] | `[-1, 1]³` | [`BoxFace`](crate::geometry::BoxFace) indices |
//! | [`Cylinder`] | radius 1 around z, `z ∈ [0, 1]` | bottom, top, side |
//! | [`Ellipsoid`] | unit sphere | 0 |
//! | [`Plane`] | `z = 0` | 0 |
//! | [`Ring`] | annulus in `z = 0`, outer radius 1 | 0 |
//! | [`PlanarTriangle`] | explicit vertices | 0 |
//! | [`Mesh`] | explicit triangles | triangle index |

mod cuboid;
mod cylinder;
mod ellipsoid;
mod mesh;
mod planar;

pub use cuboid::Cuboid;
pub use cylinder::{Cylinder, CylinderFace};
pub use ellipsoid::Ellipsoid;
pub use mesh::{Mesh, MeshLoadError, VertexData};
pub use planar::{PlanarTriangle, Plane, Ring};

use std::f64::consts::TAU;

use crate::geometry::{FloatType, WorldPoint};

/// Azimuth around the z axis mapped to `[0, 1)`.
fn azimuth_fraction(p: &WorldPoint) -> FloatType {
    (p.y.atan2(p.x) / TAU).rem_euclid(1.0)
}
