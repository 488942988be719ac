mod bound_box;
pub mod octree;
mod ray_box_intersection;
mod ray_triangle_intersection;
mod transform;
mod triangle;

pub use bound_box::BoundBox;
pub use ray_box_intersection::{BoxFace, SlabHit};
pub use transform::AffineTransform;
pub use triangle::{BarycentricCoordinates, Triangle};

use arrayvec::ArrayVec;
use nalgebra::{Point2, Point3, Point4, Vector3, Vector4};

pub type FloatType = f64;

/// Smallest length we still consider a valid direction.
pub const EPSILON: FloatType = 1e-9;

/// Tolerance for comparing ray distances.
pub const DIST_EPSILON: FloatType = 1e-8;

/// Point in a coordinate chart, component 0 is the time coordinate.
pub type SpacetimePoint = Point4<FloatType>;
pub type FourVector = Vector4<FloatType>;

/// Spatial part of a pseudo-Cartesian chart, also used for canonical object space.
pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldBox = BoundBox<WorldPoint>;

pub type TexturePoint = Point2<FloatType>;

/// Returns the spatial components of a spacetime point.
pub fn spatial_part(p: &SpacetimePoint) -> WorldPoint {
    WorldPoint::new(p[1], p[2], p[3])
}

pub fn spatial_vector(v: &FourVector) -> WorldVector {
    WorldVector::new(v[1], v[2], v[3])
}

pub fn with_time(t: FloatType, p: &WorldPoint) -> SpacetimePoint {
    SpacetimePoint::new(t, p.x, p.y, p.z)
}

/// Real roots of `a x² + b x + c = 0` in ascending order, a double root is returned twice.
/// `a` must be non-zero.
pub fn solve_quadratic(a: FloatType, b: FloatType, c: FloatType) -> ArrayVec<FloatType, 2> {
    let mut roots = ArrayVec::new();
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return roots;
    }
    // Avoids cancellation between -b and the root of the discriminant
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    let (r0, r1) = if q == 0.0 {
        (0.0, 0.0)
    } else {
        (q / a, c / q)
    };
    roots.push(r0.min(r1));
    roots.push(r0.max(r1));
    roots
}
