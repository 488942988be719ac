use std::f64::consts::PI;

use crate::{
    geometry::{FloatType, SlabHit, TexturePoint, WorldBox, WorldPoint, WorldVector, solve_quadratic},
    scene::Shape,
};

use super::azimuth_fraction;

/// Unit sphere, an ellipsoid once scaled by the primitive's transform.
#[derive(Copy, Clone, Debug, Default)]
pub struct Ellipsoid;

impl Shape for Ellipsoid {
    fn local_bounds(&self) -> WorldBox {
        WorldBox::new(WorldPoint::new(-1.0, -1.0, -1.0), WorldPoint::new(1.0, 1.0, 1.0))
    }

    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        let d = p1 - p0;
        let a = d.norm_squared();
        if a < parallel_epsilon * parallel_epsilon {
            return None;
        }
        let roots = solve_quadratic(a, 2.0 * p0.coords.dot(&d), p0.coords.norm_squared() - 1.0);
        let [near, far] = roots.as_slice() else {
            return None;
        };
        Some(SlabHit::from_alphas(*near, *far, 0, 0, t0, t1))
    }

    fn normal(&self, p: &WorldPoint, _part: usize) -> WorldVector {
        p.coords
    }

    /// Longitude and latitude, both mapped to `[0, 1]`.
    fn tex_uv(&self, p: &WorldPoint, _part: usize) -> TexturePoint {
        let r = p.coords.norm();
        let polar = if r > 0.0 { (p.z / r).clamp(-1.0, 1.0).acos() } else { 0.0 };
        TexturePoint::new(azimuth_fraction(p), polar / PI)
    }

    fn is_solid(&self) -> bool {
        true
    }
}
