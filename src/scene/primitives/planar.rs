//! Flat shapes without an inside. A line crosses them at most once, so entry and exit coincide.

use crate::{
    geometry::{
        FloatType, SlabHit, TexturePoint, Triangle, WorldBox, WorldPoint, WorldVector,
    },
    scene::Shape,
};

use super::azimuth_fraction;

/// Fraction along the line through `p0` and `p1` where it crosses `z = 0`.
fn cross_xy_plane(p0: &WorldPoint, p1: &WorldPoint, parallel_epsilon: FloatType) -> Option<FloatType> {
    let dz = p1.z - p0.z;
    if dz.abs() < parallel_epsilon {
        return None;
    }
    Some(-p0.z / dz)
}

fn single_crossing(alpha: FloatType, t0: FloatType, t1: FloatType) -> SlabHit {
    SlabHit::from_alphas(alpha, alpha, 0, 0, t0, t1)
}

/// The infinite plane `z = 0`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Plane;

impl Shape for Plane {
    fn local_bounds(&self) -> WorldBox {
        WorldBox::new(
            WorldPoint::new(FloatType::NEG_INFINITY, FloatType::NEG_INFINITY, 0.0),
            WorldPoint::new(FloatType::INFINITY, FloatType::INFINITY, 0.0),
        )
    }

    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        cross_xy_plane(p0, p1, parallel_epsilon).map(|alpha| single_crossing(alpha, t0, t1))
    }

    fn normal(&self, _p: &WorldPoint, _part: usize) -> WorldVector {
        WorldVector::z()
    }

    fn tex_uv(&self, p: &WorldPoint, _part: usize) -> TexturePoint {
        TexturePoint::new(p.x, p.y)
    }

    fn is_solid(&self) -> bool {
        false
    }
}

/// Annulus in `z = 0` between `inner_radius` and 1.
#[derive(Copy, Clone, Debug, Default)]
pub struct Ring {
    inner_radius: FloatType,
}

impl Ring {
    pub fn new(inner_radius: FloatType) -> Ring {
        assert2::assert!((0.0..1.0).contains(&inner_radius));
        Ring { inner_radius }
    }
}

impl Shape for Ring {
    fn local_bounds(&self) -> WorldBox {
        WorldBox::new(WorldPoint::new(-1.0, -1.0, 0.0), WorldPoint::new(1.0, 1.0, 0.0))
    }

    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        let alpha = cross_xy_plane(p0, p1, parallel_epsilon)?;
        let p = p0 + (p1 - p0) * alpha;
        let r = p.x.hypot(p.y);
        (self.inner_radius..=1.0)
            .contains(&r)
            .then(|| single_crossing(alpha, t0, t1))
    }

    fn normal(&self, _p: &WorldPoint, _part: usize) -> WorldVector {
        WorldVector::z()
    }

    /// Radial position across the annulus and azimuth.
    fn tex_uv(&self, p: &WorldPoint, _part: usize) -> TexturePoint {
        let r = p.x.hypot(p.y);
        TexturePoint::new(
            (r - self.inner_radius) / (1.0 - self.inner_radius),
            azimuth_fraction(p),
        )
    }

    fn is_solid(&self) -> bool {
        false
    }
}

/// Single two sided triangle with optional texture coordinates per vertex.
#[derive(Clone, Debug)]
pub struct PlanarTriangle {
    triangle: Triangle<WorldPoint>,
    tex: Option<Triangle<TexturePoint>>,
}

impl PlanarTriangle {
    pub fn new(triangle: Triangle<WorldPoint>, tex: Option<Triangle<TexturePoint>>) -> Self {
        PlanarTriangle { triangle, tex }
    }
}

impl Shape for PlanarTriangle {
    fn local_bounds(&self) -> WorldBox {
        WorldBox::from_points(self.triangle.iter())
    }

    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        self.triangle
            .intersect_line(p0, p1, parallel_epsilon)
            .map(|(alpha, _)| single_crossing(alpha, t0, t1))
    }

    fn normal(&self, _p: &WorldPoint, _part: usize) -> WorldVector {
        self.triangle.normal()
    }

    fn tex_uv(&self, p: &WorldPoint, _part: usize) -> TexturePoint {
        let uv = self.triangle.barycentric(p);
        match &self.tex {
            Some(tex) => TexturePoint::from(uv.interpolate_triangle(&tex.map(|t| t.coords))),
            None => TexturePoint::new(uv.u, uv.v),
        }
    }

    fn is_solid(&self) -> bool {
        false
    }
}
