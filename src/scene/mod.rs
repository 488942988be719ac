//! Scene objects and the intersection contract they share.
//!
//! Scene objects are immutable while rays are traced: every query only takes `&self`
//! and all per-ray state lives in the [`Ray`], so a scene can be shared between threads.
//! Geometry edits need `&mut` access and therefore can only happen between passes.

mod compound;
mod csg;
mod local_compound;
mod octree_compound;
mod primitive;
pub mod primitives;

pub use compound::Compound;
pub use csg::{Csg, CsgOperation};
pub use local_compound::LocalCompound;
pub use octree_compound::OctreeCompound;
pub use primitive::Primitive;

use std::fmt::Debug;

use crate::{
    error::CoreError,
    geometry::{FloatType, SlabHit, TexturePoint, WorldBox, WorldPoint, WorldVector},
    ray::{Intersection, Ray, SpanList},
    util::SurfaceId,
};

/// Anything a ray can be tested against.
pub trait SceneObject: Send + Sync + Debug {
    /// Bounds in pseudo-Cartesian space. Moving objects are unbounded.
    fn bound_box(&self) -> WorldBox;

    /// Chart the object lives in.
    fn chart(&self) -> usize;

    /// Tests the whole ray and hands every hit to it.
    /// Returns whether the ray kept at least one hit.
    fn test_intersection<'s>(&'s self, ray: &mut Ray<'s>) -> Result<bool, CoreError>;

    /// Solids have an inside and can take part in boolean combinations.
    fn is_solid(&self) -> bool {
        false
    }

    /// Stretches of the ray inside the object, `None` for objects that are not solid.
    fn spans<'s>(&'s self, ray: &Ray<'s>) -> Result<Option<SpanList<'s>>, CoreError> {
        let _ = ray;
        Ok(None)
    }
}

/// Owner of intersection records, computes their shading attributes on demand.
pub trait Surface: Debug {
    fn surface_id(&self) -> SurfaceId;

    /// Unit normal in pseudo-Cartesian space.
    fn calc_normal(&self, intersection: &Intersection<'_>) -> WorldVector;

    fn calc_tex_uv(&self, intersection: &Intersection<'_>) -> TexturePoint;
}

/// Geometry of a primitive in its canonical local frame.
pub trait Shape: Send + Sync + Debug {
    fn local_bounds(&self) -> WorldBox;

    /// Where the line through `p0` and `p1` enters and leaves the shape.
    ///
    /// Parameters are returned as `t0 + α (t1 - t0)`, entry is the crossing met first
    /// going from `p0` to `p1`. Planar shapes report the same crossing twice.
    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit>;

    /// Every crossing of the line through `p0` and `p1` as `(α, part)`, ordered by `α`.
    ///
    /// Defaults to the entry and exit of [`Shape::tentry_texit`], with a planar crossing
    /// reported once. Shapes a line can cross more than twice override this.
    fn line_crossings(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        parallel_epsilon: FloatType,
    ) -> Vec<(FloatType, usize)> {
        let Some(hit) = self.tentry_texit(p0, p1, 0.0, 1.0, parallel_epsilon) else {
            return Vec::new();
        };
        let mut ret = vec![(hit.t_entry, hit.face_entry)];
        if hit.t_exit != hit.t_entry || hit.face_exit != hit.face_entry {
            ret.push((hit.t_exit, hit.face_exit));
        }
        ret
    }

    /// Outward normal at a point on face `part`, not necessarily normalized.
    fn normal(&self, p: &WorldPoint, part: usize) -> WorldVector;

    fn tex_uv(&self, p: &WorldPoint, part: usize) -> TexturePoint;

    fn is_solid(&self) -> bool;
}
