use crate::{
    geometry::{BoxFace, FloatType, SlabHit, TexturePoint, WorldBox, WorldPoint, WorldVector},
    scene::Shape,
};

/// Box `[-1, 1]³`, scaled into shape by the primitive's transform.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cuboid;

impl Shape for Cuboid {
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
        self.local_bounds()
            .tentry_texit(p0, p1, t0, t1, parallel_epsilon)
    }

    fn normal(&self, _p: &WorldPoint, part: usize) -> WorldVector {
        let Some(face) = BoxFace::from_index(part) else {
            return WorldVector::zeros();
        };
        let sign = if face.is_max_side() { 1.0 } else { -1.0 };
        WorldVector::ith(face.axis(), sign)
    }

    /// The two coordinates spanning each face, mapped to `[0, 1]`.
    fn tex_uv(&self, p: &WorldPoint, part: usize) -> TexturePoint {
        let axis = BoxFace::from_index(part).map_or(2, |face| face.axis());
        let u = p[(axis + 1) % 3];
        let v = p[(axis + 2) % 3];
        TexturePoint::new((u + 1.0) / 2.0, (v + 1.0) / 2.0)
    }

    fn is_solid(&self) -> bool {
        true
    }
}
