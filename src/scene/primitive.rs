use bon::bon;
use log::trace;

use crate::{
    error::CoreError,
    geometry::{
        AffineTransform, EPSILON, FloatType, SlabHit, SpacetimePoint, TexturePoint, WorldBox,
        WorldVector, spatial_part, with_time,
    },
    motion::ConstVelocity,
    ray::{Intersection, Ray, SpanList},
    settings::TraceSettings,
    util::{IdGenerator, SurfaceId},
};

use super::{SceneObject, Shape, Surface};

/// A shape placed into the scene.
///
/// World coordinates are `additional(transform(local))`, where the additional transform is
/// an optional adjustment imposed from outside (e.g. by an animation) on top of the
/// primitive's own placement. With uniform motion, the transforms place the shape in its
/// rest frame.
#[derive(Debug)]
pub struct Primitive {
    id: SurfaceId,
    shape: Box<dyn Shape>,
    transform: AffineTransform,
    additional_transform: Option<AffineTransform>,
    motion: Option<ConstVelocity>,
    chart: usize,
    settings: TraceSettings,
    world_bounds: WorldBox,
}

#[bon]
impl Primitive {
    #[builder]
    pub fn new<S: Shape + 'static>(
        shape: S,
        ids: &IdGenerator,
        #[builder(default)] transform: AffineTransform,
        additional_transform: Option<AffineTransform>,
        motion: Option<ConstVelocity>,
        #[builder(default)] chart: usize,
        #[builder(default)] settings: TraceSettings,
    ) -> Self {
        let mut ret = Primitive {
            id: ids.surface(),
            shape: Box::new(shape),
            transform,
            additional_transform,
            motion,
            chart,
            settings,
            world_bounds: WorldBox::infinite(),
        };
        ret.update_world_bounds();
        ret
    }
}

impl Primitive {
    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
        self.update_world_bounds();
    }

    pub fn set_additional_transform(&mut self, additional_transform: Option<AffineTransform>) {
        self.additional_transform = additional_transform;
        self.update_world_bounds();
    }

    pub fn set_motion(&mut self, motion: Option<ConstVelocity>) {
        self.motion = motion;
        self.update_world_bounds();
    }

    fn update_world_bounds(&mut self) {
        if self.motion.is_some() {
            self.world_bounds = WorldBox::infinite();
            return;
        }
        let mut bounds = self.shape.local_bounds().transform(self.transform.matrix());
        if let Some(additional) = &self.additional_transform {
            bounds = bounds.transform(additional.matrix());
        }
        self.world_bounds = bounds;
    }

    fn to_local(&self, p: &SpacetimePoint) -> SpacetimePoint {
        let mut x = spatial_part(p);
        if let Some(additional) = &self.additional_transform {
            x = additional.inverse_transform_point(&x);
        }
        with_time(p[0], &self.transform.inverse_transform_point(&x))
    }

    /// Slab test against the world bounds. Unbounded primitives are never culled.
    fn may_hit(&self, q0: &SpacetimePoint, q1: &SpacetimePoint) -> bool {
        let bounded = self
            .world_bounds
            .min
            .iter()
            .chain(self.world_bounds.max.iter())
            .all(|x| x.is_finite());
        if !bounded {
            return true;
        }
        self.world_bounds
            .tentry_texit(
                &spatial_part(q0),
                &spatial_part(q1),
                0.0,
                1.0,
                self.settings.parallel_epsilon,
            )
            .is_some_and(|hit| hit.t_exit >= 0.0 && hit.t_entry <= 1.0)
    }

    /// Segment `segment` of the ray in the canonical frame of the shape.
    fn local_segment(&self, ray: &Ray<'_>, segment: usize) -> Option<(SpacetimePoint, SpacetimePoint)> {
        if ray.chart(segment) != self.chart || ray.chart(segment + 1) != self.chart {
            return None;
        }
        let (mut q0, mut q1) = (*ray.pseudo_cart(segment), *ray.pseudo_cart(segment + 1));
        match &self.motion {
            Some(motion) => (q0, q1) = motion.transformed_segment(&q0, &q1),
            None => {
                if !self.may_hit(&q0, &q1) {
                    trace!("Segment {segment} culled by bounds of {:?}", self.id);
                    return None;
                }
            }
        }
        Some((self.to_local(&q0), self.to_local(&q1)))
    }

    fn segment_hit(&self, l0: &SpacetimePoint, l1: &SpacetimePoint) -> Option<SlabHit> {
        self.shape.tentry_texit(
            &spatial_part(l0),
            &spatial_part(l1),
            0.0,
            1.0,
            self.settings.parallel_epsilon,
        )
    }

    /// Fraction at which a crossing found on `segment` is recorded, `None` if the crossing
    /// belongs to another segment.
    ///
    /// Crossings within `dist_epsilon` of an inner vertex belong to the later segment, so a
    /// vertex lying on a face yields its crossing exactly once.
    fn claim(&self, alpha: FloatType, segment: usize, segments: usize) -> Option<FloatType> {
        let eps = self.settings.dist_epsilon;
        let lo = if segment == 0 { 0.0 } else { -eps };
        let before_end = if segment + 1 == segments {
            alpha <= 1.0
        } else {
            alpha < 1.0 - eps
        };
        (alpha >= lo && before_end).then(|| alpha.max(0.0))
    }

    fn make_intersection<'s>(
        &'s self,
        ray: &Ray<'s>,
        segment: usize,
        alpha: FloatType,
        part: usize,
        l0: &SpacetimePoint,
        l1: &SpacetimePoint,
    ) -> Intersection<'s> {
        let direction = l1 - l0;
        Intersection::on_ray(ray, segment as FloatType + alpha)
            .with_local(l0 + direction * alpha, direction)
            .with_surface(self, part)
    }
}

impl SceneObject for Primitive {
    fn bound_box(&self) -> WorldBox {
        self.world_bounds.clone()
    }

    fn chart(&self) -> usize {
        self.chart
    }

    fn test_intersection<'s>(&'s self, ray: &mut Ray<'s>) -> Result<bool, CoreError> {
        let mut found = false;
        let segments = ray.num_segments();
        for segment in 0..segments {
            if ray.finished() {
                break;
            }
            let Some((l0, l1)) = self.local_segment(ray, segment) else {
                continue;
            };
            let crossings = self.shape.line_crossings(
                &spatial_part(&l0),
                &spatial_part(&l1),
                self.settings.parallel_epsilon,
            );
            for (alpha, part) in crossings {
                let Some(alpha) = self.claim(alpha, segment, segments) else {
                    continue;
                };
                if !ray.accepts(segment as FloatType + alpha) {
                    continue;
                }
                let intersection = self.make_intersection(ray, segment, alpha, part, &l0, &l1);
                found |= ray.record(intersection);
            }
        }
        Ok(found)
    }

    fn is_solid(&self) -> bool {
        self.shape.is_solid()
    }

    /// Spans still open at the start of the ray begin at a negative distance,
    /// spans still open at its end reach to infinity. A segment starting inside while no
    /// span is open, e.g. after segments in another chart, opens one at its start.
    fn spans<'s>(&'s self, ray: &Ray<'s>) -> Result<Option<SpanList<'s>>, CoreError> {
        if !self.shape.is_solid() {
            return Ok(None);
        }

        let mut spans = SpanList::new();
        let mut open: Option<Intersection<'s>> = None;
        let segments = ray.num_segments();
        for segment in 0..segments {
            let Some((l0, l1)) = self.local_segment(ray, segment) else {
                continue;
            };
            let Some(hit) = self.segment_hit(&l0, &l1) else {
                continue;
            };

            let entry = self.claim(hit.t_entry, segment, segments);
            let exit = self.claim(hit.t_exit, segment, segments);
            if open.is_none() {
                let starts_inside = hit.t_entry < 0.0 && hit.t_exit >= 0.0;
                let inside_from = match entry {
                    Some(alpha) => Some(alpha),
                    None if segment == 0 && starts_inside => Some(hit.t_entry),
                    None if starts_inside && hit.t_exit > self.settings.dist_epsilon => Some(0.0),
                    None => None,
                };
                open = inside_from.map(|alpha| {
                    self.make_intersection(ray, segment, alpha, hit.face_entry, &l0, &l1)
                });
            }
            if let Some(alpha) = exit {
                if let Some(lo) = open.take() {
                    let hi = self.make_intersection(ray, segment, alpha, hit.face_exit, &l0, &l1);
                    spans.insert(lo, hi);
                }
            }
        }
        if let Some(lo) = open {
            spans.insert(lo, Intersection::at_distance(FloatType::INFINITY));
        }

        Ok(Some(spans))
    }
}

impl Surface for Primitive {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn calc_normal(&self, intersection: &Intersection<'_>) -> WorldVector {
        let local = spatial_part(intersection.local_point());
        let mut normal = self
            .transform
            .transform_normal(&self.shape.normal(&local, intersection.part()));
        if let Some(additional) = &self.additional_transform {
            normal = additional.transform_normal(&normal);
        }
        normal
            .try_normalize(EPSILON)
            .unwrap_or_else(WorldVector::zeros)
    }

    fn calc_tex_uv(&self, intersection: &Intersection<'_>) -> TexturePoint {
        self.shape
            .tex_uv(&spatial_part(intersection.local_point()), intersection.part())
    }
}
