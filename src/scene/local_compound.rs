use crate::{
    error::CoreError,
    geometry::{DIST_EPSILON, FloatType, WorldBox},
    motion::Motion,
    ray::{HitPolicy, Ray},
};

use super::SceneObject;

/// Scene objects sharing one moving rest frame.
///
/// Children are given in the rest frame, chart 0. Every ray segment is mapped into that
/// frame and tested as a ray of its own; hits are moved back onto the traced ray and
/// carry the frame and proper time of the motion at the hit.
#[derive(Debug)]
pub struct LocalCompound {
    children: Vec<Box<dyn SceneObject>>,
    motion: Motion,
    chart: usize,
}

impl LocalCompound {
    pub fn new(motion: Motion, chart: usize) -> Self {
        LocalCompound {
            children: Vec::new(),
            motion,
            chart,
        }
    }

    pub fn add(&mut self, child: impl SceneObject + 'static) -> &mut Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn children(&self) -> &[Box<dyn SceneObject>] {
        &self.children
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }
}

impl SceneObject for LocalCompound {
    fn bound_box(&self) -> WorldBox {
        WorldBox::infinite()
    }

    fn chart(&self) -> usize {
        self.chart
    }

    fn test_intersection<'s>(&'s self, ray: &mut Ray<'s>) -> Result<bool, CoreError> {
        let mut found = false;
        let mut hit_at_vertex = false;
        let segments = ray.num_segments();
        for segment in 0..segments {
            if ray.finished() {
                break;
            }
            let after_vertex = std::mem::take(&mut hit_at_vertex);
            if ray.chart(segment) != self.chart || ray.chart(segment + 1) != self.chart {
                continue;
            }
            let Some(local) = self.motion.local_segment(ray, segment) else {
                continue;
            };

            let mut local_ray = Ray::local(vec![local.p0, local.p1], HitPolicy::All)?;
            for child in &self.children {
                child.test_intersection(&mut local_ray)?;
            }

            let last = segment + 1 == segments;
            for hit in local_ray.take_hits() {
                let alpha = hit.dist();
                // A crossing at the shared vertex was already recorded on the previous segment
                if !(0.0..=1.0).contains(&alpha) || (after_vertex && alpha < DIST_EPSILON) {
                    continue;
                }
                let dist = segment as FloatType + alpha;
                if !ray.accepts(dist) {
                    continue;
                }
                hit_at_vertex |= !last && alpha >= 1.0 - DIST_EPSILON;
                let mut hit =
                    hit.with_global(dist, ray.point_at(dist), ray.segment_direction(segment));
                if let Some(tetrad) = self.motion.tetrad_at(&local, alpha)? {
                    let proper_time = local.p0[0] + alpha * (local.p1[0] - local.p0[0]);
                    hit = hit.with_tetrad(tetrad, proper_time);
                }
                found |= ray.record(hit);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{
        geometry::{SpacetimePoint, WorldVector},
        metric::{FrameType, Metric, Minkowski},
        motion::{ConstVelocity, Worldline},
        scene::{Primitive, primitives::Cuboid},
        settings::TraceSettings,
        tetrad::LocalTetrad,
        util::IdGenerator,
    };
    use assert2::{assert, let_assert};

    fn sweep<'s>(t: FloatType, x: FloatType, policy: HitPolicy) -> Ray<'s> {
        Ray::builder()
            .points(vec![
                SpacetimePoint::new(t, x, -3.0, 0.0),
                SpacetimePoint::new(t, x, 3.0, 0.0),
            ])
            .metric(&Minkowski)
            .policy(policy)
            .build()
            .unwrap()
    }

    fn resting_worldline() -> Worldline {
        let metric: Arc<dyn Metric> = Arc::new(Minkowski);
        let frames = (0..=10)
            .map(|t| {
                let t = t as FloatType;
                LocalTetrad::natural(
                    metric.clone(),
                    SpacetimePoint::new(t, 0.0, 0.0, 0.0),
                    FrameType::Static,
                )
                .unwrap()
                .with_proper_time(t)
            })
            .collect();
        Worldline::new(frames, 1.0, &TraceSettings::default()).unwrap()
    }

    /// Frames moving along x at 0.6 c, `γ = 1.25`, through the origin at time 0.
    fn moving_worldline() -> Worldline {
        let metric: Arc<dyn Metric> = Arc::new(Minkowski);
        let frames = (0..=10)
            .map(|t| {
                let t = t as FloatType;
                let mut frame = LocalTetrad::natural(
                    metric.clone(),
                    SpacetimePoint::new(t, 0.6 * t, 0.0, 0.0),
                    FrameType::Static,
                )
                .unwrap();
                frame.adjust_tetrad(&WorldVector::new(0.6, 0.0, 0.0)).unwrap();
                frame.with_proper_time(0.8 * t)
            })
            .collect();
        Worldline::new(frames, 1.0, &TraceSettings::default()).unwrap()
    }

    #[test]
    fn uniformly_moving_box() {
        let ids = IdGenerator::new();
        let mut boost = ConstVelocity::new();
        boost.add_boost(&WorldVector::new(0.5, 0.0, 0.0)).unwrap();
        let mut compound = LocalCompound::new(Motion::ConstVelocity(boost), 0);
        compound.add(Primitive::builder().shape(Cuboid).ids(&ids).build());

        let mut ray = sweep(4.0, 2.0, HitPolicy::All);
        let_assert!(Ok(true) = compound.test_intersection(&mut ray));
        let dists: Vec<_> = ray.hits().iter().map(|h| h.dist()).collect();
        assert!(dists.len() == 2);
        assert!((dists[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((dists[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!(ray.hits()[0].tetrad().is_none());
        assert!((ray.hits()[0].point()[2] + 1.0).abs() < 1e-12);

        let mut behind = sweep(4.0, 0.0, HitPolicy::All);
        let_assert!(Ok(false) = compound.test_intersection(&mut behind));
    }

    #[test]
    fn worldline_hits_carry_frame_and_proper_time() {
        let ids = IdGenerator::new();
        let mut compound = LocalCompound::new(Motion::Worldline(resting_worldline()), 0);
        compound.add(Primitive::builder().shape(Cuboid).ids(&ids).build());

        let mut ray = sweep(5.0, 0.0, HitPolicy::Closest);
        let_assert!(Ok(true) = compound.test_intersection(&mut ray));
        let_assert!(Some(hit) = ray.closest());
        assert!((hit.dist() - 1.0 / 3.0).abs() < 1e-12);
        let_assert!(Some(proper_time) = hit.proper_time());
        assert!((proper_time - 5.0).abs() < 1e-12);
        let_assert!(Some(tetrad) = hit.tetrad());
        assert!((tetrad.time() - 5.0).abs() < 1e-12);
        assert!(hit.normal() == -WorldVector::y());
    }

    #[test]
    fn distant_segments_are_culled() {
        let ids = IdGenerator::new();
        let mut compound = LocalCompound::new(Motion::Worldline(resting_worldline()), 0);
        compound.add(Primitive::builder().shape(Cuboid).ids(&ids).build());

        let mut ray = sweep(5.0, 100.0, HitPolicy::All);
        let_assert!(Ok(false) = compound.test_intersection(&mut ray));
    }

    #[test]
    fn moving_worldline_dilates_proper_time() {
        let ids = IdGenerator::new();
        let mut compound = LocalCompound::new(Motion::Worldline(moving_worldline()), 0);
        compound.add(Primitive::builder().shape(Cuboid).ids(&ids).build());

        // At time 5 the box center has reached x = 3, where it has aged 4
        let mut ray = sweep(5.0, 3.0, HitPolicy::Closest);
        let_assert!(Ok(true) = compound.test_intersection(&mut ray));
        let_assert!(Some(hit) = ray.closest());
        assert!((hit.dist() - 1.0 / 3.0).abs() < 1e-9);
        let_assert!(Some(proper_time) = hit.proper_time());
        assert!((proper_time - 4.0).abs() < 1e-9);
        let_assert!(Some(tetrad) = hit.tetrad());
        assert!((tetrad.time() - 5.0).abs() < 1e-9);
        assert!((tetrad.velocity()[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn moving_worldline_contracts_the_box() {
        let ids = IdGenerator::new();
        let mut compound = LocalCompound::new(Motion::Worldline(moving_worldline()), 0);
        compound.add(Primitive::builder().shape(Cuboid).ids(&ids).build());

        let mut ray = Ray::builder()
            .points(vec![
                SpacetimePoint::new(5.0, 0.0, 0.0, 0.0),
                SpacetimePoint::new(5.0, 6.0, 0.0, 0.0),
            ])
            .metric(&Minkowski)
            .policy(HitPolicy::All)
            .build()
            .unwrap();
        let_assert!(Ok(true) = compound.test_intersection(&mut ray));
        let hits = ray.hits();
        assert!(hits.len() == 2);
        assert!((hits[0].dist() - 11.0 / 30.0).abs() < 1e-9);
        assert!((hits[1].dist() - 19.0 / 30.0).abs() < 1e-9);
        // Two units long at rest, 2 / γ in the chart
        assert!((hits[0].point()[1] - 2.2).abs() < 1e-9);
        assert!((hits[1].point()[1] - 3.8).abs() < 1e-9);

        // τ = γ (t - β x) at the events of entry and exit
        let_assert!(Some(entry_time) = hits[0].proper_time());
        let_assert!(Some(exit_time) = hits[1].proper_time());
        assert!((entry_time - 4.6).abs() < 1e-9);
        assert!((exit_time - 3.4).abs() < 1e-9);
    }
}
