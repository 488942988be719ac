use log::debug;

use crate::{
    error::CoreError,
    geometry::{WorldBox, octree::Octree, spatial_part},
    ray::{Ray, SpanList},
    settings::TraceSettings,
};

use super::{SceneObject, compound::union_spans};

/// Scene objects indexed by a regular octree over their common bounds.
///
/// The tree lives in the chart of the first child. Children with unbounded boxes (planes,
/// moving objects) or from other charts cannot be placed into it and are tested for every ray.
#[derive(Debug)]
pub struct OctreeCompound {
    children: Vec<Box<dyn SceneObject>>,
    octree: Option<Octree<usize>>,
    unindexed: Vec<usize>,
    bounds: WorldBox,
    chart: usize,
    settings: TraceSettings,
}

impl OctreeCompound {
    pub fn new(children: Vec<Box<dyn SceneObject>>, settings: &TraceSettings) -> Self {
        let chart = children.first().map_or(0, |child| child.chart());
        let indexed =
            |child: &dyn SceneObject| child.chart() == chart && is_finite(&child.bound_box());

        let mut bounded = WorldBox::empty();
        let mut unindexed = Vec::new();
        let mut bounds = WorldBox::empty();
        for (i, child) in children.iter().enumerate() {
            let child_bounds = child.bound_box();
            bounds = bounds + child_bounds.clone();
            if indexed(child.as_ref()) {
                bounded = bounded + child_bounds;
            } else {
                unindexed.push(i);
            }
        }

        let octree = (!bounded.is_empty()).then(|| {
            let mut octree = Octree::build(bounded, settings.octree_depth);
            for (i, child) in children.iter().enumerate() {
                if indexed(child.as_ref()) {
                    octree.insert(i, &child.bound_box());
                }
            }
            let (depth, fill) = octree.statistics();
            debug!(
                "Octree over {} children, {} unindexed; leaf depth {depth}, items per leaf {fill}",
                children.len(),
                unindexed.len()
            );
            octree
        });

        OctreeCompound {
            chart,
            children,
            octree,
            unindexed,
            bounds,
            settings: *settings,
        }
    }

    pub fn children(&self) -> &[Box<dyn SceneObject>] {
        &self.children
    }

    pub fn octree(&self) -> Option<&Octree<usize>> {
        self.octree.as_ref()
    }

    /// Indices of the children the ray may hit, in ascending order.
    pub fn candidates(&self, ray: &Ray<'_>) -> Vec<usize> {
        let mut ret = self.unindexed.clone();
        if let Some(octree) = &self.octree {
            for segment in 0..ray.num_segments() {
                if ray.chart(segment) != self.chart || ray.chart(segment + 1) != self.chart {
                    continue;
                }
                let p0 = spatial_part(ray.pseudo_cart(segment));
                let p1 = spatial_part(ray.pseudo_cart(segment + 1));
                for leaf in octree.segment_leaves(&p0, &p1, self.settings.parallel_epsilon) {
                    ret.extend_from_slice(&octree.node_at(leaf).items);
                }
            }
        }
        ret.sort_unstable();
        ret.dedup();
        ret
    }
}

fn is_finite(bounds: &WorldBox) -> bool {
    !bounds.is_empty()
        && bounds
            .min
            .iter()
            .chain(bounds.max.iter())
            .all(|x| x.is_finite())
}

impl SceneObject for OctreeCompound {
    fn bound_box(&self) -> WorldBox {
        self.bounds.clone()
    }

    fn chart(&self) -> usize {
        self.chart
    }

    fn test_intersection<'s>(&'s self, ray: &mut Ray<'s>) -> Result<bool, CoreError> {
        let mut found = false;
        for i in self.candidates(ray) {
            if ray.finished() {
                break;
            }
            found |= self.children[i].test_intersection(ray)?;
        }
        Ok(found)
    }

    fn is_solid(&self) -> bool {
        !self.children.is_empty() && self.children.iter().all(|child| child.is_solid())
    }

    fn spans<'s>(&'s self, ray: &Ray<'s>) -> Result<Option<SpanList<'s>>, CoreError> {
        if !self.is_solid() {
            return Ok(None);
        }
        union_spans(&self.children, ray)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{AffineTransform, FloatType, FourVector, SpacetimePoint, WorldVector},
        metric::{CoordType, FrameType, Metric, Minkowski},
        ray::HitPolicy,
        scene::{
            Compound, Primitive,
            primitives::{Cuboid, Plane},
        },
        util::IdGenerator,
    };
    use assert2::{assert, let_assert};
    use nalgebra::Matrix4;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn cube_at(ids: &IdGenerator, center: WorldVector, size: FloatType) -> Box<dyn SceneObject> {
        let mut transform = AffineTransform::identity();
        transform
            .scale(&WorldVector::repeat(size))
            .translate(&center);
        Box::new(
            Primitive::builder()
                .shape(Cuboid)
                .ids(ids)
                .transform(transform)
                .build(),
        )
    }

    fn ray<'s>(from: [FloatType; 3], to: [FloatType; 3], policy: HitPolicy) -> Ray<'s> {
        Ray::builder()
            .points(vec![
                SpacetimePoint::new(0.0, from[0], from[1], from[2]),
                SpacetimePoint::new(1.0, to[0], to[1], to[2]),
            ])
            .metric(&Minkowski)
            .policy(policy)
            .build()
            .unwrap()
    }

    #[test]
    fn candidates_follow_the_ray() {
        let ids = IdGenerator::new();
        let children = vec![
            cube_at(&ids, WorldVector::new(-5.0, -5.0, -5.0), 1.0),
            cube_at(&ids, WorldVector::new(5.0, 5.0, 5.0), 1.0),
            cube_at(&ids, WorldVector::new(5.0, -5.0, -5.0), 1.0),
        ];
        let compound = OctreeCompound::new(children, &TraceSettings::default());
        let_assert!(Some(octree) = compound.octree());
        assert!(octree.depth() == 3);

        let along_bottom = ray([-10.0, -5.0, -5.0], [10.0, -5.0, -5.0], HitPolicy::All);
        assert!(compound.candidates(&along_bottom) == vec![0, 2]);
        let diagonal = ray([6.0, 6.0, -10.0], [6.0, 6.0, 10.0], HitPolicy::All);
        assert!(compound.candidates(&diagonal) == vec![1]);
    }

    #[test]
    fn unbounded_children_are_always_candidates() {
        let ids = IdGenerator::new();
        let children = vec![
            cube_at(&ids, WorldVector::new(0.0, 0.0, 0.0), 1.0),
            Box::new(Primitive::builder().shape(Plane).ids(&ids).build()) as Box<dyn SceneObject>,
        ];
        let compound = OctreeCompound::new(children, &TraceSettings::default());
        assert!(compound.unindexed == vec![1]);
        let far = ray([50.0, 50.0, 1.0], [50.0, 50.0, -1.0], HitPolicy::All);
        assert!(compound.candidates(&far) == vec![1]);
    }

    #[test]
    fn only_unbounded_children() {
        let ids = IdGenerator::new();
        let children = vec![
            Box::new(Primitive::builder().shape(Plane).ids(&ids).build()) as Box<dyn SceneObject>,
        ];
        let compound = OctreeCompound::new(children, &TraceSettings::default());
        assert!(compound.octree().is_none());
        let mut down = ray([0.0, 0.0, 1.0], [0.0, 0.0, -1.0], HitPolicy::Closest);
        let_assert!(Ok(true) = compound.test_intersection(&mut down));
        assert!(down.closest().map(|h| h.dist()) == Some(0.5));
    }

    /// Flat space mapped entirely into chart 1.
    #[derive(Debug)]
    struct SecondChart;

    impl Metric for SecondChart {
        fn coefficients(&self, pos: &SpacetimePoint) -> Matrix4<FloatType> {
            Minkowski.coefficients(pos)
        }
        fn sign(&self) -> FloatType {
            Minkowski.sign()
        }
        fn break_condition(&self, pos: &SpacetimePoint) -> bool {
            Minkowski.break_condition(pos)
        }
        fn local_to_coord(&self, _pos: &SpacetimePoint, v: &FourVector, _frame: FrameType) -> FourVector {
            *v
        }
        fn coord_to_local(&self, _pos: &SpacetimePoint, v: &FourVector, _frame: FrameType) -> FourVector {
            *v
        }
        fn calc_sep_dist(&self, p: &SpacetimePoint, q: &SpacetimePoint) -> (FloatType, FloatType) {
            Minkowski.calc_sep_dist(p, q)
        }
        fn trans_to_pseudo_cart(&self, pos: &SpacetimePoint) -> (usize, SpacetimePoint) {
            (1, *pos)
        }
        fn coord_type(&self) -> CoordType {
            CoordType::Cartesian
        }
    }

    #[test]
    fn children_from_other_charts_are_tested() {
        let ids = IdGenerator::new();
        let mut transform = AffineTransform::identity();
        transform.translate(&WorldVector::new(10.0, 0.0, 0.0));
        let children: Vec<Box<dyn SceneObject>> = vec![
            cube_at(&ids, WorldVector::zeros(), 1.0),
            Box::new(
                Primitive::builder()
                    .shape(Cuboid)
                    .ids(&ids)
                    .transform(transform)
                    .chart(1)
                    .build(),
            ),
        ];
        let compound = OctreeCompound::new(children, &TraceSettings::default());
        assert!(compound.chart() == 0);
        assert!(compound.unindexed == vec![1]);

        let mut in_second_chart = Ray::builder()
            .points(vec![
                SpacetimePoint::new(0.0, 8.0, 0.0, 0.0),
                SpacetimePoint::new(1.0, 12.0, 0.0, 0.0),
            ])
            .metric(&SecondChart)
            .policy(HitPolicy::Closest)
            .build()
            .unwrap();
        let_assert!(Ok(true) = compound.test_intersection(&mut in_second_chart));
        let_assert!(Some(hit) = in_second_chart.closest());
        assert!((hit.dist() - 0.25).abs() < 1e-12);

        let mut in_first_chart = ray([-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], HitPolicy::Closest);
        let_assert!(Ok(true) = compound.test_intersection(&mut in_first_chart));
        assert!(in_first_chart.closest().map(|h| h.dist()) == Some(0.25));
    }

    /// The octree must never change which hit is the closest one.
    #[test]
    fn agrees_with_flat_compound() {
        let ids = IdGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);
        let random_cube = |rng: &mut StdRng| {
            let center = WorldVector::from_fn(|_, _| rng.random_range(-20.0..20.0));
            cube_at(&ids, center, rng.random_range(0.2..2.0))
        };
        let cubes: Vec<_> = (0..40).map(|_| random_cube(&mut rng)).collect();
        let more_cubes: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..40).map(|_| random_cube(&mut rng)).collect()
        };
        let indexed = OctreeCompound::new(cubes, &TraceSettings::default());
        let flat: Compound = more_cubes.into_iter().collect();

        for _ in 0..200 {
            let from: [FloatType; 3] = std::array::from_fn(|_| rng.random_range(-30.0..30.0));
            let to: [FloatType; 3] = std::array::from_fn(|_| rng.random_range(-30.0..30.0));
            let mut a = ray(from, to, HitPolicy::Closest);
            let mut b = ray(from, to, HitPolicy::Closest);
            let found_a = indexed.test_intersection(&mut a).unwrap();
            let found_b = flat.test_intersection(&mut b).unwrap();
            assert!(found_a == found_b);
            assert!(a.closest().map(|h| h.dist()) == b.closest().map(|h| h.dist()));
        }
    }
}
