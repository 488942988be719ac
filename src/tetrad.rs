//! Local reference frames attached to spacetime points.

use std::sync::Arc;

use nalgebra::Matrix4;

use crate::{
    error::CoreError,
    geometry::{EPSILON, FloatType, FourVector, SpacetimePoint, WorldVector},
    metric::{FrameType, Metric, natural_metric},
};

/// Components in which the tetrad's vectors are currently stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Representation {
    Coordinates,
    Natural(FrameType),
}

/// Conservative reach of an object riding on a tetrad, used to cull ray segments.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpacetimeBound {
    pub max_time: FloatType,
    pub max_distance: FloatType,
}

impl SpacetimeBound {
    pub fn union(&self, other: &SpacetimeBound) -> SpacetimeBound {
        SpacetimeBound {
            max_time: self.max_time.max(other.max_time),
            max_distance: self.max_distance.max(other.max_distance),
        }
    }
}

/// Four basis vectors `e0..e3` at a spacetime point, `e0` timelike.
#[derive(Clone, Debug)]
pub struct LocalTetrad {
    metric: Arc<dyn Metric>,
    position: SpacetimePoint,
    /// Basis vectors as columns, in `representation` components.
    basis: Matrix4<FloatType>,
    /// Basis vectors as columns, always in coordinate components.
    coord_basis: Matrix4<FloatType>,
    inverse_coord_basis: Matrix4<FloatType>,
    representation: Representation,
    proper_time: FloatType,
    velocity: FourVector,
    acceleration: FourVector,
    bound: Option<SpacetimeBound>,
}

impl LocalTetrad {
    pub fn new(
        metric: Arc<dyn Metric>,
        position: SpacetimePoint,
        basis: Matrix4<FloatType>,
        representation: Representation,
    ) -> Result<LocalTetrad, CoreError> {
        if metric.break_condition(&position) {
            return Err(CoreError::InvalidSpacetimePoint(position));
        }
        let mut ret = LocalTetrad {
            metric,
            position,
            basis,
            coord_basis: Matrix4::identity(),
            inverse_coord_basis: Matrix4::identity(),
            representation,
            proper_time: 0.0,
            velocity: basis.column(0).into_owned(),
            acceleration: FourVector::zeros(),
            bound: None,
        };
        ret.update_coord_basis()?;
        Ok(ret)
    }

    /// Tetrad equal to the metric's natural frame of the given type.
    pub fn natural(
        metric: Arc<dyn Metric>,
        position: SpacetimePoint,
        frame: FrameType,
    ) -> Result<LocalTetrad, CoreError> {
        Self::new(
            metric,
            position,
            Matrix4::identity(),
            Representation::Natural(frame),
        )
    }

    pub fn with_proper_time(mut self, proper_time: FloatType) -> Self {
        self.proper_time = proper_time;
        self
    }

    pub fn with_acceleration(mut self, acceleration: FourVector) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_spacetime_bound(mut self, bound: SpacetimeBound) -> Self {
        self.bound = Some(bound);
        self
    }

    pub fn metric(&self) -> &Arc<dyn Metric> {
        &self.metric
    }

    pub fn position(&self) -> &SpacetimePoint {
        &self.position
    }

    pub fn time(&self) -> FloatType {
        self.position[0]
    }

    /// Basis vector `i`, in the current representation.
    pub fn e(&self, i: usize) -> FourVector {
        self.basis.column(i).into_owned()
    }

    pub fn coord_basis(&self) -> &Matrix4<FloatType> {
        &self.coord_basis
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn proper_time(&self) -> FloatType {
        self.proper_time
    }

    pub fn velocity(&self) -> &FourVector {
        &self.velocity
    }

    pub fn acceleration(&self) -> &FourVector {
        &self.acceleration
    }

    pub fn spacetime_bound(&self) -> Option<&SpacetimeBound> {
        self.bound.as_ref()
    }

    pub fn chart(&self) -> usize {
        self.metric.trans_to_pseudo_cart(&self.position).0
    }

    /// Bound for an object of spatial half size `half_size` over a time box of `time_box_size`.
    /// Nothing attached to the frame moves faster than light, so the reachable distance
    /// grows by at most the time box size.
    pub fn set_spacetime_bound(&mut self, half_size: FloatType, time_box_size: FloatType) {
        self.bound = Some(SpacetimeBound {
            max_time: time_box_size,
            max_distance: half_size + time_box_size,
        });
    }

    /// Metric used for scalar products of vectors in the current representation.
    fn local_metric(&self) -> Matrix4<FloatType> {
        match self.representation {
            Representation::Coordinates => self.metric.coefficients(&self.position),
            Representation::Natural(_) => natural_metric(self.metric.sign()),
        }
    }

    fn to_coordinates(&self, v: &FourVector) -> FourVector {
        match self.representation {
            Representation::Coordinates => *v,
            Representation::Natural(frame) => self.metric.local_to_coord(&self.position, v, frame),
        }
    }

    fn update_coord_basis(&mut self) -> Result<(), CoreError> {
        let columns: [FourVector; 4] = std::array::from_fn(|i| self.to_coordinates(&self.e(i)));
        self.coord_basis = Matrix4::from_columns(&columns);
        self.inverse_coord_basis = self
            .coord_basis
            .try_inverse()
            .filter(|inv| inv.iter().all(|x| x.is_finite()))
            .ok_or(CoreError::DegenerateBasis)?;
        Ok(())
    }

    /// Aligns `e0` with the 4-velocity of coordinate 3-velocity `velocity` and
    /// re-orthonormalizes `e1..e3` against it.
    ///
    /// The velocity is given in the current representation.
    pub fn adjust_tetrad(&mut self, velocity: &WorldVector) -> Result<(), CoreError> {
        let g = self.local_metric();
        let sign = self.metric.sign();

        // g(u, u) = sign with u = u0 (1, v) is quadratic in u0 with no linear term
        let direction = FourVector::new(1.0, velocity.x, velocity.y, velocity.z);
        let q = direction.dot(&(g * direction));
        let u0_squared = sign / q;
        if !u0_squared.is_finite() || u0_squared <= 0.0 {
            return Err(CoreError::InvalidVelocity(velocity.norm()));
        }
        let u = direction * u0_squared.sqrt();

        let product = |a: &FourVector, b: &FourVector| a.dot(&(g * b));

        let mut columns: [FourVector; 4] = std::array::from_fn(|i| self.e(i));
        columns[0] = u;
        for i in 1..4 {
            let mut e = columns[i];
            for other in &columns[..i] {
                e -= other * (product(&e, other) / product(other, other));
            }
            let norm = product(&e, &e);
            if norm.abs() < EPSILON {
                return Err(CoreError::DegenerateBasis);
            }
            columns[i] = e / norm.abs().sqrt();
        }

        self.basis = Matrix4::from_columns(&columns);
        self.velocity = u;
        self.update_coord_basis()
    }

    /// Switches the stored components to coordinates or to the natural frame `frame`.
    pub fn transform_tetrad(&mut self, to_coords: bool, frame: FrameType) {
        let target = if to_coords {
            Representation::Coordinates
        } else {
            Representation::Natural(frame)
        };
        if target == self.representation {
            return;
        }

        let convert = |v: &FourVector| {
            let coords = self.to_coordinates(v);
            match target {
                Representation::Coordinates => coords,
                Representation::Natural(frame) => {
                    self.metric.coord_to_local(&self.position, &coords, frame)
                }
            }
        };

        let columns: [FourVector; 4] = std::array::from_fn(|i| convert(&self.e(i)));
        let velocity = convert(&self.velocity);
        let acceleration = convert(&self.acceleration);

        self.basis = Matrix4::from_columns(&columns);
        self.velocity = velocity;
        self.acceleration = acceleration;
        self.representation = target;
    }

    /// Coordinates of `point` relative to this tetrad.
    pub fn trans_to_loc_tetrad(&self, point: &SpacetimePoint) -> SpacetimePoint {
        let diff = self.metric.point_diff(point, &self.position);
        SpacetimePoint::from(self.inverse_coord_basis * diff)
    }

    /// Inverse of [`Self::trans_to_loc_tetrad`].
    pub fn trans_to_coords(&self, local: &SpacetimePoint) -> SpacetimePoint {
        self.position + self.coord_basis * local.coords
    }

    pub fn local_to_coord_vector(&self, v: &FourVector) -> FourVector {
        self.coord_basis * v
    }

    pub fn coord_to_local_vector(&self, v: &FourVector) -> FourVector {
        self.inverse_coord_basis * v
    }

    /// Linear blend of two tetrads, `frac = 0` gives `lt0`.
    ///
    /// The result uses the representation of `lt0` and the union of both spacetime bounds.
    pub fn interpolated(
        lt0: &LocalTetrad,
        lt1: &LocalTetrad,
        frac: FloatType,
    ) -> Result<LocalTetrad, CoreError> {
        let (chart0, chart1) = (lt0.chart(), lt1.chart());
        if chart0 != chart1 {
            return Err(CoreError::ChartMismatch {
                expected: chart0,
                found: chart1,
            });
        }

        let mut lt1 = lt1.clone();
        match lt0.representation {
            Representation::Coordinates => lt1.transform_tetrad(true, FrameType::Static),
            Representation::Natural(frame) => lt1.transform_tetrad(false, frame),
        }

        let lerp = |a: &FourVector, b: &FourVector| a + (b - a) * frac;

        let position = lt0.position + lt0.metric.point_diff(&lt1.position, &lt0.position) * frac;
        let basis = lt0.basis + (lt1.basis - lt0.basis) * frac;

        let mut ret = LocalTetrad::new(lt0.metric.clone(), position, basis, lt0.representation)?;
        ret.proper_time = lt0.proper_time + (lt1.proper_time - lt0.proper_time) * frac;
        ret.velocity = lerp(&lt0.velocity, &lt1.velocity);
        ret.acceleration = lerp(&lt0.acceleration, &lt1.acceleration);
        ret.bound = match (lt0.bound, lt1.bound) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };
        Ok(ret)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::test::SpacetimePointWrapper,
        metric::{CoordType, Minkowski, Schwarzschild},
    };
    use assert2::{assert, let_assert};
    use test_strategy::proptest;

    fn boosted() -> LocalTetrad {
        let mut lt = LocalTetrad::natural(
            Arc::new(Minkowski),
            SpacetimePoint::new(1.0, 2.0, -3.0, 0.5),
            FrameType::Static,
        )
        .unwrap();
        lt.adjust_tetrad(&WorldVector::new(0.3, 0.2, -0.4)).unwrap();
        lt
    }

    fn assert_orthonormal(lt: &LocalTetrad) {
        let g = lt.local_metric();
        let eta = natural_metric(lt.metric().sign());
        for i in 0..4 {
            for j in 0..4 {
                let product = lt.e(i).dot(&(g * lt.e(j)));
                assert!((product - eta[(i, j)]).abs() < 1e-9, "g(e{i}, e{j}) = {product}");
            }
        }
    }

    #[proptest]
    fn round_trip_through_local_coordinates(p: SpacetimePointWrapper) {
        let lt = boosted();
        let back = lt.trans_to_coords(&lt.trans_to_loc_tetrad(&p));
        assert!((back - *p).norm() < 1e-9 * (1.0 + p.coords.norm()));
    }

    #[test]
    fn round_trip_in_curved_spacetime() {
        let mut lt = LocalTetrad::natural(
            Arc::new(Schwarzschild::new(1.0)),
            SpacetimePoint::new(0.0, 6.0, 1.2, 3.0),
            FrameType::Static,
        )
        .unwrap();
        lt.adjust_tetrad(&WorldVector::new(0.1, 0.0, 0.2)).unwrap();
        let p = SpacetimePoint::new(0.3, 6.2, 1.1, 3.1);
        let back = lt.trans_to_coords(&lt.trans_to_loc_tetrad(&p));
        assert!((back - p).norm() < 1e-9);
    }

    #[test]
    fn adjusted_tetrad_is_orthonormal() {
        let lt = boosted();
        assert_orthonormal(&lt);
        assert!(lt.e(0)[0] > 1.0);
        assert!((lt.velocity() - lt.e(0)).norm() < 1e-12);
    }

    #[test]
    fn adjust_in_coordinate_representation() {
        let mut lt = LocalTetrad::natural(
            Arc::new(Schwarzschild::new(1.0)),
            SpacetimePoint::new(0.0, 4.0, 1.0, 0.0),
            FrameType::Static,
        )
        .unwrap();
        lt.transform_tetrad(true, FrameType::Static);
        lt.adjust_tetrad(&WorldVector::new(0.1, 0.0, 0.05)).unwrap();
        assert_orthonormal(&lt);
    }

    #[test]
    fn superluminal_velocity_is_rejected() {
        let mut lt = boosted();
        let_assert!(
            Err(CoreError::InvalidVelocity(_)) = lt.adjust_tetrad(&WorldVector::new(1.0, 0.5, 0.0))
        );
    }

    #[test]
    fn construction_inside_horizon_fails() {
        let result = LocalTetrad::natural(
            Arc::new(Schwarzschild::new(2.0)),
            SpacetimePoint::new(0.0, 1.0, 1.0, 0.0),
            FrameType::Static,
        );
        let_assert!(Err(CoreError::InvalidSpacetimePoint(_)) = result);
    }

    #[test]
    fn degenerate_basis_fails() {
        let result = LocalTetrad::new(
            Arc::new(Minkowski),
            SpacetimePoint::origin(),
            Matrix4::zeros(),
            Representation::Coordinates,
        );
        let_assert!(Err(CoreError::DegenerateBasis) = result);
    }

    #[test]
    fn representation_round_trip() {
        let mut lt = LocalTetrad::natural(
            Arc::new(Schwarzschild::new(1.0)),
            SpacetimePoint::new(0.0, 5.0, 0.8, 1.0),
            FrameType::Static,
        )
        .unwrap();
        let coord_basis = *lt.coord_basis();

        lt.transform_tetrad(true, FrameType::Static);
        assert!(lt.representation() == Representation::Coordinates);
        assert!((lt.basis - coord_basis).norm() < 1e-12);

        lt.transform_tetrad(false, FrameType::Falling);
        lt.transform_tetrad(false, FrameType::Static);
        assert!((lt.basis - Matrix4::identity()).norm() < 1e-9);
        assert!((lt.coord_basis() - coord_basis).norm() < 1e-12);
    }

    #[test]
    fn interpolation_blends_and_unions_bounds() {
        let metric: Arc<dyn Metric> = Arc::new(Minkowski);
        let lt0 = LocalTetrad::natural(metric.clone(), SpacetimePoint::origin(), FrameType::Static)
            .unwrap()
            .with_proper_time(0.0)
            .with_spacetime_bound(SpacetimeBound {
                max_time: 1.0,
                max_distance: 4.0,
            });
        let lt1 = LocalTetrad::natural(
            metric,
            SpacetimePoint::new(2.0, 1.0, 0.0, 0.0),
            FrameType::Static,
        )
        .unwrap()
        .with_proper_time(1.5)
        .with_spacetime_bound(SpacetimeBound {
            max_time: 2.0,
            max_distance: 3.0,
        });

        let_assert!(Ok(mid) = LocalTetrad::interpolated(&lt0, &lt1, 0.25));
        assert!((mid.position() - SpacetimePoint::new(0.5, 0.25, 0.0, 0.0)).norm() < 1e-12);
        assert!((mid.proper_time() - 0.375).abs() < 1e-12);
        assert!(
            mid.spacetime_bound()
                == Some(&SpacetimeBound {
                    max_time: 2.0,
                    max_distance: 4.0
                })
        );
    }

    #[test]
    fn interpolation_across_the_azimuth_seam() {
        let metric: Arc<dyn Metric> = Arc::new(Schwarzschild::new(1.0));
        let lt0 = LocalTetrad::natural(
            metric.clone(),
            SpacetimePoint::new(0.0, 5.0, 1.0, 6.2),
            FrameType::Static,
        )
        .unwrap();
        let lt1 = LocalTetrad::natural(
            metric,
            SpacetimePoint::new(0.0, 5.0, 1.0, 0.1),
            FrameType::Static,
        )
        .unwrap();
        let_assert!(Ok(mid) = LocalTetrad::interpolated(&lt0, &lt1, 0.5));
        let expected = 6.2 + (0.1 + std::f64::consts::TAU - 6.2) / 2.0;
        assert!((mid.position()[3] - expected).abs() < 1e-12);
    }

    /// Flat space split into two charts at `x = 0`.
    #[derive(Debug)]
    struct SplitCharts;

    impl Metric for SplitCharts {
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
            ((pos[1] > 0.0) as usize, *pos)
        }
        fn coord_type(&self) -> CoordType {
            CoordType::Cartesian
        }
    }

    #[test]
    fn interpolation_between_charts_fails() {
        let metric: Arc<dyn Metric> = Arc::new(SplitCharts);
        let lt0 = LocalTetrad::natural(
            metric.clone(),
            SpacetimePoint::new(0.0, -1.0, 0.0, 0.0),
            FrameType::Static,
        )
        .unwrap();
        let lt1 = LocalTetrad::natural(
            metric,
            SpacetimePoint::new(0.0, 1.0, 0.0, 0.0),
            FrameType::Static,
        )
        .unwrap();
        let_assert!(
            Err(CoreError::ChartMismatch {
                expected: 0,
                found: 1
            }) = LocalTetrad::interpolated(&lt0, &lt1, 0.5)
        );
    }
}
