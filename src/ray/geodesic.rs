//! Sources of ray polylines.

use std::{fmt::Debug, sync::Arc};

use crate::{
    error::CoreError,
    geometry::{FloatType, FourVector, SpacetimePoint},
    metric::Metric,
    tetrad::{LocalTetrad, Representation},
};

/// Raw output of a geodesic integration.
#[derive(Clone, Debug)]
pub struct Polyline {
    pub points: Vec<SpacetimePoint>,
    pub tangents: Option<Vec<FourVector>>,
    /// Tetrads transported along the curve, one per point.
    pub tetrads: Option<Vec<LocalTetrad>>,
}

pub trait GeodesicSolver: Send + Sync + Debug {
    /// Integrates from `start` along `direction` for at most `max_points` points,
    /// transporting `tetrad` along if one is given.
    fn solve(
        &self,
        start: &SpacetimePoint,
        direction: &FourVector,
        max_points: usize,
        tetrad: Option<&LocalTetrad>,
    ) -> Result<Polyline, CoreError>;
}

/// Straight lines in chart coordinates. These are geodesics only for flat metrics in
/// Cartesian coordinates, curved metrics just get the integration stopped at their
/// coordinate breakdown.
#[derive(Clone, Debug)]
pub struct StraightLine {
    metric: Arc<dyn Metric>,
    step: FloatType,
}

impl StraightLine {
    pub fn new(metric: Arc<dyn Metric>, step: FloatType) -> Self {
        assert2::assert!(step > 0.0);
        StraightLine { metric, step }
    }
}

impl GeodesicSolver for StraightLine {
    fn solve(
        &self,
        start: &SpacetimePoint,
        direction: &FourVector,
        max_points: usize,
        tetrad: Option<&LocalTetrad>,
    ) -> Result<Polyline, CoreError> {
        let points: Vec<_> = (0..max_points)
            .map(|i| start + direction * (i as FloatType * self.step))
            .take_while(|p| !self.metric.break_condition(p))
            .collect();
        if points.len() < 2 {
            return Err(CoreError::TooFewPoints(points.len()));
        }

        let tetrads = tetrad
            .map(|lt| {
                points
                    .iter()
                    .map(|p| {
                        LocalTetrad::new(
                            self.metric.clone(),
                            *p,
                            *lt.coord_basis(),
                            Representation::Coordinates,
                        )
                        .map(|moved| moved.with_proper_time(lt.proper_time()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Polyline {
            tangents: Some(vec![*direction; points.len()]),
            points,
            tetrads,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metric::{FrameType, Minkowski, Schwarzschild};
    use assert2::{assert, let_assert};

    #[test]
    fn evenly_spaced_points() {
        let solver = StraightLine::new(Arc::new(Minkowski), 0.5);
        let_assert!(
            Ok(line) = solver.solve(
                &SpacetimePoint::origin(),
                &FourVector::new(1.0, 1.0, 0.0, 0.0),
                5,
                None
            )
        );
        assert!(line.points.len() == 5);
        assert!(line.points[4] == SpacetimePoint::new(2.0, 2.0, 0.0, 0.0));
        assert!(line.tetrads.is_none());
        let_assert!(Some(tangents) = line.tangents);
        assert!(tangents.len() == 5);
    }

    #[test]
    fn stops_at_breakdown() {
        let solver = StraightLine::new(Arc::new(Schwarzschild::new(2.0)), 0.5);
        let start = SpacetimePoint::new(0.0, 3.0, 1.0, 0.0);
        let inward = FourVector::new(1.0, -1.0, 0.0, 0.0);
        let_assert!(Ok(line) = solver.solve(&start, &inward, 10, None));
        assert!(line.points.len() == 2);

        let_assert!(
            Err(CoreError::TooFewPoints(1)) =
                solver.solve(&SpacetimePoint::new(0.0, 2.2, 1.0, 0.0), &inward, 10, None)
        );
    }

    #[test]
    fn transports_tetrads() {
        let metric: Arc<dyn Metric> = Arc::new(Minkowski);
        let observer = LocalTetrad::natural(metric.clone(), SpacetimePoint::origin(), FrameType::Static)
            .unwrap();
        let solver = StraightLine::new(metric, 1.0);
        let_assert!(
            Ok(line) = solver.solve(
                &SpacetimePoint::origin(),
                &FourVector::new(1.0, 0.0, 1.0, 0.0),
                3,
                Some(&observer)
            )
        );
        let_assert!(Some(tetrads) = line.tetrads);
        assert!(tetrads.len() == 3);
        assert!(*tetrads[2].position() == SpacetimePoint::new(2.0, 0.0, 2.0, 0.0));
    }
}
